use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;

/// How progress is rendered on stderr
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ProgressType {
    /// Pick `ProgressBar` when stderr is a terminal, `TextUpdates` otherwise
    #[default]
    #[value(alias = "Auto")]
    Auto,
    /// A single line that is overwritten in place
    #[value(alias = "ProgressBar")]
    ProgressBar,
    /// Periodic plain lines, appropriate for logging
    #[value(alias = "TextUpdates")]
    TextUpdates,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressSettings {
    pub progress_type: ProgressType,
    /// Human readable delay between updates, e.g. "200ms" or "10s"
    pub progress_delay: Option<String>,
}

const BAR_DELAY: std::time::Duration = std::time::Duration::from_millis(200);
const TEXT_DELAY: std::time::Duration = std::time::Duration::from_secs(10);
const NEVER_PRINTED: u64 = u64::MAX;

#[derive(Debug)]
enum Mode {
    Hidden,
    Bar(indicatif::ProgressBar),
    Text {
        delay: std::time::Duration,
        start: std::time::Instant,
        last_print_ms: AtomicU64,
    },
}

#[derive(Debug)]
struct Inner {
    mode: Mode,
    quiet: bool,
}

/// Cloneable handle used by concurrent tasks to print per-item lines and a progress line.
///
/// Item lines go to stdout. The progress line goes to stderr and, in `ProgressBar` mode, is
/// redrawn in place; item lines are printed with the bar suspended so the two never interleave.
#[derive(Debug, Clone)]
pub struct Reporter {
    inner: Arc<Inner>,
}

impl Reporter {
    pub fn new(settings: Option<&ProgressSettings>, quiet: bool) -> anyhow::Result<Self> {
        let mode = match settings {
            Some(settings) if !quiet => make_mode(settings)?,
            _ => Mode::Hidden,
        };
        Ok(Self {
            inner: Arc::new(Inner { mode, quiet }),
        })
    }

    /// Reporter that prints nothing at all
    pub fn hidden() -> Self {
        Self {
            inner: Arc::new(Inner {
                mode: Mode::Hidden,
                quiet: true,
            }),
        }
    }

    pub fn println(&self, line: impl AsRef<str>) {
        if self.inner.quiet {
            return;
        }
        let line = line.as_ref();
        match &self.inner.mode {
            Mode::Bar(bar) => bar.suspend(|| println!("{line}")),
            _ => println!("{line}"),
        }
    }

    pub fn progress(&self, message: String) {
        match &self.inner.mode {
            Mode::Hidden => {}
            Mode::Bar(bar) => bar.set_message(message),
            Mode::Text {
                delay,
                start,
                last_print_ms,
            } => {
                let now_ms = start.elapsed().as_millis() as u64;
                let last = last_print_ms.load(Ordering::Relaxed);
                if last == NEVER_PRINTED
                    || now_ms.saturating_sub(last) >= delay.as_millis() as u64
                {
                    last_print_ms.store(now_ms, Ordering::Relaxed);
                    eprintln!("{message}");
                }
            }
        }
    }

    /// Stop redrawing, leaving the last progress line on screen
    pub fn finish(&self) {
        if let Mode::Bar(bar) = &self.inner.mode {
            bar.finish();
        }
    }
}

fn make_mode(settings: &ProgressSettings) -> anyhow::Result<Mode> {
    let progress_type = match settings.progress_type {
        ProgressType::Auto => {
            if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
                ProgressType::ProgressBar
            } else {
                ProgressType::TextUpdates
            }
        }
        other => other,
    };
    let delay = settings
        .progress_delay
        .as_deref()
        .map(humantime::parse_duration)
        .transpose()
        .with_context(|| format!("invalid progress delay {:?}", &settings.progress_delay))?;
    tracing::debug!("progress type: {:?}, delay: {:?}", progress_type, delay);
    match progress_type {
        ProgressType::TextUpdates => Ok(Mode::Text {
            delay: delay.unwrap_or(TEXT_DELAY),
            start: std::time::Instant::now(),
            last_print_ms: AtomicU64::new(NEVER_PRINTED),
        }),
        _ => {
            let bar = indicatif::ProgressBar::new_spinner();
            bar.set_style(
                indicatif::ProgressStyle::with_template("{spinner} {msg}")
                    .context("invalid progress bar template")?,
            );
            bar.enable_steady_tick(delay.unwrap_or(BAR_DELAY));
            Ok(Mode::Bar(bar))
        }
    }
}
