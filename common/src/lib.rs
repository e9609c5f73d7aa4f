//! Shared plumbing for the `bcp` bucket copy tool
//!
//! Provides the process bootstrap used by the binary: logging setup, tokio runtime
//! construction, progress rendering and final summary/error reporting.
//!
//! # Logging
//!
//! Logs are written to stdout through `tracing-subscriber`. The level is controlled by the
//! `-v` flags (`-v` INFO, `-vv` DEBUG, `-vvv` TRACE, default ERROR) and can be refined with
//! `RUST_LOG`. Quiet mode turns logging off entirely.
//!
//! # Progress
//!
//! Progress is written to stderr so that logs and per-object lines can be piped while the
//! progress line stays visible. See [`progress::Reporter`].

pub mod config;
pub mod progress;
pub mod size;

pub use config::{OutputConfig, RuntimeConfig};
pub use progress::{ProgressSettings, ProgressType, Reporter};
pub use size::format_size;

fn init_tracing(output: &OutputConfig) {
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(output.level().into())
        .from_env_lossy();
    // a subscriber may already be installed (e.g. by tests), keep the existing one
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn build_runtime(runtime: &RuntimeConfig) -> std::io::Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if runtime.max_workers > 0 {
        builder.worker_threads(runtime.max_workers);
    }
    if runtime.max_blocking_threads > 0 {
        builder.max_blocking_threads(runtime.max_blocking_threads);
    }
    builder.build()
}

/// Run `func` to completion on a freshly built runtime.
///
/// Returns `None` if anything failed; the error has already been reported through the
/// logger at that point and the caller is expected to exit with a non-zero status.
pub fn run<Summary, Fut>(
    progress: Option<ProgressSettings>,
    output: OutputConfig,
    runtime: RuntimeConfig,
    func: impl FnOnce(Reporter) -> Fut,
) -> Option<Summary>
where
    Summary: std::fmt::Display,
    Fut: std::future::Future<Output = anyhow::Result<Summary>>,
{
    init_tracing(&output);
    let reporter = match Reporter::new(progress.as_ref(), output.quiet) {
        Ok(reporter) => reporter,
        Err(error) => {
            tracing::error!("{:#}", &error);
            return None;
        }
    };
    let runtime = match build_runtime(&runtime) {
        Ok(runtime) => runtime,
        Err(error) => {
            tracing::error!("failed to start the async runtime: {:#}", &error);
            return None;
        }
    };
    let res = runtime.block_on(func(reporter.clone()));
    reporter.finish();
    match res {
        Ok(summary) => {
            if output.print_summary || output.verbose > 0 {
                println!("{summary}");
            }
            Some(summary)
        }
        Err(error) => {
            tracing::error!("{:#}", &error);
            None
        }
    }
}
