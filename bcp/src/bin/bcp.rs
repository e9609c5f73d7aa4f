use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::Parser;
use tracing::instrument;

use bcp_tools_bcp as bcp;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "bcp",
    version,
    about = "Copy all objects from one S3 bucket to another using a pool of concurrent workers",
    long_about = "`bcp` copies every object of a source bucket into a destination bucket under the same key.

Objects are copied server-side by a fixed number of concurrent workers while the source bucket is
being listed. A progress line shows the number of bytes and objects copied so far.

EXAMPLES:
    # Copy between two buckets of the default profile
    bcp --src-bucket photos --dst-bucket photos-backup

    # Use a named profile and more workers, stop on the first error
    bcp --src-profile prod --src-region eu-west-1 --src-bucket a --dst-bucket b --workers 64 --fail-early

    # Copy within an S3-compatible service
    bcp --endpoint-url http://localhost:9000 --force-path-style --src-bucket a --dst-bucket b"
)]
struct Args {
    // Source & destination
    /// Profile used to resolve credentials for both listing and copying
    #[arg(
        long,
        alias = "srcProfile",
        default_value = "default",
        value_name = "PROFILE",
        help_heading = "Source & destination"
    )]
    src_profile: String,

    /// Bucket to copy from
    #[arg(
        long,
        alias = "srcBucket",
        default_value = "srcBucket",
        value_name = "BUCKET",
        help_heading = "Source & destination"
    )]
    src_bucket: String,

    /// Bucket to copy into
    #[arg(
        long,
        alias = "dstBucket",
        default_value = "dstBucket",
        value_name = "BUCKET",
        help_heading = "Source & destination"
    )]
    dst_bucket: String,

    /// Region used when the profile does not configure one
    #[arg(
        long,
        alias = "srcRegion",
        default_value = "us-east-1",
        value_name = "REGION",
        help_heading = "Source & destination"
    )]
    src_region: String,

    /// Region of the destination bucket
    ///
    /// Informational: copies are issued through the client of the source profile and region.
    #[arg(
        long,
        alias = "dstRegion",
        default_value = "us-east-1",
        value_name = "REGION",
        help_heading = "Source & destination"
    )]
    dst_region: String,

    /// Custom endpoint for S3-compatible services
    #[arg(long, value_name = "URL", help_heading = "Source & destination")]
    endpoint_url: Option<String>,

    /// Use path-style addressing (bucket in the path instead of the host name)
    #[arg(long, help_heading = "Source & destination")]
    force_path_style: bool,

    // Copy options
    /// Number of concurrent copy workers
    #[arg(
        long,
        default_value_t = bcp::config::DEFAULT_WORKERS,
        value_name = "N",
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..),
        help_heading = "Copy options"
    )]
    workers: usize,

    /// Stop all workers on the first copy or listing error
    #[arg(short = 'e', long = "fail-early", help_heading = "Copy options")]
    fail_early: bool,

    // Progress & output
    /// Disable the progress line
    #[arg(long, conflicts_with_all = ["progress_type", "progress_delay"], help_heading = "Progress & output")]
    no_progress: bool,

    /// Set the type of progress display
    ///
    /// Options are: `ProgressBar` (a line overwritten in place), `TextUpdates` (periodic lines, appropriate
    /// for logging), Auto (default, picks one depending on whether stderr is a terminal)
    #[arg(long, value_name = "TYPE", help_heading = "Progress & output")]
    progress_type: Option<common::ProgressType>,

    /// Set delay between progress updates
    ///
    /// Default is 200ms for `ProgressBar` and 10s for `TextUpdates`. Accepts human-readable durations like
    /// "200ms", "10s", "5min".
    #[arg(long, value_name = "DELAY", help_heading = "Progress & output")]
    progress_delay: Option<String>,

    /// Verbose level: -v INFO / -vv DEBUG / -vvv TRACE (default: ERROR)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Progress & output")]
    verbose: u8,

    /// Quiet mode, don't print per-object lines, progress, summary or errors
    #[arg(short = 'q', long = "quiet", help_heading = "Progress & output")]
    quiet: bool,

    // Advanced settings
    /// Number of runtime worker threads (0 = number of CPU cores)
    #[arg(
        long,
        default_value = "0",
        value_name = "N",
        help_heading = "Advanced settings"
    )]
    max_workers: usize,
}

#[instrument(skip(reporter))]
async fn async_main(args: Args, reporter: common::Reporter) -> anyhow::Result<bcp::Summary> {
    let config = bcp::RunConfig {
        src_profile: args.src_profile,
        src_bucket: args.src_bucket,
        dst_bucket: args.dst_bucket,
        src_region: args.src_region,
        dst_region: args.dst_region,
    };
    tracing::info!("run config: {:?}", &config);
    if config.dst_region != config.src_region {
        tracing::warn!(
            "destination region {} differs from source region {}, copies are issued through the source region",
            config.dst_region,
            config.src_region
        );
    }
    let settings = bcp::Settings {
        workers: args.workers,
        fail_early: args.fail_early,
    };
    let sdk_config = bcp::s3::resolve_config(&config.src_profile, &config.src_region)
        .await
        .context("error while initializing config")?;
    let endpoint = bcp::s3::EndpointOptions {
        endpoint_url: args.endpoint_url,
        force_path_style: args.force_path_style,
    };
    let store = Arc::new(bcp::s3::S3Store::new(&sdk_config, &endpoint));
    let cancel = tokio_util::sync::CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, stopping workers");
                cancel.cancel();
            }
        }
    });
    match bcp::copy_bucket(config, settings, store, reporter, cancel).await {
        Ok(summary) => Ok(summary),
        Err(error) => Err(anyhow!("{}\n\n{}", error, &error.summary)),
    }
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    let func = {
        let args = args.clone();
        |reporter| async_main(args, reporter)
    };
    let output = common::OutputConfig {
        quiet: args.quiet,
        verbose: args.verbose,
        print_summary: !args.quiet,
    };
    let runtime = common::RuntimeConfig {
        max_workers: args.max_workers,
        max_blocking_threads: 0,
    };
    let progress = if args.no_progress {
        None
    } else {
        Some(common::ProgressSettings {
            progress_type: args.progress_type.unwrap_or_default(),
            progress_delay: args.progress_delay,
        })
    };
    let res = common::run(progress, output, runtime, func);
    if res.is_none() {
        std::process::exit(1);
    }
    Ok(())
}
