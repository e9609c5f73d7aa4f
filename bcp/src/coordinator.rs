use std::sync::Arc;

use anyhow::{Context, anyhow};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::aggregator::run_aggregator;
use crate::config::{RunConfig, Settings};
use crate::context::{RunContext, handoff};
use crate::error::Error;
use crate::lister::run_lister;
use crate::storage::ObjectStore;
use crate::task::Summary;
use crate::worker::WorkerPool;

/// Copy every object of `config.src_bucket` into `config.dst_bucket`.
///
/// Wiring and ordering:
/// 1. start the worker pool on the task and size-report queues,
/// 2. fetch the first listing page; a failure here aborts the run,
/// 3. start the aggregator, then the lister,
/// 4. wait for every worker to return,
/// 5. close the size-report queue and collect the totals.
///
/// Any listing or copy failure, or cancellation, is reported as an [`Error`] that still carries
/// the summary of what was copied.
#[instrument(skip(store, reporter, cancel))]
pub async fn copy_bucket(
    config: RunConfig,
    settings: Settings,
    store: Arc<dyn ObjectStore>,
    reporter: common::Reporter,
    cancel: CancellationToken,
) -> Result<Summary, Error> {
    let start_time = std::time::Instant::now();
    settings
        .validate()
        .map_err(|err| Error::new(anyhow!(err), Summary::default()))?;
    let ctx = RunContext::new(config, settings, store, reporter, cancel);
    let (task_tx, task_rx) = handoff();
    let (size_tx, size_rx) = handoff();
    let pool = WorkerPool::spawn(settings.workers, &ctx, &task_rx, &size_tx);
    drop(task_rx);
    let first_page = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => Err(None),
        res = ctx.store.list_page(&ctx.config.src_bucket, None) => res.map_err(Some),
    };
    let first_page = match first_page {
        Ok(page) => page,
        Err(error) => {
            // nothing was enqueued: closing the queue lets the idle workers exit
            drop(task_tx);
            pool.join().await;
            size_tx.close();
            let summary = Summary {
                elapsed: start_time.elapsed(),
                ..Default::default()
            };
            let error = match error {
                Some(error) => {
                    anyhow::Error::new(error).context("failed fetching the first listing page")
                }
                None => anyhow!("copy was cancelled"),
            };
            return Err(Error::new(error, summary));
        }
    };
    tracing::debug!(
        "first page: {} entries, truncated: {}",
        first_page.entries.len(),
        first_page.is_truncated
    );
    let aggregator = tokio::spawn(run_aggregator(size_rx, ctx.reporter.clone()));
    let lister = tokio::spawn({
        let ctx = ctx.clone();
        async move {
            let res = run_lister(ctx.clone(), first_page, task_tx).await;
            if let Err(error) = &res {
                tracing::error!("{:#}", error);
                ctx.on_error();
            }
            res
        }
    });
    let outcome = pool.join().await;
    // every worker has returned, nothing can send a size report anymore
    size_tx.close();
    let stats = aggregator.await.context("aggregator task failed");
    let listed = lister.await.context("lister task failed");
    let mut summary = Summary {
        failed_workers: outcome.failures.len(),
        elapsed: start_time.elapsed(),
        ..Default::default()
    };
    let stats = match stats {
        Ok(stats) => stats,
        Err(error) => return Err(Error::new(error, summary)),
    };
    summary.stats = stats;
    if stats.item_count != outcome.copied {
        tracing::warn!(
            "aggregator counted {} objects, workers reported {}",
            stats.item_count,
            outcome.copied
        );
    }
    let listing_error = match listed {
        Ok(Ok(enqueued)) => {
            summary.objects_listed = enqueued;
            None
        }
        Ok(Err(error)) | Err(error) => Some(error),
    };
    if let Some(error) = listing_error {
        return Err(Error::new(error.context("listing did not complete"), summary));
    }
    if !outcome.failures.is_empty() {
        return Err(Error::new(
            anyhow!(
                "{} of {} workers stopped on copy errors",
                outcome.failures.len(),
                settings.workers
            ),
            summary,
        ));
    }
    if ctx.cancel.is_cancelled() {
        return Err(Error::new(anyhow!("copy was cancelled"), summary));
    }
    Ok(summary)
}
