use anyhow::anyhow;
use tracing::instrument;

use crate::context::RunContext;
use crate::error::ListingError;
use crate::storage::ListingPage;
use crate::task::CopyTask;

/// Turn every listed object into a copy task, following continuation tokens until the listing
/// is exhausted. Returns the number of tasks placed on the task queue.
///
/// Each send waits for a worker to make room, so the listing never runs ahead of the copies.
/// When no worker is left to receive, the lister stops early without an error: the workers'
/// own failures explain why.
/// The task queue is closed when `task_tx` is dropped on return, whether the listing completed,
/// failed or was cancelled; workers drain what was queued and stop.
#[instrument(skip_all, fields(bucket = %ctx.config.src_bucket))]
pub async fn run_lister(
    ctx: RunContext,
    first_page: ListingPage,
    task_tx: async_channel::Sender<CopyTask>,
) -> anyhow::Result<u64> {
    let bucket = ctx.config.src_bucket.as_str();
    let mut page = first_page;
    let mut enqueued = 0;
    loop {
        tracing::debug!("enqueueing {} entries", page.entries.len());
        for entry in page.entries {
            let task = CopyTask::new(&ctx.config, entry);
            tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => {
                    tracing::debug!("cancelled after enqueueing {} tasks", enqueued);
                    return Ok(enqueued);
                }
                res = task_tx.send(task) => {
                    if res.is_err() {
                        // every worker stopped on its own error, the pool reports those
                        tracing::warn!(
                            "no workers left to accept copy tasks, stopping after {} tasks",
                            enqueued
                        );
                        return Ok(enqueued);
                    }
                }
            }
            enqueued += 1;
        }
        if !page.is_truncated {
            break;
        }
        let token = page.next_continuation_token.ok_or_else(|| {
            ListingError::new(
                bucket,
                anyhow!("page is truncated but carries no continuation token"),
            )
        })?;
        tracing::info!("listing truncated, fetching the next page");
        page = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                tracing::debug!("cancelled while fetching the next page");
                return Ok(enqueued);
            }
            res = ctx.store.list_page(bucket, Some(&token)) => res?,
        };
    }
    tracing::debug!("listing exhausted, {} tasks enqueued", enqueued);
    Ok(enqueued)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::{RunConfig, Settings};
    use crate::context::handoff;
    use crate::memory::MemoryStore;
    use crate::storage::{ListingEntry, ObjectStore};

    fn context(store: Arc<MemoryStore>) -> RunContext {
        RunContext::new(
            RunConfig {
                src_bucket: "src".to_string(),
                dst_bucket: "dst".to_string(),
                ..Default::default()
            },
            Settings::default(),
            store,
            common::Reporter::hidden(),
            tokio_util::sync::CancellationToken::new(),
        )
    }

    async fn collect(rx: async_channel::Receiver<CopyTask>) -> Vec<CopyTask> {
        let mut tasks = vec![];
        while let Ok(task) = rx.recv().await {
            tasks.push(task);
        }
        tasks
    }

    #[tokio::test]
    async fn enqueues_every_object_across_pages() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new(3));
        for i in 0..10 {
            store.put_object("src", &format!("key-{i:02}"), i);
        }
        let ctx = context(store.clone());
        let first_page = store.list_page("src", None).await?;
        let (tx, rx) = handoff();
        let consumer = tokio::spawn(collect(rx));
        let enqueued = run_lister(ctx, first_page, tx).await?;
        let tasks = consumer.await?;
        assert_eq!(enqueued, 10);
        let keys: Vec<_> = tasks.iter().map(|t| t.destination_key.clone()).collect();
        let expected: Vec<_> = (0..10).map(|i| format!("key-{i:02}")).collect();
        assert_eq!(keys, expected);
        assert_eq!(store.list_calls(), 4);
        assert!(tasks.iter().all(|t| t.destination_bucket == "dst"));
        Ok(())
    }

    #[tokio::test]
    async fn empty_first_page_closes_queue() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new(3));
        let (tx, rx) = handoff();
        let enqueued = run_lister(context(store), ListingPage::default(), tx).await?;
        assert_eq!(enqueued, 0);
        assert!(rx.recv().await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn listing_failure_closes_queue() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new(2));
        for key in ["a", "b", "c", "d", "e"] {
            store.put_object("src", key, 1);
        }
        store.fail_listing_from_page(2);
        let first_page = store.list_page("src", None).await?;
        let (tx, rx) = handoff();
        let consumer = tokio::spawn(collect(rx));
        let res = run_lister(context(store), first_page, tx).await;
        let err = res.expect_err("listing should fail on the third page");
        assert!(err.downcast_ref::<ListingError>().is_some());
        // the consumer only finishes because the queue was closed
        let tasks = consumer.await?;
        assert_eq!(tasks.len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn truncated_page_without_token_is_an_error() {
        let store = Arc::new(MemoryStore::new(2));
        let page = ListingPage {
            entries: vec![ListingEntry {
                key: "a".to_string(),
                size: 1,
            }],
            is_truncated: true,
            next_continuation_token: None,
        };
        let (tx, rx) = handoff();
        let consumer = tokio::spawn(collect(rx));
        assert!(run_lister(context(store), page, tx).await.is_err());
        assert_eq!(consumer.await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stops_when_no_consumers_are_left() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new(10));
        let page = ListingPage {
            entries: (0..5)
                .map(|i| ListingEntry {
                    key: format!("{i}"),
                    size: 1,
                })
                .collect(),
            ..Default::default()
        };
        let (tx, rx) = handoff();
        drop(rx);
        let enqueued = run_lister(context(store.clone()), page, tx).await?;
        assert_eq!(enqueued, 0);
        assert_eq!(store.list_calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn cancellation_stops_enqueueing() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new(10));
        let page = ListingPage {
            entries: (0..5)
                .map(|i| ListingEntry {
                    key: format!("{i}"),
                    size: 1,
                })
                .collect(),
            ..Default::default()
        };
        let ctx = context(store);
        ctx.cancel.cancel();
        // nobody receives: without cancellation this would block forever
        let (tx, _rx) = handoff();
        let enqueued = run_lister(ctx, page, tx).await?;
        assert_eq!(enqueued, 0);
        Ok(())
    }
}
