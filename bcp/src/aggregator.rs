use tracing::instrument;

use crate::task::{RunStats, SizeReport};

/// Accumulate size reports until the queue is closed and drained, updating the progress line
/// after every report. The returned totals are final only because nothing can send once the
/// queue is closed.
#[instrument(skip_all)]
pub async fn run_aggregator(
    size_rx: async_channel::Receiver<SizeReport>,
    reporter: common::Reporter,
) -> RunStats {
    let mut stats = RunStats::default();
    while let Ok(report) = size_rx.recv().await {
        stats.record(report);
        reporter.progress(stats.progress_line());
    }
    tracing::debug!(
        "size report queue closed: {} items, {} bytes",
        stats.item_count,
        stats.total_bytes
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::handoff;

    #[tokio::test]
    async fn sums_reports_until_closed() -> anyhow::Result<()> {
        let (tx, rx) = handoff();
        let aggregator = tokio::spawn(run_aggregator(rx, common::Reporter::hidden()));
        for bytes in [100, 200, 300] {
            tx.send(SizeReport { bytes }).await?;
        }
        tx.close();
        let stats = aggregator.await?;
        assert_eq!(
            stats,
            RunStats {
                total_bytes: 600,
                item_count: 3
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn drains_reports_sent_before_close() -> anyhow::Result<()> {
        let (tx, rx) = handoff();
        // fill the queue before the aggregator starts, then close it
        tx.send(SizeReport { bytes: 7 }).await?;
        tx.close();
        let stats = run_aggregator(rx, common::Reporter::hidden()).await;
        assert_eq!(stats.item_count, 1);
        assert_eq!(stats.total_bytes, 7);
        Ok(())
    }

    #[tokio::test]
    async fn no_reports_means_zero_totals() {
        let (tx, rx) = handoff::<SizeReport>();
        drop(tx);
        let stats = run_aggregator(rx, common::Reporter::hidden()).await;
        assert_eq!(stats, RunStats::default());
    }
}
