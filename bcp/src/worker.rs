use anyhow::anyhow;
use tracing::instrument;

use crate::context::RunContext;
use crate::task::{CopyTask, SizeReport};

/// A single copy worker. The id is only used in output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Worker {
    pub id: usize,
}

/// What a single worker did before it returned
#[derive(Debug, Default)]
pub struct WorkerOutcome {
    /// Objects copied and reported to the aggregator, including those copied before a failure
    pub copied: u64,
    /// Set when the worker stopped on an error instead of an exhausted queue or cancellation
    pub error: Option<anyhow::Error>,
}

impl Worker {
    /// Copy tasks until the task queue is closed and drained, reporting the size of every
    /// successful copy.
    ///
    /// A failed copy stops this worker only; the failed task is dropped. The count of objects
    /// already copied is returned either way.
    #[instrument(skip_all, fields(worker = self.id))]
    pub async fn run(
        self,
        ctx: RunContext,
        task_rx: async_channel::Receiver<CopyTask>,
        size_tx: async_channel::Sender<SizeReport>,
    ) -> WorkerOutcome {
        let mut copied = 0;
        let error = loop {
            let task = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => {
                    tracing::debug!("cancelled");
                    break None;
                }
                res = task_rx.recv() => match res {
                    Ok(task) => task,
                    Err(_) => {
                        tracing::debug!("task queue closed");
                        break None;
                    }
                },
            };
            tracing::debug!("copying {:?}", &task.source_reference);
            let res = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => {
                    tracing::debug!("cancelled while copying {:?}", &task.source_reference);
                    break None;
                }
                res = ctx.store.copy_object(&task) => res,
            };
            if let Err(error) = res {
                ctx.on_error();
                let error = anyhow::Error::new(error).context(format!("worker {} stopped", self.id));
                break Some(error);
            }
            ctx.reporter.println(format!(
                "worker {} -> copying: {} size of: {}",
                self.id,
                task.destination_key,
                common::format_size(task.size)
            ));
            // not raced against cancellation: the object is already copied and must be counted
            if size_tx.send(SizeReport { bytes: task.size }).await.is_err() {
                break Some(anyhow!(
                    "worker {} stopped: size report queue closed while workers were running",
                    self.id
                ));
            }
            copied += 1;
        };
        WorkerOutcome { copied, error }
    }
}

/// Outcome of the whole pool once every worker has returned
#[derive(Debug, Default)]
pub struct PoolOutcome {
    /// Sum of every worker's copies, failed workers included
    pub copied: u64,
    pub failures: Vec<anyhow::Error>,
}

/// Fixed-size set of workers sharing one task queue and one size-report queue.
#[derive(Debug)]
pub struct WorkerPool {
    join_set: tokio::task::JoinSet<WorkerOutcome>,
}

impl WorkerPool {
    /// Start `size` workers. The pool takes its own handles to both queues; the caller's
    /// handles are not kept alive by it.
    pub fn spawn(
        size: usize,
        ctx: &RunContext,
        task_rx: &async_channel::Receiver<CopyTask>,
        size_tx: &async_channel::Sender<SizeReport>,
    ) -> Self {
        let mut join_set = tokio::task::JoinSet::new();
        for id in 0..size {
            let worker = Worker { id };
            join_set.spawn(worker.run(ctx.clone(), task_rx.clone(), size_tx.clone()));
        }
        tracing::debug!("started {} workers", size);
        Self { join_set }
    }

    /// Wait until every worker has returned, successfully or not.
    pub async fn join(mut self) -> PoolOutcome {
        let mut outcome = PoolOutcome::default();
        while let Some(res) = self.join_set.join_next().await {
            match res {
                Ok(worker) => {
                    outcome.copied += worker.copied;
                    if let Some(error) = worker.error {
                        tracing::error!("{:#}", &error);
                        outcome.failures.push(error);
                    }
                }
                Err(error) => {
                    tracing::error!("worker task failed: {}", &error);
                    outcome.failures.push(error.into());
                }
            }
        }
        outcome
    }
}
