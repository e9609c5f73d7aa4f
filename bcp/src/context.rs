use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{RunConfig, Settings};
use crate::storage::ObjectStore;

/// Capacity of the task and size-report queues.
///
/// async-channel has no zero-capacity (rendezvous) mode, one slot is the closest handoff: a
/// sender can run at most one item ahead of its consumers.
pub const HANDOFF_CAPACITY: usize = 1;

pub fn handoff<T>() -> (async_channel::Sender<T>, async_channel::Receiver<T>) {
    async_channel::bounded(HANDOFF_CAPACITY)
}

/// Everything the lister and the workers share for the duration of a run.
///
/// Cheap to clone; nothing in here is mutated after construction except the cancellation
/// token, which is only ever triggered.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: Arc<RunConfig>,
    pub settings: Settings,
    pub store: Arc<dyn ObjectStore>,
    pub reporter: common::Reporter,
    pub cancel: CancellationToken,
}

impl RunContext {
    pub fn new(
        config: RunConfig,
        settings: Settings,
        store: Arc<dyn ObjectStore>,
        reporter: common::Reporter,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config: Arc::new(config),
            settings,
            store,
            reporter,
            cancel,
        }
    }

    /// Stop the whole run if configured to do so on the first error
    pub fn on_error(&self) {
        if self.settings.fail_early {
            tracing::debug!("fail-early: cancelling the run");
            self.cancel.cancel();
        }
    }
}
