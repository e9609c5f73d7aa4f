//! Object storage operations the pipeline depends on

use crate::error::{CopyError, ListingError};
use crate::task::CopyTask;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub key: String,
    pub size: u64,
}

/// One batch of a paginated bucket listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub entries: Vec<ListingEntry>,
    /// More pages follow this one
    pub is_truncated: bool,
    pub next_continuation_token: Option<String>,
}

/// Listing and server-side copy, safe to call concurrently from many tasks.
#[async_trait::async_trait]
pub trait ObjectStore: std::fmt::Debug + Send + Sync {
    /// Fetch one page of `bucket`, starting after `continuation_token` if given.
    async fn list_page(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> Result<ListingPage, ListingError>;

    /// Copy the object named by `task.source_reference` to the task's destination.
    async fn copy_object(&self, task: &CopyTask) -> Result<(), CopyError>;
}
