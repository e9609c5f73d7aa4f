//! In-process object store with the same paging behavior as a real bucket listing.
//!
//! Used to exercise the pipeline without network access. Failures can be injected per key for
//! copies and per page index for listings.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;
use parking_lot::Mutex;

use crate::error::{CopyError, ListingError};
use crate::storage::{ListingEntry, ListingPage, ObjectStore};
use crate::task::CopyTask;

#[derive(Debug, Default)]
struct State {
    buckets: HashMap<String, BTreeMap<String, u64>>,
    copies: HashMap<(String, String), usize>,
    failing_keys: HashSet<String>,
    fail_listing_from_page: Option<usize>,
}

#[derive(Debug)]
pub struct MemoryStore {
    page_size: usize,
    copy_delay: Option<std::time::Duration>,
    state: Mutex<State>,
    list_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryStore {
    /// Store returning at most `page_size` entries per listing page
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            copy_delay: None,
            state: Mutex::new(State::default()),
            list_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Make every copy take at least `delay`
    #[must_use]
    pub fn with_copy_delay(mut self, delay: std::time::Duration) -> Self {
        self.copy_delay = Some(delay);
        self
    }

    pub fn create_bucket(&self, bucket: &str) {
        self.state
            .lock()
            .buckets
            .entry(bucket.to_string())
            .or_default();
    }

    /// Add an object, creating the bucket if needed
    pub fn put_object(&self, bucket: &str, key: &str, size: u64) {
        self.state
            .lock()
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), size);
    }

    /// Copies of `key` will fail
    pub fn fail_copy(&self, key: &str) {
        self.state.lock().failing_keys.insert(key.to_string());
    }

    /// Requests for page `page` (0 = first page) and later will fail
    pub fn fail_listing_from_page(&self, page: usize) {
        self.state.lock().fail_listing_from_page = Some(page);
    }

    pub fn objects(&self, bucket: &str) -> Vec<(String, u64)> {
        self.state
            .lock()
            .buckets
            .get(bucket)
            .map(|objects| {
                objects
                    .iter()
                    .map(|(key, size)| (key.clone(), *size))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of times `key` was written into `bucket` by a copy
    pub fn copy_count(&self, bucket: &str, key: &str) -> usize {
        self.state
            .lock()
            .copies
            .get(&(bucket.to_string(), key.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Highest number of copies that were running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn page(&self, bucket: &str, offset: usize) -> Result<ListingPage, ListingError> {
        let state = self.state.lock();
        let page_index = offset / self.page_size;
        if state
            .fail_listing_from_page
            .is_some_and(|first_failing| page_index >= first_failing)
        {
            return Err(ListingError::new(
                bucket,
                anyhow!("injected listing failure on page {page_index}"),
            ));
        }
        let objects = state
            .buckets
            .get(bucket)
            .ok_or_else(|| ListingError::new(bucket, anyhow!("no such bucket")))?;
        let entries: Vec<ListingEntry> = objects
            .iter()
            .skip(offset)
            .take(self.page_size)
            .map(|(key, size)| ListingEntry {
                key: key.clone(),
                size: *size,
            })
            .collect();
        let next_offset = offset + entries.len();
        let is_truncated = next_offset < objects.len();
        Ok(ListingPage {
            entries,
            is_truncated,
            next_continuation_token: is_truncated.then(|| next_offset.to_string()),
        })
    }

    fn copy(&self, task: &CopyTask) -> Result<(), CopyError> {
        let mut state = self.state.lock();
        let (src_bucket, src_key) = task.source_parts().ok_or_else(|| {
            CopyError::new(task, anyhow!("malformed source reference"))
        })?;
        if state.failing_keys.contains(src_key) {
            return Err(CopyError::new(task, anyhow!("injected copy failure")));
        }
        let size = state
            .buckets
            .get(src_bucket)
            .and_then(|objects| objects.get(src_key))
            .copied()
            .ok_or_else(|| CopyError::new(task, anyhow!("no such key")))?;
        state
            .buckets
            .get_mut(&task.destination_bucket)
            .ok_or_else(|| CopyError::new(task, anyhow!("no such destination bucket")))?
            .insert(task.destination_key.clone(), size);
        *state
            .copies
            .entry((task.destination_bucket.clone(), task.destination_key.clone()))
            .or_default() += 1;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn list_page(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> Result<ListingPage, ListingError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let offset = match continuation_token {
            None => 0,
            Some(token) => token.parse::<usize>().map_err(|_| {
                ListingError::new(bucket, anyhow!("invalid continuation token {token:?}"))
            })?,
        };
        tokio::task::yield_now().await;
        self.page(bucket, offset)
    }

    async fn copy_object(&self, task: &CopyTask) -> Result<(), CopyError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        match self.copy_delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
        let res = self.copy(task);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        res
    }
}
