//! Units of work passed between the pipeline stages

use crate::config::RunConfig;
use crate::storage::ListingEntry;

/// Copy one object from the source bucket to the destination bucket.
///
/// Created by the lister from a single listing entry and consumed by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTask {
    pub destination_bucket: String,
    /// `<source bucket>/<source key>`
    pub source_reference: String,
    pub destination_key: String,
    /// Size recorded in the listing, reported once the copy succeeds
    pub size: u64,
}

impl CopyTask {
    /// Task copying `entry` under the same key into the destination bucket
    pub fn new(config: &RunConfig, entry: ListingEntry) -> Self {
        Self {
            destination_bucket: config.dst_bucket.clone(),
            source_reference: format!("{}/{}", config.src_bucket, entry.key),
            destination_key: entry.key,
            size: entry.size,
        }
    }

    /// Split the source reference into bucket and key.
    ///
    /// Bucket names cannot contain '/', so the first separator delimits the two.
    pub fn source_parts(&self) -> Option<(&str, &str)> {
        self.source_reference.split_once('/')
    }
}

/// Bytes transferred by one successful copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeReport {
    pub bytes: u64,
}

/// Running totals, owned and mutated by the aggregator only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total_bytes: u64,
    pub item_count: u64,
}

impl RunStats {
    pub fn record(&mut self, report: SizeReport) {
        self.total_bytes += report.bytes;
        self.item_count += 1;
    }

    pub fn progress_line(&self) -> String {
        format!(
            "currently {} copied -> items {}",
            common::format_size(self.total_bytes),
            self.item_count
        )
    }
}

/// Outcome of a whole run, printed at the end whether or not the run succeeded
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub stats: RunStats,
    /// Objects the lister placed on the task queue. When every worker stops on an error, the
    /// last of them may still be sitting in the queue's single slot, uncopied.
    pub objects_listed: u64,
    /// Workers that stopped because a copy failed
    pub failed_workers: usize,
    pub elapsed: std::time::Duration,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "total copied: {}\n\
            items copied: {}\n\
            objects listed: {}\n\
            failed workers: {}\n\
            the whole process took: {:.2} minutes",
            common::format_size(self.stats.total_bytes),
            self.stats.item_count,
            self.objects_listed,
            self.failed_workers,
            self.elapsed.as_secs_f64() / 60.0,
        )
    }
}
