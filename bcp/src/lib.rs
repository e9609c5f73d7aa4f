//! Bucket copy tool - `bcp`
//!
//! Copies every object of one S3 bucket into another bucket, keeping the keys, using
//! server-side copies issued by a fixed pool of concurrent workers.
//!
//! ```bash
//! # copy with the default 20 workers
//! bcp --src-bucket photos --dst-bucket photos-backup
//!
//! # use a named profile and region, 64 workers, stop on the first error
//! bcp --src-profile prod --src-region eu-west-1 --src-bucket a --dst-bucket b --workers 64 -e
//! ```
//!
//! # Architecture
//!
//! ```text
//! lister ──(task queue)──> worker pool (N) ──(size-report queue)──> aggregator
//! ```
//!
//! - The **lister** pages through the source bucket and turns each object into a
//!   [`CopyTask`]. It closes the task queue when it returns.
//! - Each **worker** takes one task at a time, performs the copy and reports the object size.
//! - The **aggregator** keeps the running totals and draws the progress line.
//! - [`copy_bucket`] wires the stages together, waits for the workers, closes the size-report
//!   queue and returns the final [`Summary`].
//!
//! Both queues hold a single item, so the lister can never run far ahead of the copies and the
//! workers never run far ahead of the aggregator. The stages share no mutable state: the
//! totals live inside the aggregator task and everything else is read-only.
//!
//! # Error Handling
//!
//! - A failed copy stops the worker that ran it; the remaining workers keep draining the queue.
//! - A listing failure stops the lister and closes the task queue, so the workers finish what
//!   was already listed.
//! - `--fail-early` cancels the whole run on the first failure.
//!
//! In every failure case the run still returns the summary of what was copied and the process
//! exits with a non-zero status.
//!
//! # Storage
//!
//! The pipeline talks to storage through [`storage::ObjectStore`]. [`s3::S3Store`] is the real
//! backend; [`memory::MemoryStore`] keeps everything in process and is used by the tests.

pub mod aggregator;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod lister;
pub mod memory;
pub mod s3;
pub mod storage;
pub mod task;
pub mod worker;

pub use config::{RunConfig, Settings};
pub use coordinator::copy_bucket;
pub use error::Error;
pub use task::{CopyTask, RunStats, SizeReport, Summary};
