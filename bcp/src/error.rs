use crate::task::{CopyTask, Summary};

/// Error returned by a run that did not complete cleanly, preserving whatever was copied.
///
/// The Display implementation shows the full error chain; the summary is kept separately so
/// callers can decide how to print it.
#[derive(Debug, thiserror::Error)]
#[error("{source:#}")]
pub struct Error {
    #[source]
    pub source: anyhow::Error,
    pub summary: Summary,
}

impl Error {
    #[must_use]
    pub fn new(source: anyhow::Error, summary: Summary) -> Self {
        Error { source, summary }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no credentials provider available for profile '{profile}'")]
    NoCredentialsProvider { profile: String },
    #[error("failed resolving credentials for profile '{profile}'")]
    Credentials {
        profile: String,
        #[source]
        source: aws_credential_types::provider::error::CredentialsError,
    },
}

/// Fetching a listing page failed
#[derive(Debug, thiserror::Error)]
#[error("failed listing bucket '{bucket}'")]
pub struct ListingError {
    pub bucket: String,
    #[source]
    pub source: anyhow::Error,
}

impl ListingError {
    pub fn new(bucket: &str, source: anyhow::Error) -> Self {
        Self {
            bucket: bucket.to_string(),
            source,
        }
    }
}

/// Copying a single object failed
#[derive(Debug, thiserror::Error)]
#[error("failed copying '{source_reference}' to '{destination_bucket}/{destination_key}'")]
pub struct CopyError {
    pub source_reference: String,
    pub destination_bucket: String,
    pub destination_key: String,
    #[source]
    pub source: anyhow::Error,
}

impl CopyError {
    pub fn new(task: &CopyTask, source: anyhow::Error) -> Self {
        Self {
            source_reference: task.source_reference.clone(),
            destination_bucket: task.destination_bucket.clone(),
            destination_key: task.destination_key.clone(),
            source,
        }
    }
}
