//! Amazon S3 (and S3-compatible) backend

use anyhow::anyhow;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::instrument;

use crate::error::{ConfigError, CopyError, ListingError};
use crate::storage::{ListingEntry, ListingPage, ObjectStore};
use crate::task::CopyTask;

/// Characters left as-is in the key part of the copy source header
const COPY_SOURCE_KEY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Overrides for S3-compatible services
#[derive(Debug, Clone, Default)]
pub struct EndpointOptions {
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
}

/// Load the shared configuration of `profile`, falling back to `region` when the profile does
/// not set one, and make sure credentials actually resolve.
#[instrument]
pub async fn resolve_config(
    profile: &str,
    region: &str,
) -> Result<aws_config::SdkConfig, ConfigError> {
    let mut sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .profile_name(profile)
        .load()
        .await;
    if sdk_config.region().is_none() {
        tracing::debug!("profile has no region, using {}", region);
        sdk_config = sdk_config
            .into_builder()
            .region(aws_config::Region::new(region.to_string()))
            .build();
    }
    let provider =
        sdk_config
            .credentials_provider()
            .ok_or_else(|| ConfigError::NoCredentialsProvider {
                profile: profile.to_string(),
            })?;
    provider
        .provide_credentials()
        .await
        .map_err(|source| ConfigError::Credentials {
            profile: profile.to_string(),
            source,
        })?;
    tracing::info!(
        "resolved config for profile '{}' in region {:?}",
        profile,
        sdk_config.region()
    );
    Ok(sdk_config)
}

/// Percent-encode the key of a `<bucket>/<key>` source reference
pub fn encode_copy_source(source_reference: &str) -> String {
    match source_reference.split_once('/') {
        Some((bucket, key)) => format!("{}/{}", bucket, utf8_percent_encode(key, COPY_SOURCE_KEY)),
        None => source_reference.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    pub fn new(sdk_config: &aws_config::SdkConfig, endpoint: &EndpointOptions) -> Self {
        let mut builder = aws_sdk_s3::config::Builder::from(sdk_config);
        if let Some(endpoint_url) = &endpoint.endpoint_url {
            builder = builder.endpoint_url(endpoint_url);
        }
        if endpoint.force_path_style {
            builder = builder.force_path_style(true);
        }
        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3Store {
    #[instrument(skip(self))]
    async fn list_page(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> Result<ListingPage, ListingError> {
        let mut request = self.client.list_objects_v2().bucket(bucket);
        if let Some(token) = continuation_token {
            request = request.continuation_token(token);
        }
        let output = request
            .send()
            .await
            .map_err(|err| ListingError::new(bucket, aws_sdk_s3::Error::from(err).into()))?;
        let entries = output
            .contents()
            .iter()
            .filter_map(|object| {
                let Some(key) = object.key() else {
                    tracing::warn!("skipping listing entry without a key");
                    return None;
                };
                Some(ListingEntry {
                    key: key.to_string(),
                    size: object
                        .size()
                        .map_or(0, |size| u64::try_from(size).unwrap_or(0)),
                })
            })
            .collect();
        Ok(ListingPage {
            entries,
            is_truncated: output.is_truncated().unwrap_or(false),
            next_continuation_token: output.next_continuation_token().map(str::to_string),
        })
    }

    #[instrument(skip(self), fields(key = %task.destination_key))]
    async fn copy_object(&self, task: &CopyTask) -> Result<(), CopyError> {
        if task.source_parts().is_none() {
            return Err(CopyError::new(task, anyhow!("malformed source reference")));
        }
        self.client
            .copy_object()
            .bucket(&task.destination_bucket)
            .key(&task.destination_key)
            .copy_source(encode_copy_source(&task.source_reference))
            .send()
            .await
            .map_err(|err| CopyError::new(task, aws_sdk_s3::Error::from(err).into()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_source_keeps_plain_keys() {
        assert_eq!(
            encode_copy_source("photos/2024/01/cat-1_a.jpg"),
            "photos/2024/01/cat-1_a.jpg"
        );
    }

    #[test]
    fn copy_source_encodes_special_characters() {
        assert_eq!(
            encode_copy_source("photos/my file+1.txt"),
            "photos/my%20file%2B1.txt"
        );
        assert_eq!(encode_copy_source("b/zaż"), "b/za%C5%BC");
    }

    #[test]
    fn copy_source_without_key_is_untouched() {
        assert_eq!(encode_copy_source("bucket"), "bucket");
    }
}
