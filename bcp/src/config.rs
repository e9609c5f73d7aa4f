//! Run configuration shared read-only by every stage of the pipeline

pub const DEFAULT_WORKERS: usize = 20;

/// Where to copy from and to. Never mutated once a run has started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Profile used to resolve credentials for both listing and copying
    pub src_profile: String,
    pub src_bucket: String,
    pub dst_bucket: String,
    /// Default region of the client, used when the profile does not name one
    pub src_region: String,
    /// Informational only: copies are issued through the source-side client
    pub dst_region: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            src_profile: "default".to_string(),
            src_bucket: "srcBucket".to_string(),
            dst_bucket: "dstBucket".to_string(),
            src_region: "us-east-1".to_string(),
            dst_region: "us-east-1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Number of concurrent copy workers, fixed for the whole run
    pub workers: usize,
    /// Cancel the whole run on the first copy or listing error
    pub fail_early: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            fail_early: false,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("at least one worker is required".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.src_profile, "default");
        assert_eq!(config.src_bucket, "srcBucket");
        assert_eq!(config.dst_bucket, "dstBucket");
        assert_eq!(config.src_region, "us-east-1");
        assert_eq!(config.dst_region, "us-east-1");
        assert_eq!(Settings::default().workers, 20);
    }

    #[test]
    fn zero_workers_is_invalid() {
        let settings = Settings {
            workers: 0,
            fail_early: false,
        };
        assert!(settings.validate().is_err());
        assert!(Settings::default().validate().is_ok());
    }
}
