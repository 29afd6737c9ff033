//! Configuration for the summary storage handlers

use std::env;

use crate::error::ConfigError;

/// Object key used when none is configured
pub const DEFAULT_FILE_KEY: &str = "summaries.txt";

/// Storage region used when none is configured
pub const DEFAULT_REGION: &str = "eu-north-1";

/// Where appended summaries are stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Bucket holding the summaries object
    pub bucket: String,
    /// Region of the bucket, for cloud-backed stores. The directory and
    /// in-memory stores ignore it.
    pub region: String,
    /// Key of the summaries object
    pub file_key: String,
}

impl StoreConfig {
    /// Create a config for a bucket with default region and key
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: DEFAULT_REGION.to_string(),
            file_key: DEFAULT_FILE_KEY.to_string(),
        }
    }

    /// Set the bucket region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the object key
    pub fn with_file_key(mut self, key: impl Into<String>) -> Self {
        self.file_key = key.into();
        self
    }

    /// Read `BUCKET_NAME`, `BUCKET_REGION` and `FILE_KEY` from the environment.
    ///
    /// Only `BUCKET_NAME` is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bucket = lookup("BUCKET_NAME")
            .filter(|b| !b.is_empty())
            .ok_or(ConfigError::MissingVar("BUCKET_NAME"))?;

        let mut config = Self::new(bucket);
        if let Some(region) = lookup("BUCKET_REGION").filter(|r| !r.is_empty()) {
            config = config.with_region(region);
        }
        if let Some(key) = lookup("FILE_KEY").filter(|k| !k.is_empty()) {
            config = config.with_file_key(key);
        }
        Ok(config)
    }
}
