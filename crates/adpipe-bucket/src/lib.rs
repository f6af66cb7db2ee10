//! Abstractions over the object storage that holds each pipeline stage's datasets.

mod local;
mod memory;
mod s3;

use std::{env, fmt};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use local::LocalBucketStore;
pub use memory::MemoryBucketStore;
pub use s3::S3BucketStore;

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub force_path_style: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: "ad-campaign-optimizer".to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
        }
    }
}

impl S3Config {
    /// Reads `ADPIPE_*` variables, falling back to the defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bucket: env::var("ADPIPE_BUCKET").unwrap_or(defaults.bucket),
            region: env::var("ADPIPE_REGION").unwrap_or(defaults.region),
            endpoint: env::var("ADPIPE_S3_ENDPOINT").ok(),
            access_key_id: env::var("ADPIPE_ACCESS_KEY_ID").ok(),
            secret_access_key: env::var("ADPIPE_SECRET_ACCESS_KEY").ok(),
            force_path_style: env::var("ADPIPE_FORCE_PATH_STYLE")
                .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes"))
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Error)]
pub enum BucketError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("sdk error: {0}")]
    Sdk(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BucketError {
    fn from_sdk(err: impl fmt::Display) -> Self {
        Self::Sdk(err.to_string())
    }
}

/// A listed object: its key and when it was last written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

#[async_trait]
pub trait BucketStore: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), BucketError>;
    async fn get_object(&self, key: &str) -> Result<Bytes, BucketError>;
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, BucketError>;
}
