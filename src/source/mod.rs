//! Object sources: where batch files are fetched from.
//!
//! ## Backends
//!
//! - `FilesystemSource` - Local directory standing in for a bucket
//! - `InMemorySource` - Fixed objects for tests
//! - `S3Source` (feature: s3) - Amazon S3

mod filesystem;
mod memory;
#[cfg(feature = "s3")]
mod s3;

pub use filesystem::FilesystemSource;
pub use memory::InMemorySource;
#[cfg(feature = "s3")]
pub use s3::S3Source;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, SourceConfig, SourceType};
use crate::event::ObjectRef;

/// Errors that can occur while fetching an object.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Failed to retrieve object: {0}")]
    RetrieveFailed(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for object source operations.
pub type Result<T> = std::result::Result<T, FetchError>;

/// Fetches the full contents of a named object.
#[async_trait]
pub trait ObjectSource: Send + Sync {
    async fn fetch(&self, object: &ObjectRef) -> Result<Vec<u8>>;
}

/// Initialize the object source based on configuration.
pub async fn init_source(
    config: &SourceConfig,
) -> std::result::Result<Arc<dyn ObjectSource>, ConfigError> {
    match config.source_type {
        SourceType::Filesystem => {
            info!(root = %config.filesystem.root, "Source: filesystem");
            Ok(Arc::new(FilesystemSource::new(&config.filesystem.root)))
        }
        #[cfg(feature = "s3")]
        SourceType::S3 => {
            info!(bucket = ?config.bucket, "Source: s3");
            let source = match config.s3.endpoint_url.as_deref() {
                Some(endpoint) => S3Source::with_endpoint(endpoint, config.s3.region.as_deref()).await,
                None => S3Source::new(config.s3.region.as_deref()).await,
            };
            Ok(Arc::new(source))
        }
        #[cfg(not(feature = "s3"))]
        SourceType::S3 => {
            tracing::error!("S3 source requested but 's3' feature is not enabled");
            Err(ConfigError::FeatureDisabled {
                kind: "source",
                backend: "s3",
                feature: "s3",
            })
        }
    }
}
