//! Amazon S3 object source.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use tracing::debug;

use super::{FetchError, ObjectSource, Result};
use crate::event::ObjectRef;

/// S3-based object source. Buckets come from each event record.
pub struct S3Source {
    client: Client,
}

impl S3Source {
    /// Create a new S3 source.
    ///
    /// Uses default credentials from the environment (AWS_ACCESS_KEY_ID,
    /// AWS_SECRET_ACCESS_KEY, or IAM role).
    pub async fn new(region: Option<&str>) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region.to_string()));
        }

        let config = config_loader.load().await;
        Self {
            client: Client::new(&config),
        }
    }

    /// Create with custom endpoint (for S3-compatible services like MinIO).
    pub async fn with_endpoint(endpoint: &str, region: Option<&str>) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region.to_string()));
        }

        let config = config_loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .endpoint_url(endpoint)
            .force_path_style(true) // Required for MinIO and most S3-compatible services
            .build();

        Self {
            client: Client::from_conf(s3_config),
        }
    }
}

#[async_trait]
impl ObjectSource for S3Source {
    async fn fetch(&self, object: &ObjectRef) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                if err_str.contains("NoSuchKey") || err_str.contains("404") {
                    FetchError::NotFound(object.to_string())
                } else {
                    FetchError::RetrieveFailed(format!("S3 download failed: {}", e))
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| FetchError::RetrieveFailed(format!("S3 body read failed: {}", e)))?
            .into_bytes()
            .to_vec();

        debug!(object = %object, size = bytes.len(), "Fetched object from S3");
        Ok(bytes)
    }
}
