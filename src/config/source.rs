//! Object source configuration types.

use serde::Deserialize;

/// Source type discriminator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Local directory standing in for the bucket.
    #[default]
    Filesystem,
    /// AWS S3.
    S3,
}

/// Source configuration (discriminated union).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Source type discriminator.
    #[serde(rename = "type")]
    pub source_type: SourceType,
    /// Bucket the CSV drops land in. Informational for the dispatcher;
    /// event records carry their own bucket name.
    pub bucket: Option<String>,
    /// Filesystem-specific configuration.
    pub filesystem: FilesystemSourceConfig,
    /// S3-specific configuration.
    pub s3: S3SourceConfig,
}

/// Filesystem-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilesystemSourceConfig {
    /// Directory objects are resolved against.
    pub root: String,
}

impl Default for FilesystemSourceConfig {
    fn default() -> Self {
        Self {
            root: "./data".to_string(),
        }
    }
}

/// S3-specific configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct S3SourceConfig {
    /// Custom endpoint (MinIO, LocalStack). Enables path-style addressing.
    pub endpoint_url: Option<String>,
    /// AWS region override.
    pub region: Option<String>,
}
