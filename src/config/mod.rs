//! Application configuration.
//!
//! Aggregates configuration from all modules into a single Config struct
//! that can be loaded from YAML files or environment variables. Read once
//! at process start.

mod ingest;
mod sink;
mod source;
mod storage;

pub use ingest::IngestConfig;
pub use sink::{SinkConfig, SinkType, SqsConfig};
pub use source::{FilesystemSourceConfig, S3SourceConfig, SourceConfig, SourceType};
pub use storage::{DynamoConfig, StorageConfig, StorageType};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "ledger.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "LEDGER_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "LEDGER";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "LEDGER_LOG";

/// Deployment variable naming the record store table.
pub const TABLE_ENV_VAR: &str = "DYNAMODB_TABLE";
/// Deployment variable naming the notification queue URL.
pub const QUEUE_ENV_VAR: &str = "SQS_QUEUE";
/// Deployment variable naming the source bucket.
pub const BUCKET_ENV_VAR: &str = "S3_BUCKET";

use serde::Deserialize;

/// Errors raised while building configuration or the collaborators it names.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("{kind} backend '{backend}' requires the '{feature}' feature")]
    FeatureDisabled {
        kind: &'static str,
        backend: &'static str,
        feature: &'static str,
    },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Record store configuration.
    pub storage: StorageConfig,
    /// Notification sink configuration.
    pub sink: SinkConfig,
    /// Object source configuration.
    pub source: SourceConfig,
    /// Ingest pipeline configuration.
    pub ingest: IngestConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `ledger.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    /// 5. Deployment variables `DYNAMODB_TABLE`, `SQS_QUEUE`, `S3_BUCKET`
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("storage.dynamo.table", std::env::var(TABLE_ENV_VAR).ok())?
            .set_override_option("sink.sqs.queue_url", std::env::var(QUEUE_ENV_VAR).ok())?
            .set_override_option("source.bucket", std::env::var(BUCKET_ENV_VAR).ok())?
            .build()?;

        let config: Config = config.try_deserialize()?;
        Ok(config)
    }

    /// Create config for testing.
    pub fn for_test() -> Self {
        Self::default()
    }
}
