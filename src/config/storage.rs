//! Record store configuration types.

use serde::Deserialize;

/// Storage type discriminator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// In-process map, lost on exit.
    #[default]
    Memory,
    /// AWS DynamoDB table keyed by customer ID.
    Dynamo,
}

/// Storage configuration (discriminated union).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage type discriminator.
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// DynamoDB-specific configuration.
    pub dynamo: DynamoConfig,
}

/// DynamoDB-specific configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DynamoConfig {
    /// Table holding one item per customer, hash key `ID`.
    pub table: String,
    /// Custom endpoint URL (for DynamoDB Local or LocalStack).
    pub endpoint_url: Option<String>,
}
