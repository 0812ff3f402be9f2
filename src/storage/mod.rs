//! Record store for customer aggregates.
//!
//! This module contains:
//! - `CustomerStore` trait: get / put (full overwrite) / scan-all by customer ID
//! - `StorageError` and the module `Result` alias
//! - `init_storage`: backend selection from configuration
//!
//! Implementations:
//! - `InMemoryCustomerStore`: process-local map, also the test double
//! - `DynamoCustomerStore` (feature: dynamo): one DynamoDB item per customer

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{ConfigError, StorageConfig, StorageType};
use crate::model::Customer;

#[cfg(feature = "dynamo")]
pub mod dynamo;
pub mod memory;

#[cfg(feature = "dynamo")]
pub use dynamo::DynamoCustomerStore;
pub use memory::InMemoryCustomerStore;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Customer ID is missing")]
    MissingId,

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Malformed stored item: {0}")]
    Malformed(String),
}

/// Shared key-value store holding one aggregate per customer ID.
///
/// Keys are case-sensitive. The store offers no transactions or version
/// tokens: callers that read-modify-write must serialize per key themselves
/// (see `reconcile::KeyLocks`).
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Fetch one customer, `None` when absent.
    async fn get(&self, id: &str) -> Result<Option<Customer>>;

    /// Replace the whole aggregate stored under `customer.id`.
    async fn put(&self, customer: &Customer) -> Result<()>;

    /// Read every stored customer. Not a consistent snapshot: writes landing
    /// during the scan may or may not be observed.
    async fn scan_all(&self) -> Result<Vec<Customer>>;
}

/// Initialize the record store based on configuration.
pub async fn init_storage(
    config: &StorageConfig,
) -> std::result::Result<Arc<dyn CustomerStore>, ConfigError> {
    match config.storage_type {
        StorageType::Memory => {
            info!("Storage: in-memory");
            Ok(Arc::new(InMemoryCustomerStore::new()))
        }
        #[cfg(feature = "dynamo")]
        StorageType::Dynamo => {
            if config.dynamo.table.is_empty() {
                return Err(ConfigError::Missing("storage.dynamo.table"));
            }
            info!(table = %config.dynamo.table, "Storage: dynamo");
            let store = DynamoCustomerStore::new(
                config.dynamo.table.clone(),
                config.dynamo.endpoint_url.as_deref(),
            )
            .await;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "dynamo"))]
        StorageType::Dynamo => {
            tracing::error!("DynamoDB storage requested but 'dynamo' feature is not enabled");
            Err(ConfigError::FeatureDisabled {
                kind: "storage",
                backend: "dynamo",
                feature: "dynamo",
            })
        }
    }
}
