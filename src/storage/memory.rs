//! In-memory record store.
//!
//! Backs standalone runs and every test. Customers are kept in a `BTreeMap`
//! so `scan_all` yields them ordered by ID.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CustomerStore, Result, StorageError};
use crate::model::Customer;

/// In-memory customer store with failure injection.
#[derive(Default)]
pub struct InMemoryCustomerStore {
    customers: RwLock<BTreeMap<String, Customer>>,
    puts: RwLock<usize>,
    fail_on_get: RwLock<bool>,
    fail_on_put: RwLock<bool>,
    fail_on_scan: RwLock<bool>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_get(&self, fail: bool) {
        *self.fail_on_get.write().await = fail;
    }

    pub async fn set_fail_on_put(&self, fail: bool) {
        *self.fail_on_put.write().await = fail;
    }

    pub async fn set_fail_on_scan(&self, fail: bool) {
        *self.fail_on_scan.write().await = fail;
    }

    /// Number of successful `put` calls since creation.
    pub async fn put_count(&self) -> usize {
        *self.puts.read().await
    }

    pub async fn len(&self) -> usize {
        self.customers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.customers.read().await.is_empty()
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn get(&self, id: &str) -> Result<Option<Customer>> {
        if *self.fail_on_get.read().await {
            return Err(StorageError::Backend("Mock get failure".to_string()));
        }
        Ok(self.customers.read().await.get(id).cloned())
    }

    async fn put(&self, customer: &Customer) -> Result<()> {
        if customer.id.is_empty() {
            return Err(StorageError::MissingId);
        }
        if *self.fail_on_put.read().await {
            return Err(StorageError::Backend("Mock put failure".to_string()));
        }
        self.customers
            .write()
            .await
            .insert(customer.id.clone(), customer.clone());
        *self.puts.write().await += 1;
        Ok(())
    }

    async fn scan_all(&self) -> Result<Vec<Customer>> {
        if *self.fail_on_scan.read().await {
            return Err(StorageError::Backend("Mock scan failure".to_string()));
        }
        Ok(self.customers.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::model::Order;

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = InMemoryCustomerStore::new();
        assert!(store.get("C1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_whole_aggregate() {
        let store = InMemoryCustomerStore::new();
        let mut customer = Customer::new("C1", "Alice");
        customer.record_order(Order::new("O1", Decimal::ONE)).unwrap();
        store.put(&customer).await.unwrap();

        store.put(&Customer::new("C1", "Alicia")).await.unwrap();

        let stored = store.get("C1").await.unwrap().unwrap();
        assert_eq!(stored.name, "Alicia");
        assert!(stored.orders.is_empty());
        assert_eq!(store.put_count().await, 2);
    }

    #[tokio::test]
    async fn test_keys_are_case_sensitive() {
        let store = InMemoryCustomerStore::new();
        store.put(&Customer::new("c1", "lower")).await.unwrap();
        store.put(&Customer::new("C1", "upper")).await.unwrap();

        assert_eq!(store.len().await, 2);
        assert_eq!(store.get("c1").await.unwrap().unwrap().name, "lower");
    }

    #[tokio::test]
    async fn test_put_rejects_empty_id() {
        let store = InMemoryCustomerStore::new();
        let result = store.put(&Customer::new("", "Nobody")).await;
        assert!(matches!(result, Err(StorageError::MissingId)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_scan_all_is_ordered_by_id() {
        let store = InMemoryCustomerStore::new();
        for id in ["C3", "C1", "C2"] {
            store.put(&Customer::new(id, id)).await.unwrap();
        }

        let ids: Vec<String> = store
            .scan_all()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["C1", "C2", "C3"]);
    }

    #[tokio::test]
    async fn test_failure_toggles() {
        let store = InMemoryCustomerStore::new();
        store.set_fail_on_put(true).await;
        assert!(store.put(&Customer::new("C1", "Alice")).await.is_err());
        assert_eq!(store.put_count().await, 0);

        store.set_fail_on_get(true).await;
        assert!(store.get("C1").await.is_err());

        store.set_fail_on_scan(true).await;
        assert!(store.scan_all().await.is_err());
    }
}
