//! In-memory object source for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{FetchError, ObjectSource, Result};
use crate::event::ObjectRef;

/// Serves objects from a map; unknown keys are `NotFound`.
#[derive(Default)]
pub struct InMemorySource {
    objects: RwLock<HashMap<ObjectRef, Vec<u8>>>,
    fetches: RwLock<usize>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, object: ObjectRef, bytes: impl Into<Vec<u8>>) {
        self.objects.write().await.insert(object, bytes.into());
    }

    pub async fn fetch_count(&self) -> usize {
        *self.fetches.read().await
    }
}

#[async_trait]
impl ObjectSource for InMemorySource {
    async fn fetch(&self, object: &ObjectRef) -> Result<Vec<u8>> {
        *self.fetches.write().await += 1;
        self.objects
            .read()
            .await
            .get(object)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(object.to_string()))
    }
}
