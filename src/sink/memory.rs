//! In-memory notification sink for testing.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{NotificationSink, Result, SinkError};

/// Records every published payload.
#[derive(Default)]
pub struct InMemorySink {
    published: RwLock<Vec<String>>,
    fail_on_publish: RwLock<bool>,
    fail_on_containing: RwLock<Option<String>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_publish(&self, fail: bool) {
        *self.fail_on_publish.write().await = fail;
    }

    /// Reject only payloads containing `needle`.
    pub async fn fail_on_containing(&self, needle: impl Into<String>) {
        *self.fail_on_containing.write().await = Some(needle.into());
    }

    pub async fn published_count(&self) -> usize {
        self.published.read().await.len()
    }

    pub async fn published(&self) -> Vec<String> {
        self.published.read().await.clone()
    }

    pub async fn take_published(&self) -> Vec<String> {
        std::mem::take(&mut *self.published.write().await)
    }
}

#[async_trait]
impl NotificationSink for InMemorySink {
    async fn publish(&self, payload: String) -> Result<()> {
        if *self.fail_on_publish.read().await {
            return Err(SinkError::Publish("Mock publish failure".to_string()));
        }
        if let Some(needle) = self.fail_on_containing.read().await.as_deref() {
            if payload.contains(needle) {
                return Err(SinkError::Publish(format!(
                    "Mock publish failure for payload containing '{}'",
                    needle
                )));
            }
        }
        self.published.write().await.push(payload);
        Ok(())
    }
}
