//! Notification sink for downstream consumers and error reports.
//!
//! The sink is fire-and-forget: no ordering or delivery guarantee is
//! assumed, and a failed publish never stops the caller from publishing
//! the next payload.
//!
//! Implementations:
//! - `LogSink`: payloads become log lines (standalone default)
//! - `InMemorySink`: records payloads for assertions
//! - `SqsSink` (feature: sqs): AWS SQS `SendMessage`

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ConfigError, SinkConfig, SinkType};

pub mod memory;
#[cfg(feature = "sqs")]
pub mod sqs;

pub use memory::InMemorySink;
#[cfg(feature = "sqs")]
pub use sqs::SqsSink;

/// Result type for sink operations.
pub type Result<T> = std::result::Result<T, SinkError>;

/// Errors that can occur while publishing.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Accepts text or JSON payloads for downstream consumption.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, payload: String) -> Result<()>;
}

/// Sink that writes every payload to the log.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn publish(&self, payload: String) -> Result<()> {
        info!(target: "ledger_ingest::notification", %payload, "Published notification");
        Ok(())
    }
}

/// Category of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    FetchFailed,
    UnrecognizedInput,
}

/// Error report published to the sink when a whole file cannot be processed.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub bucket: String,
    pub key: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        bucket: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            bucket: bucket.into(),
            key: key.into(),
            message: message.into(),
            at: Utc::now(),
        }
    }

    /// Publish to `sink`, logging rather than returning a failure.
    ///
    /// Returns whether the publish went through.
    pub async fn report(&self, sink: &dyn NotificationSink) -> bool {
        let payload = match serde_json::to_string(self) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to serialize diagnostic");
                return false;
            }
        };
        match sink.publish(payload).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to publish diagnostic");
                false
            }
        }
    }
}

/// Initialize the notification sink based on configuration.
pub async fn init_sink(
    config: &SinkConfig,
) -> std::result::Result<Arc<dyn NotificationSink>, ConfigError> {
    match config.sink_type {
        SinkType::Log => {
            info!("Sink: log");
            Ok(Arc::new(LogSink))
        }
        #[cfg(feature = "sqs")]
        SinkType::Sqs => {
            if config.sqs.queue_url.is_empty() {
                return Err(ConfigError::Missing("sink.sqs.queue_url"));
            }
            info!(queue_url = %config.sqs.queue_url, "Sink: sqs");
            let sink = SqsSink::new(
                config.sqs.queue_url.clone(),
                config.sqs.endpoint_url.as_deref(),
            )
            .await;
            Ok(Arc::new(sink))
        }
        #[cfg(not(feature = "sqs"))]
        SinkType::Sqs => {
            tracing::error!("SQS sink requested but 'sqs' feature is not enabled");
            Err(ConfigError::FeatureDisabled {
                kind: "sink",
                backend: "sqs",
                feature: "sqs",
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_diagnostic_payload_shape() {
        let sink = InMemorySink::new();
        let diagnostic = Diagnostic::new(
            DiagnosticKind::UnrecognizedInput,
            "drops",
            "readme.txt",
            "Unrecognized input file",
        );

        assert!(diagnostic.report(&sink).await);

        let published = sink.published().await;
        assert_eq!(published.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&published[0]).unwrap();
        assert_eq!(value["kind"], "unrecognized_input");
        assert_eq!(value["bucket"], "drops");
        assert_eq!(value["key"], "readme.txt");
        assert!(value["at"].is_string());
    }

    #[tokio::test]
    async fn test_diagnostic_report_swallows_publish_failure() {
        let sink = InMemorySink::new();
        sink.set_fail_on_publish(true).await;
        let diagnostic = Diagnostic::new(DiagnosticKind::FetchFailed, "b", "k", "boom");

        assert!(!diagnostic.report(&sink).await);
        assert_eq!(sink.published_count().await, 0);
    }

    #[tokio::test]
    async fn test_log_sink_accepts_everything() {
        assert!(LogSink.publish("anything".to_string()).await.is_ok());
    }
}
