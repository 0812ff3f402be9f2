//! AWS SQS notification sink.
//!
//! Each payload becomes one message body on a standard queue. No message
//! attributes, no deduplication: downstream consumers must tolerate
//! duplicates on external replay.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::Client;
use tracing::{debug, info};

use super::{NotificationSink, Result, SinkError};

/// SQS-backed sink.
pub struct SqsSink {
    client: Client,
    queue_url: String,
}

impl SqsSink {
    /// Create a new SQS sink for `queue_url`.
    pub async fn new(queue_url: impl Into<String>, endpoint_url: Option<&str>) -> Self {
        let mut aws_config_builder = aws_config::defaults(BehaviorVersion::latest());

        if let Some(endpoint) = endpoint_url {
            aws_config_builder = aws_config_builder.endpoint_url(endpoint);
        }

        let aws_config = aws_config_builder.load().await;
        let queue_url = queue_url.into();

        info!(queue_url = %queue_url, endpoint = ?endpoint_url, "Connected to AWS SQS");

        Self {
            client: Client::new(&aws_config),
            queue_url,
        }
    }
}

#[async_trait]
impl NotificationSink for SqsSink {
    async fn publish(&self, payload: String) -> Result<()> {
        let len = payload.len();
        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(payload)
            .send()
            .await
            .map_err(|e| SinkError::Publish(format!("Failed to send to SQS: {}", e)))?;

        debug!(queue_url = %self.queue_url, bytes = len, "Sent message to SQS");
        Ok(())
    }
}
