//! Notification sink configuration types.

use serde::Deserialize;

/// Sink type discriminator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkType {
    /// Emit each payload as a log line.
    #[default]
    Log,
    /// AWS SQS queue.
    Sqs,
}

/// Sink configuration (discriminated union).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Sink type discriminator.
    #[serde(rename = "type")]
    pub sink_type: SinkType,
    /// SQS-specific configuration.
    pub sqs: SqsConfig,
}

/// SQS-specific configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SqsConfig {
    /// Full queue URL messages are sent to.
    pub queue_url: String,
    /// Custom endpoint URL (for LocalStack or testing).
    pub endpoint_url: Option<String>,
}
