//! Ingest pipeline tuning.

use serde::Deserialize;

/// Ingest configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Discard the first row of every file.
    pub has_header: bool,
    /// Dispatch customers, then orders, then items, regardless of the
    /// order files were delivered in.
    pub order_by_stage: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            has_header: true,
            order_by_stage: true,
        }
    }
}
