//! ledger-ingest: process one batch of CSV drops
//!
//! Reads a bucket event notification, fetches every object it names,
//! reconciles the rows into the record store and publishes customer
//! aggregates after each item file.
//!
//! ## Usage
//! ```text
//! ledger-ingest [EVENT_JSON]      # event read from stdin when omitted
//! ```
//!
//! ## Configuration
//! - LEDGER_CONFIG: YAML config file (optional, see `config::Config::load`)
//! - LEDGER_LOG: log filter (default: info)
//! - DYNAMODB_TABLE / SQS_QUEUE / S3_BUCKET: deployment overrides
//!
//! Row and file failures are reported but never fail the process; only
//! start-up errors (bad config, unreadable event) exit non-zero.

use std::io::Read;

use tracing::info;

use ledger_ingest::config::Config;
use ledger_ingest::dispatch::BatchDispatcher;
use ledger_ingest::event::S3Event;
use ledger_ingest::sink::init_sink;
use ledger_ingest::source::init_source;
use ledger_ingest::storage::init_storage;
use ledger_ingest::utils::bootstrap::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::load(None)?;

    let raw = match std::env::args().nth(1) {
        Some(path) => tokio::fs::read_to_string(&path).await?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let event = S3Event::from_json(&raw)?;

    let store = init_storage(&config.storage).await?;
    let sink = init_sink(&config.sink).await?;
    let source = init_source(&config.source).await?;

    info!(
        objects = event.records.len(),
        bucket = ?config.source.bucket,
        "ledger-ingest started"
    );

    let dispatcher = BatchDispatcher::new(source, store, sink, config.ingest);
    let report = dispatcher.handle_event(&event).await;

    let rows_applied: usize = report.files.iter().map(|f| f.rows.applied).sum();
    let rows_skipped: usize = report.files.iter().map(|f| f.rows.skipped()).sum();
    info!(
        files = report.files.len(),
        rows_applied,
        rows_skipped,
        unrecognized = report.unrecognized,
        fetch_failures = report.fetch_failures,
        customers_published = report.customers_published,
        publish_failures = report.publish_failures,
        "ledger-ingest finished"
    );

    Ok(())
}
