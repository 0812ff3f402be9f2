//! Batch dispatcher.
//!
//! Routes each object of a batch to its ingest stage by file name, then,
//! after every item file, publishes the full contents of the record store
//! one customer per message.
//!
//! Nothing here aborts a batch. Unknown files and fetch failures become
//! diagnostics on the sink, bad rows are the reconciler's concern, and
//! failed publishes are logged and counted.


use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::IngestConfig;
use crate::event::{ObjectRef, S3Event};
use crate::model::Customer;
use crate::reconcile::{Reconciler, Stage, StageReport};
use crate::sink::{Diagnostic, DiagnosticKind, NotificationSink, SinkError};
use crate::source::ObjectSource;
use crate::storage::CustomerStore;

/// What a file name says about its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Stage(Stage),
    Unrecognized,
}

impl FileKind {
    /// Classify by the prefix of the whole object key: `customers_*` or
    /// exactly `customers.csv`, and likewise for orders and items. Keys
    /// under any other prefix, directories included, are unrecognized.
    pub fn classify(object: &ObjectRef) -> Self {
        [Stage::Customers, Stage::Orders, Stage::Items]
            .into_iter()
            .find(|stage| {
                object
                    .key
                    .strip_prefix(stage.as_str())
                    .is_some_and(|rest| rest.starts_with('_') || rest == ".csv")
            })
            .map(FileKind::Stage)
            .unwrap_or(FileKind::Unrecognized)
    }

    /// Dispatch position when ordering by stage; unrecognized files last.
    fn rank(self) -> u8 {
        match self {
            FileKind::Stage(Stage::Customers) => 0,
            FileKind::Stage(Stage::Orders) => 1,
            FileKind::Stage(Stage::Items) => 2,
            FileKind::Unrecognized => 3,
        }
    }
}

/// Outcome of one ingested file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub object: ObjectRef,
    pub stage: Stage,
    pub rows: StageReport,
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    pub unrecognized: usize,
    pub fetch_failures: usize,
    pub diagnostics_published: usize,
    pub customers_published: usize,
    pub publish_failures: usize,
    pub scan_failures: usize,
}

/// Drives one batch through fetch, decode, reconcile and fan-out.
pub struct BatchDispatcher {
    source: Arc<dyn ObjectSource>,
    reconciler: Reconciler,
    sink: Arc<dyn NotificationSink>,
    config: IngestConfig,
}

impl BatchDispatcher {
    pub fn new(
        source: Arc<dyn ObjectSource>,
        store: Arc<dyn CustomerStore>,
        sink: Arc<dyn NotificationSink>,
        config: IngestConfig,
    ) -> Self {
        Self {
            source,
            reconciler: Reconciler::new(store),
            sink,
            config,
        }
    }

    /// Handle every object named by a bucket event.
    pub async fn handle_event(&self, event: &S3Event) -> BatchReport {
        self.handle(event.objects()).await
    }

    /// Handle a batch, one file at a time.
    ///
    /// With `order_by_stage` the batch is stably regrouped customers, orders,
    /// items, then unrecognized; otherwise files run in delivery order.
    #[tracing::instrument(name = "dispatch.batch", skip_all, fields(files = objects.len()))]
    pub async fn handle(&self, mut objects: Vec<ObjectRef>) -> BatchReport {
        if self.config.order_by_stage {
            objects.sort_by_key(|o| FileKind::classify(o).rank());
        }

        let mut report = BatchReport::default();
        for object in objects {
            self.handle_object(object, &mut report).await;
        }

        info!(
            files = report.files.len(),
            unrecognized = report.unrecognized,
            fetch_failures = report.fetch_failures,
            customers_published = report.customers_published,
            publish_failures = report.publish_failures,
            "Batch complete"
        );
        report
    }

    async fn handle_object(&self, object: ObjectRef, report: &mut BatchReport) {
        let stage = match FileKind::classify(&object) {
            FileKind::Stage(stage) => stage,
            FileKind::Unrecognized => {
                warn!(%object, "Unrecognized input file");
                report.unrecognized += 1;
                let diagnostic = Diagnostic::new(
                    DiagnosticKind::UnrecognizedInput,
                    &object.bucket,
                    &object.key,
                    format!("Unexpected file: {}", object.key),
                );
                if diagnostic.report(self.sink.as_ref()).await {
                    report.diagnostics_published += 1;
                }
                return;
            }
        };

        let bytes = match self.source.fetch(&object).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(%object, error = %e, "Unable to fetch file");
                report.fetch_failures += 1;
                let diagnostic = Diagnostic::new(
                    DiagnosticKind::FetchFailed,
                    &object.bucket,
                    &object.key,
                    format!("Failed to download file: {}", e),
                );
                if diagnostic.report(self.sink.as_ref()).await {
                    report.diagnostics_published += 1;
                }
                return;
            }
        };

        let rows = self
            .reconciler
            .ingest(stage, &object.key, bytes.as_slice(), self.config.has_header)
            .await;
        report.files.push(FileReport {
            object,
            stage,
            rows,
        });

        if stage == Stage::Items {
            self.publish_all(report).await;
        }
    }

    /// Publish every stored customer; the store is scanned once, without
    /// locks, so the messages reflect whatever was visible at scan time.
    #[tracing::instrument(name = "dispatch.fan_out", skip_all)]
    async fn publish_all(&self, report: &mut BatchReport) {
        let customers = match self.reconciler.store().scan_all().await {
            Ok(customers) => customers,
            Err(e) => {
                error!(error = %e, "Failed to retrieve customers");
                report.scan_failures += 1;
                return;
            }
        };

        for customer in &customers {
            match self.publish_customer(customer).await {
                Ok(()) => {
                    info!(customer_id = %customer.id, "Sent customer downstream");
                    report.customers_published += 1;
                }
                Err(e) => {
                    warn!(customer_id = %customer.id, error = %e, "Failed to send customer downstream");
                    report.publish_failures += 1;
                }
            }
        }
    }

    async fn publish_customer(&self, customer: &Customer) -> Result<(), SinkError> {
        let payload = customer.to_json()?;
        self.sink.publish(payload).await
    }
}
