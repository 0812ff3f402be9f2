//! Reconciliation engine.
//!
//! Three reducers fold CSV rows into customer aggregates held in a
//! [`CustomerStore`]:
//!
//! - customers: `[id, name, ..]` creates or resets an aggregate
//! - orders: `[order_id, customer_id, amount, ..]` appends an order
//! - items: `[item_id, order_id, ..]` attaches an item to matching orders
//!
//! Every mutation is one get-modify-put cycle on one customer, run under
//! that customer's [`KeyLocks`] entry. Failures are per row: the row is
//! logged and skipped and the stage carries on with the next one.

mod customer;
mod item;
mod locks;
mod order;


pub use locks::KeyLocks;

use std::io::Read;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::decoder::{CsvDecoder, DecodeError, Row};
use crate::model::TotalOverflow;
use crate::storage::{CustomerStore, StorageError};

/// The three ingest stages, in the order they must run for a full join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Customers,
    Orders,
    Items,
}

impl Stage {
    /// Columns a row must carry for this stage.
    pub fn min_fields(self) -> usize {
        match self {
            Stage::Customers => 2,
            Stage::Orders => 3,
            Stage::Items => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Customers => "customers",
            Stage::Orders => "orders",
            Stage::Items => "items",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a row was not applied.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Malformed row: {0}")]
    Decode(#[from] DecodeError),

    #[error("Invalid amount '{value}': {reason}")]
    Parse { value: String, reason: String },

    #[error("Order total for customer '{customer_id}' out of range: {source}")]
    Overflow {
        customer_id: String,
        #[source]
        source: TotalOverflow,
    },

    #[error("Customer '{customer_id}' not found")]
    LookupMiss { customer_id: String },

    #[error("Failed to read customer '{customer_id}': {source}")]
    Read {
        customer_id: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to scan customers: {0}")]
    Scan(#[source] StorageError),

    #[error("Failed to save customer '{customer_id}': {source}")]
    Persist {
        customer_id: String,
        #[source]
        source: StorageError,
    },
}

/// Effect of a successfully processed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// The store was written.
    Applied,
    /// An item row whose order ID matched nothing; not an error.
    NoMatch,
}

/// Per-file tally of row outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    pub applied: usize,
    pub unmatched: usize,
    pub decode_errors: usize,
    pub parse_errors: usize,
    pub lookup_misses: usize,
    pub store_errors: usize,
}

impl StageReport {
    fn record(&mut self, outcome: &Result<RowOutcome, ReconcileError>) {
        match outcome {
            Ok(RowOutcome::Applied) => self.applied += 1,
            Ok(RowOutcome::NoMatch) => self.unmatched += 1,
            Err(ReconcileError::Decode(_)) => self.decode_errors += 1,
            Err(ReconcileError::Parse { .. } | ReconcileError::Overflow { .. }) => {
                self.parse_errors += 1
            }
            Err(ReconcileError::LookupMiss { .. }) => self.lookup_misses += 1,
            Err(
                ReconcileError::Read { .. }
                | ReconcileError::Scan(_)
                | ReconcileError::Persist { .. },
            ) => self.store_errors += 1,
        }
    }

    /// Rows seen, whatever happened to them.
    pub fn rows(&self) -> usize {
        self.applied
            + self.unmatched
            + self.decode_errors
            + self.parse_errors
            + self.lookup_misses
            + self.store_errors
    }

    /// Rows that were dropped.
    pub fn skipped(&self) -> usize {
        self.rows() - self.applied - self.unmatched
    }
}

/// Applies rows to the record store.
pub struct Reconciler {
    store: Arc<dyn CustomerStore>,
    locks: KeyLocks,
}

impl Reconciler {
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self {
            store,
            locks: KeyLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn CustomerStore> {
        &self.store
    }

    /// Apply one decoded row for `stage`.
    pub async fn apply(&self, stage: Stage, row: &Row) -> Result<RowOutcome, ReconcileError> {
        match stage {
            Stage::Customers => self.ingest_customer(row).await,
            Stage::Orders => self.ingest_order(row).await,
            Stage::Items => self.ingest_item(row).await,
        }
    }

    /// Decode `reader` and fold every row into the store.
    ///
    /// Never fails as a whole: bad rows are logged, counted and skipped.
    #[tracing::instrument(name = "reconcile.ingest", skip_all, fields(%stage, %source))]
    pub async fn ingest<R: Read>(
        &self,
        stage: Stage,
        source: &str,
        reader: R,
        has_header: bool,
    ) -> StageReport {
        let mut report = StageReport::default();

        for decoded in CsvDecoder::new(reader, has_header, stage.min_fields()) {
            let outcome = match decoded {
                Ok(row) => self.apply(stage, &row).await,
                Err(e) => Err(e.into()),
            };
            log_outcome(stage, &outcome);
            report.record(&outcome);
        }

        info!(
            %stage,
            applied = report.applied,
            unmatched = report.unmatched,
            skipped = report.skipped(),
            "Stage complete"
        );
        report
    }
}

fn log_outcome(stage: Stage, outcome: &Result<RowOutcome, ReconcileError>) {
    match outcome {
        Ok(_) => {}
        Err(
            e @ (ReconcileError::Decode(_)
            | ReconcileError::Parse { .. }
            | ReconcileError::Overflow { .. }),
        ) => {
            warn!(%stage, error = %e, "Skipping row");
        }
        Err(e @ ReconcileError::LookupMiss { .. }) => {
            warn!(%stage, error = %e, "Dropping row");
        }
        Err(e) => {
            error!(%stage, error = %e, "Row not applied");
        }
    }
}
