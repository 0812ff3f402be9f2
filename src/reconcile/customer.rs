//! Customer ingest: `[id, name, ..]`.

use tracing::debug;

use super::{ReconcileError, Reconciler, RowOutcome};
use crate::decoder::Row;
use crate::model::Customer;

impl Reconciler {
    /// Write a fresh aggregate for the row's customer ID.
    ///
    /// Last write wins: an existing aggregate with the same ID is replaced,
    /// dropping any orders and items already attached to it.
    pub async fn ingest_customer(&self, row: &Row) -> Result<RowOutcome, ReconcileError> {
        let customer = Customer::new(row.field(0), row.field(1));

        let _guard = self.locks.lock(&customer.id).await;
        self.store
            .put(&customer)
            .await
            .map_err(|source| ReconcileError::Persist {
                customer_id: customer.id.clone(),
                source,
            })?;

        debug!(customer_id = %customer.id, line = row.line, "Stored customer");
        Ok(RowOutcome::Applied)
    }
}
