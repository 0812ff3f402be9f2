//! Item ingest: `[item_id, order_id, ..]`.

use tracing::debug;

use super::{ReconcileError, Reconciler, RowOutcome};
use crate::decoder::Row;

impl Reconciler {
    /// Attach the item to every order with the row's order ID, in every
    /// customer.
    ///
    /// Rows name no customer, so the whole store is scanned. Each customer
    /// holding a match is re-read under its lock, updated and written back
    /// once. A write failure on one customer does not stop the others; the
    /// first failure is returned after all were attempted.
    pub async fn ingest_item(&self, row: &Row) -> Result<RowOutcome, ReconcileError> {
        let item_id = row.field(0);
        let order_id = row.field(1);

        let candidates: Vec<String> = self
            .store
            .scan_all()
            .await
            .map_err(ReconcileError::Scan)?
            .into_iter()
            .filter(|c| c.has_order(order_id))
            .map(|c| c.id)
            .collect();

        let mut attached = 0;
        let mut first_failure = None;

        for customer_id in candidates {
            match self.attach(&customer_id, order_id, item_id).await {
                Ok(true) => attached += 1,
                Ok(false) => {}
                Err(e) => {
                    if first_failure.is_none() {
                        first_failure = Some(e);
                    } else {
                        tracing::error!(error = %e, "Item not attached");
                    }
                }
            }
        }

        if let Some(e) = first_failure {
            return Err(e);
        }

        debug!(%item_id, %order_id, customers = attached, line = row.line, "Attached item");
        if attached == 0 {
            Ok(RowOutcome::NoMatch)
        } else {
            Ok(RowOutcome::Applied)
        }
    }

    /// Returns whether the customer still held a matching order.
    async fn attach(
        &self,
        customer_id: &str,
        order_id: &str,
        item_id: &str,
    ) -> Result<bool, ReconcileError> {
        let _guard = self.locks.lock(customer_id).await;

        let current = self
            .store
            .get(customer_id)
            .await
            .map_err(|source| ReconcileError::Read {
                customer_id: customer_id.to_string(),
                source,
            })?;
        let Some(mut customer) = current else {
            return Ok(false);
        };

        // A customer file may have reset it since the scan.
        if customer.attach_item(order_id, item_id) == 0 {
            return Ok(false);
        }

        self.store
            .put(&customer)
            .await
            .map_err(|source| ReconcileError::Persist {
                customer_id: customer_id.to_string(),
                source,
            })?;
        Ok(true)
    }
}
