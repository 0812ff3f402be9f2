//! Order ingest: `[order_id, customer_id, amount, ..]`.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::debug;

use super::{ReconcileError, Reconciler, RowOutcome};
use crate::decoder::Row;
use crate::model::Order;

impl Reconciler {
    /// Append an order to an existing customer and add to its total.
    ///
    /// Never creates a customer. Replaying the same row appends a second
    /// copy of the order.
    pub async fn ingest_order(&self, row: &Row) -> Result<RowOutcome, ReconcileError> {
        let order_id = row.field(0);
        let customer_id = row.field(1);
        let amount = parse_amount(row.field(2))?;

        let _guard = self.locks.lock(customer_id).await;

        let mut customer = self
            .store
            .get(customer_id)
            .await
            .map_err(|source| ReconcileError::Read {
                customer_id: customer_id.to_string(),
                source,
            })?
            .ok_or_else(|| ReconcileError::LookupMiss {
                customer_id: customer_id.to_string(),
            })?;

        customer
            .record_order(Order::new(order_id, amount))
            .map_err(|source| ReconcileError::Overflow {
                customer_id: customer_id.to_string(),
                source,
            })?;

        self.store
            .put(&customer)
            .await
            .map_err(|source| ReconcileError::Persist {
                customer_id: customer_id.to_string(),
                source,
            })?;

        debug!(
            %customer_id,
            %order_id,
            %amount,
            total = %customer.total_spent,
            line = row.line,
            "Recorded order"
        );
        Ok(RowOutcome::Applied)
    }
}

/// Parse a non-negative decimal amount. Accepts plain (`42.50`) and
/// scientific (`4.25e1`) notation, surrounding whitespace ignored.
pub(crate) fn parse_amount(raw: &str) -> Result<Decimal, ReconcileError> {
    let trimmed = raw.trim();
    let amount = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| ReconcileError::Parse {
            value: raw.to_string(),
            reason: e.to_string(),
        })?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ReconcileError::Parse {
            value: raw.to_string(),
            reason: "amount is negative".to_string(),
        });
    }
    Ok(amount)
}
