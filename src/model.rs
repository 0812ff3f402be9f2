//! Customer aggregate.
//!
//! A `Customer` is the unit of storage and of overwrite: its orders and
//! their item references are embedded, never stored on their own.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Adding an order would push the running total past what a `Decimal`
/// can hold. The aggregate is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("total {total} overflows when adding {amount}")]
pub struct TotalOverflow {
    pub total: Decimal,
    pub amount: Decimal,
}

/// Customer aggregate root.
///
/// `total_spent` always equals the sum of `amount` over `orders`; the only
/// mutation paths are [`Customer::record_order`] and
/// [`Customer::attach_item`], which keep that true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(rename = "total_amount_spent")]
    pub total_spent: Decimal,
    #[serde(default)]
    pub orders: Vec<Order>,
}

/// Order embedded in a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub amount: Decimal,
    #[serde(default)]
    pub item_ids: Vec<String>,
}

impl Customer {
    /// Fresh aggregate with no orders and a zero total.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            total_spent: Decimal::ZERO,
            orders: Vec::new(),
        }
    }

    /// Append an order and add its amount to the running total.
    ///
    /// On overflow neither the total nor the order list changes.
    pub fn record_order(&mut self, order: Order) -> Result<(), TotalOverflow> {
        self.total_spent = self
            .total_spent
            .checked_add(order.amount)
            .ok_or(TotalOverflow {
                total: self.total_spent,
                amount: order.amount,
            })?;
        self.orders.push(order);
        Ok(())
    }

    /// Append `item_id` to every order whose ID is `order_id`.
    ///
    /// Returns the number of orders touched.
    pub fn attach_item(&mut self, order_id: &str, item_id: &str) -> usize {
        let mut touched = 0;
        for order in self.orders.iter_mut().filter(|o| o.id == order_id) {
            order.item_ids.push(item_id.to_string());
            touched += 1;
        }
        touched
    }

    /// Whether any embedded order has the given ID.
    pub fn has_order(&self, order_id: &str) -> bool {
        self.orders.iter().any(|o| o.id == order_id)
    }

    /// Serialize to the JSON body published downstream.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Order {
    pub fn new(id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: id.into(),
            amount,
            item_ids: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_new_customer_is_empty() {
        let customer = Customer::new("C1", "Alice");
        assert_eq!(customer.total_spent, Decimal::ZERO);
        assert!(customer.orders.is_empty());
    }

    #[test]
    fn test_record_order_keeps_total_in_sync() {
        let mut customer = Customer::new("C1", "Alice");
        customer.record_order(Order::new("O1", dec("42.50"))).unwrap();
        customer.record_order(Order::new("O2", dec("0.10"))).unwrap();
        customer.record_order(Order::new("O3", dec("0.20"))).unwrap();

        let sum: Decimal = customer.orders.iter().map(|o| o.amount).sum();
        assert_eq!(customer.total_spent, sum);
        assert_eq!(customer.total_spent, dec("42.80"));
    }

    #[test]
    fn test_record_order_overflow_leaves_aggregate_unchanged() {
        let mut customer = Customer::new("C1", "Alice");
        customer.record_order(Order::new("O1", Decimal::MAX)).unwrap();
        let before = customer.clone();

        let err = customer
            .record_order(Order::new("O2", Decimal::MAX))
            .unwrap_err();

        assert_eq!(err.amount, Decimal::MAX);
        assert_eq!(customer, before);
    }

    #[test]
    fn test_attach_item_touches_every_matching_order() {
        let mut customer = Customer::new("C1", "Alice");
        customer.record_order(Order::new("O1", dec("1"))).unwrap();
        customer.record_order(Order::new("O2", dec("1"))).unwrap();
        customer.record_order(Order::new("O1", dec("1"))).unwrap();

        assert_eq!(customer.attach_item("O1", "I1"), 2);
        assert_eq!(customer.orders[0].item_ids, vec!["I1"]);
        assert!(customer.orders[1].item_ids.is_empty());
        assert_eq!(customer.orders[2].item_ids, vec!["I1"]);
    }

    #[test]
    fn test_attach_item_without_match_is_noop() {
        let mut customer = Customer::new("C1", "Alice");
        customer.record_order(Order::new("O1", dec("1"))).unwrap();
        let before = customer.clone();

        assert_eq!(customer.attach_item("O9", "I1"), 0);
        assert_eq!(customer, before);
    }

    #[test]
    fn test_json_uses_downstream_field_names() {
        let mut customer = Customer::new("C1", "Alice");
        customer.record_order(Order::new("O1", dec("42.50"))).unwrap();
        customer.attach_item("O1", "I1");

        let value: serde_json::Value =
            serde_json::from_str(&customer.to_json().unwrap()).unwrap();
        assert_eq!(value["id"], "C1");
        assert_eq!(value["name"], "Alice");
        assert_eq!(value["total_amount_spent"].as_f64(), Some(42.5));
        assert_eq!(value["orders"][0]["id"], "O1");
        assert_eq!(value["orders"][0]["item_ids"][0], "I1");
    }
}
