//! DynamoDB CustomerStore implementation.
//!
//! Table schema:
//! - `ID`: customer ID (String, hash key)
//! - `Name`: customer name (String)
//! - `TotalSpent`: running total (Number)
//! - `Orders`: List of Maps `{ID: S, Amount: N, ItemIDs: L<S>}`
//!
//! Empty collections may also be stored as `NULL`, which older writers of
//! the same table produced; both read back as empty.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::{CustomerStore, Result, StorageError};
use crate::model::{Customer, Order};

type Item = HashMap<String, AttributeValue>;

const ID_ATTR: &str = "ID";
const NAME_ATTR: &str = "Name";
const TOTAL_ATTR: &str = "TotalSpent";
const ORDERS_ATTR: &str = "Orders";
const AMOUNT_ATTR: &str = "Amount";
const ITEM_IDS_ATTR: &str = "ItemIDs";

/// DynamoDB implementation of CustomerStore.
pub struct DynamoCustomerStore {
    client: Client,
    table_name: String,
}

impl DynamoCustomerStore {
    /// Create a new DynamoDB customer store.
    pub async fn new(table_name: impl Into<String>, endpoint_url: Option<&str>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        let client = if let Some(endpoint) = endpoint_url {
            let dynamo_config = aws_sdk_dynamodb::config::Builder::from(&config)
                .endpoint_url(endpoint)
                .build();
            Client::from_conf(dynamo_config)
        } else {
            Client::new(&config)
        };

        let table_name = table_name.into();
        info!(table = %table_name, "Connected to DynamoDB for customers");

        Self { client, table_name }
    }
}

#[async_trait]
impl CustomerStore for DynamoCustomerStore {
    async fn get(&self, id: &str) -> Result<Option<Customer>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(ID_ATTR, AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("DynamoDB get_item failed: {}", e)))?;

        match result.item {
            Some(item) if !item.is_empty() => customer_from_item(&item).map(Some),
            _ => Ok(None),
        }
    }

    async fn put(&self, customer: &Customer) -> Result<()> {
        if customer.id.is_empty() {
            return Err(StorageError::MissingId);
        }

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(customer_to_item(customer)))
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("DynamoDB put_item failed: {}", e)))?;

        debug!(customer_id = %customer.id, orders = customer.orders.len(), "Stored customer in DynamoDB");
        Ok(())
    }

    async fn scan_all(&self) -> Result<Vec<Customer>> {
        let mut customers = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let page = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| StorageError::Backend(format!("DynamoDB scan failed: {}", e)))?;

            customers.extend(customers_from_page(page.items.unwrap_or_default()));

            match page.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        debug!(count = customers.len(), "Scanned customers from DynamoDB");
        Ok(customers)
    }
}

/// Decode a scan page. An item that does not map to a customer is logged
/// and left out so the rest of the table still comes back.
fn customers_from_page(items: Vec<Item>) -> Vec<Customer> {
    items
        .iter()
        .filter_map(|item| match customer_from_item(item) {
            Ok(customer) => Some(customer),
            Err(e) => {
                let id = match item.get(ID_ATTR) {
                    Some(AttributeValue::S(id)) => id.as_str(),
                    _ => "<missing>",
                };
                warn!(customer_id = %id, error = %e, "Skipping malformed customer item");
                None
            }
        })
        .collect()
}

fn customer_to_item(customer: &Customer) -> Item {
    let orders = customer
        .orders
        .iter()
        .map(|order| {
            let mut m = HashMap::new();
            m.insert(ID_ATTR.to_string(), AttributeValue::S(order.id.clone()));
            m.insert(
                AMOUNT_ATTR.to_string(),
                AttributeValue::N(order.amount.to_string()),
            );
            m.insert(
                ITEM_IDS_ATTR.to_string(),
                AttributeValue::L(
                    order
                        .item_ids
                        .iter()
                        .map(|id| AttributeValue::S(id.clone()))
                        .collect(),
                ),
            );
            AttributeValue::M(m)
        })
        .collect();

    let mut item = HashMap::new();
    item.insert(ID_ATTR.to_string(), AttributeValue::S(customer.id.clone()));
    item.insert(NAME_ATTR.to_string(), AttributeValue::S(customer.name.clone()));
    item.insert(
        TOTAL_ATTR.to_string(),
        AttributeValue::N(customer.total_spent.to_string()),
    );
    item.insert(ORDERS_ATTR.to_string(), AttributeValue::L(orders));
    item
}

fn customer_from_item(item: &Item) -> Result<Customer> {
    let orders = list_attr(item, ORDERS_ATTR)?
        .iter()
        .map(|value| match value {
            AttributeValue::M(m) => order_from_map(m),
            other => Err(StorageError::Malformed(format!(
                "order entry is not a map: {:?}",
                other
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Customer {
        id: string_attr(item, ID_ATTR)?,
        name: string_attr(item, NAME_ATTR).unwrap_or_default(),
        total_spent: number_attr(item, TOTAL_ATTR).unwrap_or(Decimal::ZERO),
        orders,
    })
}

fn order_from_map(m: &Item) -> Result<Order> {
    let item_ids = list_attr(m, ITEM_IDS_ATTR)?
        .iter()
        .map(|value| match value {
            AttributeValue::S(s) => Ok(s.clone()),
            other => Err(StorageError::Malformed(format!(
                "item reference is not a string: {:?}",
                other
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Order {
        id: string_attr(m, ID_ATTR)?,
        amount: number_attr(m, AMOUNT_ATTR)?,
        item_ids,
    })
}

fn string_attr(item: &Item, name: &str) -> Result<String> {
    match item.get(name) {
        Some(AttributeValue::S(s)) => Ok(s.clone()),
        other => Err(StorageError::Malformed(format!(
            "{} is not a string: {:?}",
            name, other
        ))),
    }
}

fn number_attr(item: &Item, name: &str) -> Result<Decimal> {
    match item.get(name) {
        Some(AttributeValue::N(n)) => Decimal::from_str(n)
            .or_else(|_| Decimal::from_scientific(n))
            .map_err(|e| StorageError::Malformed(format!("{} is not a decimal: {}", name, e))),
        other => Err(StorageError::Malformed(format!(
            "{} is not a number: {:?}",
            name, other
        ))),
    }
}

fn list_attr<'a>(item: &'a Item, name: &str) -> Result<&'a [AttributeValue]> {
    match item.get(name) {
        Some(AttributeValue::L(values)) => Ok(values),
        None | Some(AttributeValue::Null(_)) => Ok(&[]),
        Some(other) => Err(StorageError::Malformed(format!(
            "{} is not a list: {:?}",
            name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_item_mapping_preserves_aggregate() {
        let mut customer = Customer::new("C1", "Alice");
        customer.record_order(Order::new("O1", dec("42.50"))).unwrap();
        customer.record_order(Order::new("O2", dec("7"))).unwrap();
        customer.attach_item("O1", "I1");
        customer.attach_item("O1", "I2");

        let item = customer_to_item(&customer);
        assert_eq!(item.get("ID"), Some(&AttributeValue::S("C1".to_string())));
        assert_eq!(
            item.get("TotalSpent"),
            Some(&AttributeValue::N("49.50".to_string()))
        );

        assert_eq!(customer_from_item(&item).unwrap(), customer);
    }

    #[test]
    fn test_null_collections_read_as_empty() {
        let mut order = HashMap::new();
        order.insert("ID".to_string(), AttributeValue::S("O1".to_string()));
        order.insert("Amount".to_string(), AttributeValue::N("3.5".to_string()));
        order.insert("ItemIDs".to_string(), AttributeValue::Null(true));

        let mut item = HashMap::new();
        item.insert("ID".to_string(), AttributeValue::S("C1".to_string()));
        item.insert("Name".to_string(), AttributeValue::S("Alice".to_string()));
        item.insert("TotalSpent".to_string(), AttributeValue::N("3.5".to_string()));
        item.insert(
            "Orders".to_string(),
            AttributeValue::L(vec![AttributeValue::M(order)]),
        );

        let customer = customer_from_item(&item).unwrap();
        assert_eq!(customer.orders.len(), 1);
        assert!(customer.orders[0].item_ids.is_empty());
        assert_eq!(customer.total_spent, dec("3.5"));

        item.insert("Orders".to_string(), AttributeValue::Null(true));
        assert!(customer_from_item(&item).unwrap().orders.is_empty());
    }

    #[test]
    fn test_malformed_item_is_skipped_in_scan_page() {
        let good = customer_to_item(&Customer::new("C1", "Alice"));
        let mut bad = customer_to_item(&Customer::new("C2", "Bob"));
        bad.insert("Orders".to_string(), AttributeValue::S("oops".to_string()));
        let also_good = customer_to_item(&Customer::new("C3", "Carol"));

        let customers = customers_from_page(vec![good, bad, also_good]);

        let ids: Vec<&str> = customers.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["C1", "C3"]);
    }

    #[test]
    fn test_missing_id_is_malformed() {
        let mut item = HashMap::new();
        item.insert("Name".to_string(), AttributeValue::S("Alice".to_string()));
        assert!(matches!(
            customer_from_item(&item),
            Err(StorageError::Malformed(_))
        ));
    }
}
