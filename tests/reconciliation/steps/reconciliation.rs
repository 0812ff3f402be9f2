//! Reconciliation pipeline step definitions.

use std::str::FromStr;
use std::sync::Arc;

use cucumber::gherkin::Step;
use cucumber::{given, then, when, World};
use rust_decimal::Decimal;

use ledger_ingest::config::IngestConfig;
use ledger_ingest::dispatch::{BatchDispatcher, BatchReport};
use ledger_ingest::event::ObjectRef;
use ledger_ingest::model::Customer;
use ledger_ingest::sink::InMemorySink;
use ledger_ingest::source::InMemorySource;
use ledger_ingest::storage::{CustomerStore, InMemoryCustomerStore};

const BUCKET: &str = "drops";

/// Test context for reconciliation scenarios.
#[derive(World)]
#[world(init = Self::new)]
pub struct ReconciliationWorld {
    source: Arc<InMemorySource>,
    store: Arc<InMemoryCustomerStore>,
    sink: Arc<InMemorySink>,
    config: IngestConfig,
    report: Option<BatchReport>,
}

impl std::fmt::Debug for ReconciliationWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationWorld")
            .field("config", &self.config)
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

impl ReconciliationWorld {
    fn new() -> Self {
        Self {
            source: Arc::new(InMemorySource::new()),
            store: Arc::new(InMemoryCustomerStore::new()),
            sink: Arc::new(InMemorySink::new()),
            config: IngestConfig::default(),
            report: None,
        }
    }

    fn report(&self) -> &BatchReport {
        self.report.as_ref().expect("Batch not processed")
    }

    async fn customer(&self, id: &str) -> Customer {
        self.store
            .get(id)
            .await
            .expect("Store read failed")
            .unwrap_or_else(|| panic!("Customer {} not found", id))
    }

    /// Published payloads that are customer aggregates, not diagnostics.
    async fn published_customers(&self) -> Vec<Customer> {
        self.sink
            .published()
            .await
            .iter()
            .filter_map(|p| {
                let value: serde_json::Value = serde_json::from_str(p).ok()?;
                if value.get("kind").is_some() {
                    return None;
                }
                serde_json::from_value(value).ok()
            })
            .collect()
    }

    async fn published_diagnostics(&self) -> Vec<serde_json::Value> {
        self.sink
            .published()
            .await
            .iter()
            .filter_map(|p| serde_json::from_str::<serde_json::Value>(p).ok())
            .filter(|v| v.get("kind").is_some())
            .collect()
    }
}

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).expect("Invalid decimal in scenario")
}

// --- Given steps ---

#[given(expr = "a file {string} containing:")]
async fn given_file(world: &mut ReconciliationWorld, step: &Step, key: String) {
    let body = step
        .docstring
        .as_deref()
        .expect("Step needs a doc string")
        .trim_start_matches('\n');
    world
        .source
        .insert(ObjectRef::new(BUCKET, key), body.as_bytes())
        .await;
}

#[given("stage grouping is disabled")]
async fn given_stage_grouping_disabled(world: &mut ReconciliationWorld) {
    world.config.order_by_stage = false;
}

#[given(expr = "publishing fails for customer {string}")]
async fn given_publish_fails_for(world: &mut ReconciliationWorld, id: String) {
    world
        .sink
        .fail_on_containing(format!("\"id\":\"{}\"", id))
        .await;
}

// --- When steps ---

#[when(expr = "the batch {string} is processed")]
async fn when_batch_processed(world: &mut ReconciliationWorld, keys: String) {
    let objects = keys
        .split(',')
        .map(|k| ObjectRef::new(BUCKET, k.trim()))
        .collect();
    let dispatcher = BatchDispatcher::new(
        world.source.clone(),
        world.store.clone(),
        world.sink.clone(),
        world.config.clone(),
    );
    world.report = Some(dispatcher.handle(objects).await);
}

// --- Then steps ---

#[then(expr = "customer {string} is named {string}")]
async fn then_customer_named(world: &mut ReconciliationWorld, id: String, name: String) {
    assert_eq!(world.customer(&id).await.name, name);
}

#[then(expr = "customer {string} has spent {string}")]
async fn then_customer_spent(world: &mut ReconciliationWorld, id: String, total: String) {
    assert_eq!(world.customer(&id).await.total_spent, decimal(&total));
}

#[then(expr = "customer {string} has {int} order(s)")]
async fn then_customer_order_count(world: &mut ReconciliationWorld, id: String, count: usize) {
    assert_eq!(world.customer(&id).await.orders.len(), count);
}

#[then(expr = "customer {string} does not exist")]
async fn then_customer_absent(world: &mut ReconciliationWorld, id: String) {
    let found = world.store.get(&id).await.expect("Store read failed");
    assert!(found.is_none(), "Customer {} should not exist", id);
}

#[then(expr = "order {string} of customer {string} holds items {string}")]
async fn then_order_items(
    world: &mut ReconciliationWorld,
    order_id: String,
    id: String,
    items: String,
) {
    let customer = world.customer(&id).await;
    let order = customer
        .orders
        .iter()
        .find(|o| o.id == order_id)
        .unwrap_or_else(|| panic!("Order {} not found on {}", order_id, id));
    let expected: Vec<&str> = items.split(',').filter(|s| !s.is_empty()).collect();
    assert_eq!(order.item_ids, expected);
}

#[then(expr = "file {string} skipped {int} row(s)")]
async fn then_file_skipped(world: &mut ReconciliationWorld, key: String, count: usize) {
    let file = world
        .report()
        .files
        .iter()
        .find(|f| f.object.key == key)
        .unwrap_or_else(|| panic!("File {} was not ingested", key));
    assert_eq!(file.rows.skipped(), count);
}

#[then(expr = "{int} customer message(s) was/were published")]
async fn then_customer_messages(world: &mut ReconciliationWorld, count: usize) {
    assert_eq!(world.published_customers().await.len(), count);
    assert_eq!(world.report().customers_published, count);
}

#[then(expr = "the published message for {string} shows a total of {string}")]
async fn then_published_total(world: &mut ReconciliationWorld, id: String, total: String) {
    let customers = world.published_customers().await;
    let sent = customers
        .iter()
        .find(|c| c.id == id)
        .unwrap_or_else(|| panic!("No message for {}", id));
    assert_eq!(sent.total_spent, decimal(&total));
}

#[then(expr = "a {string} diagnostic was published for {string}")]
async fn then_diagnostic(world: &mut ReconciliationWorld, kind: String, key: String) {
    let diagnostics = world.published_diagnostics().await;
    assert!(
        diagnostics
            .iter()
            .any(|d| d["kind"] == kind.as_str() && d["key"] == key.as_str()),
        "No {} diagnostic for {} in {:?}",
        kind,
        key,
        diagnostics
    );
}

#[then(expr = "{int} publish(es) failed")]
async fn then_publish_failures(world: &mut ReconciliationWorld, count: usize) {
    assert_eq!(world.report().publish_failures, count);
}
