//! Acceptance tests for the reconciliation pipeline using Cucumber.
//!
//! Each scenario drops CSV files into an in-memory bucket, runs one batch
//! through the dispatcher and inspects the record store and the messages
//! published to the sink.
//!
//! ```bash
//! cargo test --test reconciliation
//! ```

mod steps;

use cucumber::World;
use steps::reconciliation::ReconciliationWorld;

#[tokio::main]
async fn main() {
    println!("\n=== Running Reconciliation Acceptance Tests ===\n");
    ReconciliationWorld::cucumber()
        .fail_on_skipped()
        .run("tests/reconciliation/features/reconciliation.feature")
        .await;
}
