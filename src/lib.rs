//! Ledger Ingest - CSV reconciliation pipeline
//!
//! Folds independently-arriving customer, order and item CSV files into
//! denormalized customer aggregates held in a key-value store, then
//! forwards the assembled aggregates through a message queue.
//!
//! ## Architecture
//! ```text
//! [bucket event] -> BatchDispatcher -> ObjectSource -> CsvDecoder
//!                         |                               |
//!                         |                          Reconciler -> CustomerStore
//!                         v                                             |
//!                  NotificationSink  <-------- fan-out after items -----+
//! ```

pub mod config;
pub mod decoder;
pub mod dispatch;
pub mod event;
pub mod model;
pub mod reconcile;
pub mod sink;
pub mod source;
pub mod storage;
pub mod utils;
