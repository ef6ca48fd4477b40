//! Shared test utilities for the integration test suites.
//!
//! Imported via `mod common;` from the suite's main.rs.

#![allow(dead_code)]

use std::sync::{Arc, Once};

pub use rowgate::{
    Criteria, Error, ExecutionContext, FailureLog, Mediator, MediatorConfig, MemoryAdapter, Row,
    StorageAdapter, TableSpec, Value,
};

static INIT_TRACING: Once = Once::new();

/// Install a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Adapter with the tables every suite uses:
/// - `users`: auto-increment `id`
/// - `tags`: keyed on `name`
pub fn memory_adapter() -> MemoryAdapter {
    init_tracing();
    MemoryAdapter::new()
        .with_table("users", TableSpec::auto_increment("id"))
        .with_table("tags", TableSpec::keyed(["name"]))
}

/// Mediator over a fresh [`memory_adapter`], plus a typed handle to the adapter
pub fn mediator() -> (Mediator, MemoryAdapter) {
    let adapter = memory_adapter();
    let mediator = Mediator::new(Arc::new(adapter.clone()));
    (mediator, adapter)
}

pub fn user(name: &str, age: i64) -> Row {
    Row::new().with("name", name).with("age", age)
}

pub fn names(rows: impl IntoIterator<Item = Row>) -> Vec<String> {
    rows.into_iter()
        .filter_map(|r| r.get("name").and_then(Value::as_str).map(str::to_string))
        .collect()
}
