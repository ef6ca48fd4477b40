//! rowgate - transactional execution mediator for schema-less row operations
//!
//! rowgate sits between code that issues row operations (find, insert,
//! update, delete, upsert) and a pluggable storage adapter that performs
//! them. For each call it decides whether the operation runs ambiently or
//! inside a transaction scope, and it adds two behaviors adapters do not
//! provide themselves: diff-based updates and bulk operations with per-row
//! error isolation.
//!
//! # Quick Start
//!
//! ```ignore
//! use rowgate::{Criteria, ExecutionContext, Mediator, MemoryAdapter, Row, TableSpec};
//!
//! let adapter = MemoryAdapter::new().with_table("users", TableSpec::auto_increment("id"));
//! let mediator = Mediator::from_adapter(adapter);
//!
//! let alice = mediator.ambient().insert("users", Row::new().with("name", "Alice"), true)?;
//!
//! mediator.transaction(|scope| {
//!     let renamed = alice.clone().with("name", "Alicia");
//!     scope.update_diff("users", &renamed, &alice)
//! })?;
//! ```
//!
//! # Architecture
//!
//! - `rowgate-core`: values, rows, criteria, errors, adapter capability traits
//! - `rowgate-executor`: execution contexts, transaction scopes, the mediator
//! - `rowgate-memory`: in-memory reference adapter

pub use rowgate_core::*;
pub use rowgate_executor::*;
pub use rowgate_memory::{MemoryAdapter, MemoryTransaction, TableSpec};
