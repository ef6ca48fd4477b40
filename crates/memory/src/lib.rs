//! In-memory reference adapter for rowgate
//!
//! [`MemoryAdapter`] implements every [`StorageAdapter`](rowgate_core::StorageAdapter)
//! operation and, unless built with [`MemoryAdapter::without_transactions`],
//! the [`TransactionalAdapter`](rowgate_core::TransactionalAdapter)
//! capability. It backs the integration tests and is usable on its own for
//! prototyping.
//!
//! ```ignore
//! use rowgate_memory::{MemoryAdapter, TableSpec};
//!
//! let adapter = MemoryAdapter::new().with_table("users", TableSpec::auto_increment("id"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod adapter;
pub mod eval;
pub mod table;
mod transaction;

pub use adapter::MemoryAdapter;
pub use table::{Table, TableSpec, Tables};
pub use transaction::MemoryTransaction;
