//! # rowgate executor
//!
//! The transactional execution mediator. Callers obtain an execution
//! context and issue row operations against it; the context forwards each
//! call to the storage adapter with its transaction handle (or none).
//!
//! - [`Mediator`] - entry point: hands out contexts, runs closures in a transaction
//! - [`ExecutionContext`] - the row-operation surface shared by both context kinds
//! - [`AmbientContext`] - transaction-less execution
//! - [`TransactionScope`] - one adapter transaction, with diff-based updates
//! - [`MediatorConfig`] - `rowgate.toml` settings
//!
//! ## Quick Start
//!
//! ```text
//! use rowgate_executor::{ExecutionContext, Mediator};
//!
//! let mediator = Mediator::new(adapter);
//!
//! // Ambient
//! let ctx = mediator.ambient();
//! ctx.insert("users", Row::new().with("name", "Alice"), true)?;
//!
//! // Transactional
//! mediator.transaction(|scope| {
//!     let original = scope.find_one("users", &Criteria::eq("name", "Alice"))?.unwrap_or_default();
//!     let updated = original.clone().with("name", "Alicia");
//!     scope.update_diff("users", &updated, &original)
//! })?;
//! ```
//!
//! ## Bulk operations
//!
//! | Operation | Per-row failure |
//! |-----------|-----------------|
//! | `insert_many`, `upsert_many` | isolated, reported to the [`RowErrorHandler`](rowgate_core::RowErrorHandler) |
//! | `update_many_diff` | aborts the batch, returned to the caller |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod ambient;
mod callback;
mod config;
mod context;
pub mod diff;
mod mediator;
mod scope;

// Test modules
#[cfg(test)]
mod tests;

pub use ambient::AmbientContext;
pub use config::{MediatorConfig, CONFIG_FILE_NAME};
pub use context::ExecutionContext;
pub use diff::DiffUpdate;
pub use mediator::{Mediator, MediatorStats};
pub use scope::TransactionScope;
