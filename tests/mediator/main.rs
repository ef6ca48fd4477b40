//! Mediator integration tests
//!
//! End-to-end behavior of the mediator over the in-memory adapter:
//! - ambient execution
//! - transaction scopes and the closure helper
//! - bulk operations with per-row isolation
//! - diff-based updates
//! - configuration files

mod common;

mod ambient;
mod config;
mod transactions;
