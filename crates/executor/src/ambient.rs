//! Ambient (transaction-less) execution

use std::sync::Arc;

use rowgate_core::{Result, StorageAdapter, TransactionHandle};

use crate::context::ExecutionContext;

/// Execution context that runs every operation without a transaction.
///
/// Cheap to clone; clones share the adapter.
#[derive(Clone)]
pub struct AmbientContext {
    adapter: Arc<dyn StorageAdapter>,
    trace: bool,
}

impl AmbientContext {
    /// Ambient context over `adapter`
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        Self {
            adapter,
            trace: false,
        }
    }

    /// Enable or disable per-operation `debug!` events
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.trace = enabled;
        self
    }
}

impl std::fmt::Debug for AmbientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmbientContext")
            .field("adapter", &self.adapter.name())
            .field("trace", &self.trace)
            .finish()
    }
}

impl ExecutionContext for AmbientContext {
    fn adapter(&self) -> &dyn StorageAdapter {
        self.adapter.as_ref()
    }

    fn transaction(&self) -> Result<Option<&dyn TransactionHandle>> {
        Ok(None)
    }

    fn trace_operations(&self) -> bool {
        self.trace
    }
}
