//! Transaction handles for the in-memory adapter
//!
//! Each transaction works on a private copy of the committed tables taken at
//! begin. Commit installs the tables the transaction wrote to, replacing
//! their committed versions (the last committer wins per table). Tables it
//! only read, and tables created after it began, are left alone. Rollback
//! and dispose drop the copy.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rowgate_core::{AdapterError, AdapterResult, TransactionHandle, TxnId};
use tracing::{debug, warn};

use crate::table::Tables;

/// A transaction's private tables and the names it has written to
#[derive(Debug, Clone, Default)]
pub(crate) struct Workspace {
    pub(crate) tables: Tables,
    pub(crate) written: BTreeSet<String>,
}

/// State shared between the adapter and its open transactions
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) committed: RwLock<Tables>,
    pub(crate) open: Mutex<HashMap<TxnId, Workspace>>,
    next_txn: AtomicU64,
}

impl Shared {
    pub(crate) fn next_txn_id(&self) -> TxnId {
        TxnId::new(self.next_txn.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Active,
    Committed,
    RolledBack,
    Disposed,
}

/// Open transaction against a [`MemoryAdapter`](crate::MemoryAdapter)
#[derive(Debug)]
pub struct MemoryTransaction {
    id: TxnId,
    name: Option<String>,
    shared: Arc<Shared>,
    status: Status,
}

impl MemoryTransaction {
    pub(crate) fn begin(shared: Arc<Shared>, name: Option<&str>) -> Self {
        let id = shared.next_txn_id();
        let workspace = Workspace {
            tables: shared.committed.read().clone(),
            written: BTreeSet::new(),
        };
        shared.open.lock().insert(id, workspace);
        debug!(target: "rowgate::memory", txn = %id, name = ?name, "Transaction started");
        Self {
            id,
            name: name.map(str::to_string),
            shared,
            status: Status::Active,
        }
    }

    fn ensure_active(&self, action: &str) -> AdapterResult<()> {
        match self.status {
            Status::Active => Ok(()),
            other => Err(AdapterError::TransactionInactive(format!(
                "cannot {} {}: already {:?}",
                action, self.id, other
            ))),
        }
    }

    fn discard_workspace(&self) -> bool {
        self.shared.open.lock().remove(&self.id).is_some()
    }
}

impl TransactionHandle for MemoryTransaction {
    fn id(&self) -> TxnId {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn commit(&mut self) -> AdapterResult<()> {
        self.ensure_active("commit")?;
        let mut workspace = self.shared.open.lock().remove(&self.id).ok_or_else(|| {
            AdapterError::TransactionInactive(format!("{} has no workspace", self.id))
        })?;
        let mut committed = self.shared.committed.write();
        for name in &workspace.written {
            if let Some(table) = workspace.tables.remove(name) {
                committed.insert(name.clone(), table);
            }
        }
        drop(committed);
        self.status = Status::Committed;
        debug!(
            target: "rowgate::memory",
            txn = %self.id,
            tables = workspace.written.len(),
            "Transaction committed"
        );
        Ok(())
    }

    fn rollback(&mut self) -> AdapterResult<()> {
        self.ensure_active("roll back")?;
        self.discard_workspace();
        self.status = Status::RolledBack;
        debug!(target: "rowgate::memory", txn = %self.id, "Transaction rolled back");
        Ok(())
    }

    fn dispose(&mut self) -> AdapterResult<()> {
        if self.status == Status::Disposed {
            return Err(AdapterError::TransactionInactive(format!(
                "{} already disposed",
                self.id
            )));
        }
        if self.discard_workspace() {
            debug!(target: "rowgate::memory", txn = %self.id, "Uncommitted workspace discarded");
        }
        self.status = Status::Disposed;
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if self.status != Status::Disposed && self.discard_workspace() {
            warn!(target: "rowgate::memory", txn = %self.id, "Transaction dropped without dispose");
        }
    }
}
