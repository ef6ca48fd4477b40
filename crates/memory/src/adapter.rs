//! [`MemoryAdapter`]: a complete storage adapter over in-memory tables
//!
//! Targets are declared with [`MemoryAdapter::define_table`], or created
//! without key fields by the first insert or upsert. Reads, updates and
//! deletes on an unknown target fail with `TargetNotFound`.
//!
//! ## Semantics
//!
//! - Ambient operations act on the committed tables directly.
//! - Operations with a transaction handle act on that transaction's private
//!   copy. A handle that is no longer active yields `TransactionInactive`.
//! - Commit installs only the tables the transaction wrote to.
//! - An update with an empty change row is a no-op that still reports the
//!   number of matching rows.
//! - `insert_many` / `upsert_many` are lazy: each row is applied when the
//!   returned stream reaches it.
//!
//! Supported functions: `count(target)` and `truncate(target)`.

use std::sync::Arc;

use rowgate_core::{
    isolate_rows, AdapterError, AdapterErrorSink, AdapterResult, Criteria, FunctionCall,
    FunctionOutcome, Row, RowStream, StorageAdapter, TransactionHandle, TransactionalAdapter,
    Value,
};
use tracing::debug;

use crate::table::{Table, TableSpec, Tables};
use crate::transaction::{MemoryTransaction, Shared};

/// In-memory storage adapter
#[derive(Debug, Clone)]
pub struct MemoryAdapter {
    shared: Arc<Shared>,
    transactional: bool,
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAdapter {
    /// Adapter with transaction support
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            transactional: true,
        }
    }

    /// Adapter that reports no transaction capability
    pub fn without_transactions() -> Self {
        Self {
            transactional: false,
            ..Self::new()
        }
    }

    /// Declare (or redeclare) a target
    ///
    /// Redeclaring keeps existing committed rows and replaces the key spec.
    pub fn define_table(&self, name: impl Into<String>, spec: TableSpec) {
        let name = name.into();
        let mut committed = self.shared.committed.write();
        match committed.get_mut(&name) {
            Some(table) => table.set_spec(spec),
            None => {
                debug!(target: "rowgate::memory", table = %name, "Table defined");
                committed.insert(name, Table::with_spec(spec));
            }
        }
    }

    /// Builder form of [`define_table`](Self::define_table)
    pub fn with_table(self, name: impl Into<String>, spec: TableSpec) -> Self {
        self.define_table(name, spec);
        self
    }

    /// Committed row count of a target (0 for an unknown target)
    pub fn committed_len(&self, target: &str) -> usize {
        self.shared
            .committed
            .read()
            .get(target)
            .map_or(0, Table::len)
    }

    /// Number of transactions begun and not yet released
    pub fn open_transactions(&self) -> usize {
        self.shared.open.lock().len()
    }

    /// Run `f` against the table `target` as seen by `txn`
    ///
    /// Inside a transaction, a successful `Write` or `CreateIfMissing` call
    /// marks the table for installation at commit.
    fn with_table_mut<R>(
        &self,
        target: &str,
        txn: Option<&dyn TransactionHandle>,
        access: Access,
        f: impl FnOnce(&mut Table) -> AdapterResult<R>,
    ) -> AdapterResult<R> {
        match txn {
            None => {
                let mut committed = self.shared.committed.write();
                f(lookup(&mut committed, target, access)?)
            }
            Some(handle) => {
                let id = handle.id();
                let mut open = self.shared.open.lock();
                let workspace = open.get_mut(&id).ok_or_else(|| {
                    AdapterError::TransactionInactive(format!("{} is not open", id))
                })?;
                let out = f(lookup(&mut workspace.tables, target, access)?)?;
                if access != Access::Read {
                    workspace.written.insert(target.to_string());
                }
                Ok(out)
            }
        }
    }

    fn read_table<R>(
        &self,
        target: &str,
        txn: Option<&dyn TransactionHandle>,
        f: impl FnOnce(&Table) -> AdapterResult<R>,
    ) -> AdapterResult<R> {
        match txn {
            None => {
                let committed = self.shared.committed.read();
                let table = committed
                    .get(target)
                    .ok_or_else(|| AdapterError::TargetNotFound(target.to_string()))?;
                f(table)
            }
            Some(_) => self.with_table_mut(target, txn, Access::Read, |table| f(table)),
        }
    }

    fn function_target<'c>(call: &'c FunctionCall) -> AdapterResult<&'c str> {
        call.args
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AdapterError::InvalidInput(format!(
                    "{} expects a target name as its first argument",
                    call.name
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
    CreateIfMissing,
}

fn lookup<'t>(tables: &'t mut Tables, target: &str, access: Access) -> AdapterResult<&'t mut Table> {
    if access == Access::CreateIfMissing && !tables.contains_key(target) {
        debug!(target: "rowgate::memory", table = %target, "Table created on first write");
        tables.insert(target.to_string(), Table::with_spec(TableSpec::default()));
    }
    tables
        .get_mut(target)
        .ok_or_else(|| AdapterError::TargetNotFound(target.to_string()))
}

impl StorageAdapter for MemoryAdapter {
    fn name(&self) -> &str {
        "memory"
    }

    fn find<'a>(
        &'a self,
        target: &str,
        criteria: &Criteria,
        txn: Option<&'a dyn TransactionHandle>,
    ) -> AdapterResult<RowStream<'a>> {
        let rows = self.read_table(target, txn, |table| Ok(table.find(criteria)))?;
        Ok(Box::new(rows.into_iter()))
    }

    fn insert(
        &self,
        target: &str,
        row: Row,
        txn: Option<&dyn TransactionHandle>,
        result_required: bool,
    ) -> AdapterResult<Row> {
        self.with_table_mut(target, txn, Access::CreateIfMissing, |table| {
            table.insert(target, row, result_required)
        })
    }

    fn insert_many<'a>(
        &'a self,
        target: &str,
        rows: RowStream<'a>,
        txn: Option<&'a dyn TransactionHandle>,
        on_error: AdapterErrorSink<'a>,
        result_required: bool,
    ) -> AdapterResult<RowStream<'a>> {
        let target = target.to_string();
        Ok(isolate_rows(rows, on_error, move |row| {
            let input = row.clone();
            self.with_table_mut(&target, txn, Access::CreateIfMissing, |table| {
                table.insert(&target, row, result_required)
            })
            .map_err(|cause| (input, cause))
        }))
    }

    fn update(
        &self,
        target: &str,
        row: Row,
        criteria: &Criteria,
        txn: Option<&dyn TransactionHandle>,
    ) -> AdapterResult<u64> {
        self.with_table_mut(target, txn, Access::Write, |table| {
            table.update(target, &row, criteria)
        })
    }

    fn update_many(
        &self,
        target: &str,
        rows: Vec<Row>,
        criteria_fields: Option<&[String]>,
        txn: Option<&dyn TransactionHandle>,
    ) -> AdapterResult<u64> {
        self.with_table_mut(target, txn, Access::Write, |table| {
            // Stage on a copy so a failing row leaves the whole batch unapplied
            let mut staged = table.clone();
            let mut affected = 0;
            for row in &rows {
                let criteria = staged.identity(target, row, criteria_fields)?;
                affected += staged.update(target, row, &criteria)?;
            }
            *table = staged;
            Ok(affected)
        })
    }

    fn upsert(
        &self,
        target: &str,
        row: Row,
        criteria: &Criteria,
        result_required: bool,
        txn: Option<&dyn TransactionHandle>,
    ) -> AdapterResult<Row> {
        self.with_table_mut(target, txn, Access::CreateIfMissing, |table| {
            table.upsert(target, row, criteria, result_required)
        })
    }

    fn upsert_many<'a>(
        &'a self,
        target: &str,
        rows: RowStream<'a>,
        key_fields: Option<Vec<String>>,
        txn: Option<&'a dyn TransactionHandle>,
        result_required: bool,
        on_error: AdapterErrorSink<'a>,
    ) -> AdapterResult<RowStream<'a>> {
        let target = target.to_string();
        Ok(isolate_rows(rows, on_error, move |row| {
            let input = row.clone();
            self.with_table_mut(&target, txn, Access::CreateIfMissing, |table| {
                let criteria = table.identity(&target, &row, key_fields.as_deref())?;
                table.upsert(&target, row, &criteria, result_required)
            })
            .map_err(|cause| (input, cause))
        }))
    }

    fn delete(
        &self,
        target: &str,
        criteria: &Criteria,
        txn: Option<&dyn TransactionHandle>,
    ) -> AdapterResult<u64> {
        self.with_table_mut(target, txn, Access::Write, |table| {
            Ok(table.delete(criteria))
        })
    }

    fn get(
        &self,
        target: &str,
        txn: Option<&dyn TransactionHandle>,
        keys: &[Value],
    ) -> AdapterResult<Option<Row>> {
        self.read_table(target, txn, |table| table.get(target, keys))
    }

    fn execute_function(
        &self,
        call: &FunctionCall,
        txn: Option<&dyn TransactionHandle>,
    ) -> AdapterResult<FunctionOutcome> {
        match call.name.as_str() {
            "count" => {
                let target = Self::function_target(call)?;
                let len = self.read_table(target, txn, |table| Ok(table.len()))?;
                Ok(FunctionOutcome::Completed(Value::Int(len as i64)))
            }
            "truncate" => {
                let target = Self::function_target(call)?;
                let removed =
                    self.with_table_mut(target, txn, Access::Write, |table| Ok(table.truncate()))?;
                Ok(FunctionOutcome::Completed(Value::Int(removed as i64)))
            }
            _ => Ok(FunctionOutcome::Unsupported),
        }
    }

    fn as_transactional(&self) -> Option<&dyn TransactionalAdapter> {
        if self.transactional {
            Some(self)
        } else {
            None
        }
    }
}

impl TransactionalAdapter for MemoryAdapter {
    fn begin_transaction(&self, name: Option<&str>) -> AdapterResult<Box<dyn TransactionHandle>> {
        if !self.transactional {
            return Err(AdapterError::Unsupported("transactions".into()));
        }
        Ok(Box::new(MemoryTransaction::begin(self.shared.clone(), name)))
    }
}
