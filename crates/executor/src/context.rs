//! The execution context contract
//!
//! [`ExecutionContext`] is the one operation surface callers use, whether
//! they run ambiently ([`AmbientContext`](crate::AmbientContext)) or inside
//! a [`TransactionScope`](crate::TransactionScope). Implementors supply the
//! adapter and the transaction handle to inject; every row operation is a
//! provided method that forwards to the adapter and attaches operation
//! context to adapter errors.
//!
//! ## Error Handling
//!
//! | Condition | Error |
//! |-----------|-------|
//! | Adapter lacks the capability | `Error::AdapterUnsupported` |
//! | Adapter-native failure | `Error::AdapterExecutionFailed` |
//! | Scope no longer begun | `Error::ScopeClosed` |
//! | Bulk row failure | delivered to the [`RowErrorHandler`], not returned |
//!
//! The trait is object safe: `&dyn ExecutionContext` works for code that
//! should not care which kind of context it was given.

use rowgate_core::{
    Criteria, Error, FunctionCall, FunctionOutcome, Operation, Result, Row, RowErrorHandler,
    RowStream, StorageAdapter, TransactionHandle, Value,
};
use tracing::debug;

use crate::callback::adapt_handler;

/// Uniform row-operation surface over a storage adapter
pub trait ExecutionContext {
    /// Adapter all operations are delegated to
    fn adapter(&self) -> &dyn StorageAdapter;

    /// Handle to inject into adapter calls: `None` for ambient execution.
    ///
    /// Fails with [`Error::ScopeClosed`] when the context can no longer
    /// issue row operations.
    fn transaction(&self) -> Result<Option<&dyn TransactionHandle>>;

    /// Whether each delegated call emits a `debug!` event
    fn trace_operations(&self) -> bool {
        false
    }

    /// Rows matching `criteria`, produced lazily by the adapter
    fn find<'a>(&'a self, target: &str, criteria: &Criteria) -> Result<RowStream<'a>> {
        let txn = self.transaction()?;
        trace_call(self.trace_operations(), Operation::Find, target, txn);
        self.adapter()
            .find(target, criteria, txn)
            .map_err(|e| Error::from_adapter(Operation::Find, target, e))
    }

    /// First row matching `criteria`; `None` when nothing matches
    fn find_one(&self, target: &str, criteria: &Criteria) -> Result<Option<Row>> {
        Ok(self.find(target, criteria)?.next())
    }

    /// Insert one row.
    ///
    /// With `result_required = false` the adapter may skip reading back
    /// generated fields.
    fn insert(&self, target: &str, row: Row, result_required: bool) -> Result<Row> {
        let txn = self.transaction()?;
        trace_call(self.trace_operations(), Operation::Insert, target, txn);
        self.adapter()
            .insert(target, row, txn, result_required)
            .map_err(|e| Error::from_adapter(Operation::Insert, target, e))
    }

    /// Insert rows in order, isolating per-row failures.
    ///
    /// Each failing row goes to `on_error` and is left out of the returned
    /// stream; the remaining rows are still processed. The stream borrows
    /// `on_error` until it is dropped.
    fn insert_many<'a>(
        &'a self,
        target: &str,
        rows: Vec<Row>,
        on_error: &'a mut dyn RowErrorHandler,
        result_required: bool,
    ) -> Result<RowStream<'a>> {
        let txn = self.transaction()?;
        trace_call(self.trace_operations(), Operation::InsertMany, target, txn);
        let sink = adapt_handler(target, Operation::InsertMany, on_error);
        self.adapter()
            .insert_many(target, Box::new(rows.into_iter()), txn, sink, result_required)
            .map_err(|e| Error::from_adapter(Operation::InsertMany, target, e))
    }

    /// Apply `row`'s fields to every row matching `criteria`
    fn update(&self, target: &str, row: Row, criteria: &Criteria) -> Result<u64> {
        let txn = self.transaction()?;
        trace_call(self.trace_operations(), Operation::Update, target, txn);
        self.adapter()
            .update(target, row, criteria, txn)
            .map_err(|e| Error::from_adapter(Operation::Update, target, e))
    }

    /// Batched update; each row's identity comes from `criteria_fields`
    /// (or the adapter's default key when `None`)
    fn update_many(
        &self,
        target: &str,
        rows: Vec<Row>,
        criteria_fields: Option<&[String]>,
    ) -> Result<u64> {
        let txn = self.transaction()?;
        trace_call(self.trace_operations(), Operation::UpdateMany, target, txn);
        self.adapter()
            .update_many(target, rows, criteria_fields, txn)
            .map_err(|e| Error::from_adapter(Operation::UpdateMany, target, e))
    }

    /// Insert if nothing matches `criteria`, else update the matches
    fn upsert(
        &self,
        target: &str,
        row: Row,
        criteria: &Criteria,
        result_required: bool,
    ) -> Result<Row> {
        let txn = self.transaction()?;
        trace_call(self.trace_operations(), Operation::Upsert, target, txn);
        self.adapter()
            .upsert(target, row, criteria, result_required, txn)
            .map_err(|e| Error::from_adapter(Operation::Upsert, target, e))
    }

    /// Per-row upsert with the same isolation contract as
    /// [`insert_many`](Self::insert_many)
    fn upsert_many<'a>(
        &'a self,
        target: &str,
        rows: Vec<Row>,
        key_fields: Option<Vec<String>>,
        result_required: bool,
        on_error: &'a mut dyn RowErrorHandler,
    ) -> Result<RowStream<'a>> {
        let txn = self.transaction()?;
        trace_call(self.trace_operations(), Operation::UpsertMany, target, txn);
        let sink = adapt_handler(target, Operation::UpsertMany, on_error);
        self.adapter()
            .upsert_many(
                target,
                Box::new(rows.into_iter()),
                key_fields,
                txn,
                result_required,
                sink,
            )
            .map_err(|e| Error::from_adapter(Operation::UpsertMany, target, e))
    }

    /// Delete rows matching `criteria`
    fn delete(&self, target: &str, criteria: &Criteria) -> Result<u64> {
        let txn = self.transaction()?;
        trace_call(self.trace_operations(), Operation::Delete, target, txn);
        self.adapter()
            .delete(target, criteria, txn)
            .map_err(|e| Error::from_adapter(Operation::Delete, target, e))
    }

    /// Single-row lookup by positional key values
    fn get(&self, target: &str, keys: &[Value]) -> Result<Option<Row>> {
        let txn = self.transaction()?;
        trace_call(self.trace_operations(), Operation::Get, target, txn);
        self.adapter()
            .get(target, txn, keys)
            .map_err(|e| Error::from_adapter(Operation::Get, target, e))
    }

    /// Run an adapter-specific command.
    ///
    /// An unknown command is not an error: it yields
    /// [`FunctionOutcome::Unsupported`].
    fn execute_function(&self, call: &FunctionCall) -> Result<FunctionOutcome> {
        let txn = self.transaction()?;
        trace_call(self.trace_operations(), Operation::ExecuteFunction, &call.name, txn);
        self.adapter()
            .execute_function(call, txn)
            .map_err(|e| Error::from_adapter(Operation::ExecuteFunction, &call.name, e))
    }
}

fn trace_call(enabled: bool, operation: Operation, target: &str, txn: Option<&dyn TransactionHandle>) {
    if !enabled {
        return;
    }
    match txn {
        Some(handle) => debug!(
            target: "rowgate::exec",
            operation = %operation,
            collection = %target,
            txn = %handle.id(),
            "Delegating to adapter"
        ),
        None => debug!(
            target: "rowgate::exec",
            operation = %operation,
            collection = %target,
            "Delegating to adapter (ambient)"
        ),
    }
}
