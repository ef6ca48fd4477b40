//! Storage adapter capability traits
//!
//! The mediator performs no I/O of its own. Every row operation is
//! delegated to a [`StorageAdapter`], with the caller's transaction handle
//! (or `None` for ambient execution) passed alongside. Adapters that can
//! open transactions also implement [`TransactionalAdapter`] and return
//! themselves from [`StorageAdapter::as_transactional`].
//!
//! Thread safety: adapters are shared behind `Arc` and must be
//! `Send + Sync`. A [`TransactionHandle`] is owned by exactly one scope and
//! is only ever used sequentially.

use crate::criteria::Criteria;
use crate::error::{AdapterError, AdapterResult};
use crate::row::Row;
use crate::types::{FunctionCall, FunctionOutcome, TxnId};
use crate::value::Value;

/// Lazily produced sequence of rows
///
/// Dropping the stream early must release whatever the adapter holds for it.
pub type RowStream<'a> = Box<dyn Iterator<Item = Row> + 'a>;

/// Adapter-level per-row failure callback: `(failed input row, cause)`
pub type AdapterErrorSink<'a> = Box<dyn FnMut(Row, AdapterError) + 'a>;

/// An open adapter transaction
///
/// `commit` and `rollback` are terminal: a second terminal call, in either
/// order, must fail. `dispose` releases the underlying resource and is
/// called exactly once by the owning scope, whatever happened before.
pub trait TransactionHandle: Send {
    /// Adapter-assigned identifier
    fn id(&self) -> TxnId;

    /// Name given at begin, if any
    fn name(&self) -> Option<&str>;

    /// Make all writes issued through this handle durable
    fn commit(&mut self) -> AdapterResult<()>;

    /// Discard all writes issued through this handle
    fn rollback(&mut self) -> AdapterResult<()>;

    /// Release the transaction resource
    fn dispose(&mut self) -> AdapterResult<()>;
}

/// Row operations every adapter provides
///
/// Each method takes the target collection name and an optional
/// transaction handle. With `txn = None` the operation runs ambiently.
///
/// ## Error Handling
///
/// | Condition | Error |
/// |-----------|-------|
/// | Capability missing | `Unsupported` |
/// | Uniqueness / constraint failure | `ConstraintViolation` |
/// | Handle already terminated | `TransactionInactive` |
/// | Malformed request | `InvalidInput` |
pub trait StorageAdapter: Send + Sync {
    /// Adapter name, used in log events
    fn name(&self) -> &str;

    /// Rows matching `criteria`; order is adapter-defined
    fn find<'a>(
        &'a self,
        target: &str,
        criteria: &Criteria,
        txn: Option<&'a dyn TransactionHandle>,
    ) -> AdapterResult<RowStream<'a>>;

    /// Insert one row.
    ///
    /// With `result_required = false` the adapter may skip reading back
    /// generated fields and return the input row.
    fn insert(
        &self,
        target: &str,
        row: Row,
        txn: Option<&dyn TransactionHandle>,
        result_required: bool,
    ) -> AdapterResult<Row>;

    /// Insert rows in input order.
    ///
    /// A failing row is passed to `on_error` and omitted from the output;
    /// the remaining rows are still processed.
    fn insert_many<'a>(
        &'a self,
        target: &str,
        rows: RowStream<'a>,
        txn: Option<&'a dyn TransactionHandle>,
        on_error: AdapterErrorSink<'a>,
        result_required: bool,
    ) -> AdapterResult<RowStream<'a>>;

    /// Apply `row`'s fields to every row matching `criteria`.
    ///
    /// Returns the number of rows affected. Whether an empty `row` is a
    /// no-op or an error is for each adapter to document.
    fn update(
        &self,
        target: &str,
        row: Row,
        criteria: &Criteria,
        txn: Option<&dyn TransactionHandle>,
    ) -> AdapterResult<u64>;

    /// Batched update; each row's identity criteria is built from the
    /// named fields, or from the adapter's default key when `None`.
    fn update_many(
        &self,
        target: &str,
        rows: Vec<Row>,
        criteria_fields: Option<&[String]>,
        txn: Option<&dyn TransactionHandle>,
    ) -> AdapterResult<u64>;

    /// Insert if nothing matches `criteria`, else update the matches
    fn upsert(
        &self,
        target: &str,
        row: Row,
        criteria: &Criteria,
        result_required: bool,
        txn: Option<&dyn TransactionHandle>,
    ) -> AdapterResult<Row>;

    /// Per-row upsert with the same isolation contract as `insert_many`.
    ///
    /// Identity comes from `key_fields`, or the adapter default when `None`.
    fn upsert_many<'a>(
        &'a self,
        target: &str,
        rows: RowStream<'a>,
        key_fields: Option<Vec<String>>,
        txn: Option<&'a dyn TransactionHandle>,
        result_required: bool,
        on_error: AdapterErrorSink<'a>,
    ) -> AdapterResult<RowStream<'a>>;

    /// Delete rows matching `criteria`, returning the count
    fn delete(
        &self,
        target: &str,
        criteria: &Criteria,
        txn: Option<&dyn TransactionHandle>,
    ) -> AdapterResult<u64>;

    /// Single-row lookup by positional key values
    fn get(
        &self,
        target: &str,
        txn: Option<&dyn TransactionHandle>,
        keys: &[Value],
    ) -> AdapterResult<Option<Row>>;

    /// Adapter-specific named command
    fn execute_function(
        &self,
        _call: &FunctionCall,
        _txn: Option<&dyn TransactionHandle>,
    ) -> AdapterResult<FunctionOutcome> {
        Ok(FunctionOutcome::Unsupported)
    }

    /// Transaction capability, if this adapter has one
    fn as_transactional(&self) -> Option<&dyn TransactionalAdapter> {
        None
    }
}

/// Adapters that can open transactions
pub trait TransactionalAdapter: StorageAdapter {
    /// Open a transaction, optionally named for diagnostics or savepoints
    fn begin_transaction(&self, name: Option<&str>) -> AdapterResult<Box<dyn TransactionHandle>>;
}

/// Convenience for adapters without a bulk path: run `op` per row in input
/// order, routing failures to `on_error`.
pub fn isolate_rows<'a, F>(
    rows: RowStream<'a>,
    mut on_error: AdapterErrorSink<'a>,
    mut op: F,
) -> RowStream<'a>
where
    F: FnMut(Row) -> Result<Row, (Row, AdapterError)> + 'a,
{
    Box::new(rows.filter_map(move |row| match op(row) {
        Ok(done) => Some(done),
        Err((failed, cause)) => {
            on_error(failed, cause);
            None
        }
    }))
}
