//! Call-recording fake adapter shared by the executor tests.
//!
//! Rows carrying a `fail` field are rejected by every write path, which is
//! how tests inject per-row failures.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use rowgate_core::{
    isolate_rows, AdapterError, AdapterErrorSink, AdapterResult, Criteria, FunctionCall,
    FunctionOutcome, Row, RowStream, StorageAdapter, TransactionHandle, TransactionalAdapter,
    TxnId, Value,
};

/// One adapter-side call, with the transaction it ran under
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Begin { name: Option<String> },
    Find { target: String, txn: Option<TxnId> },
    Insert { target: String, row: Row, txn: Option<TxnId> },
    InsertMany { target: String, txn: Option<TxnId> },
    Update { target: String, row: Row, criteria: Criteria, txn: Option<TxnId> },
    UpdateMany { target: String, rows: usize, txn: Option<TxnId> },
    Upsert { target: String, row: Row, txn: Option<TxnId> },
    UpsertMany { target: String, key_fields: Option<Vec<String>>, txn: Option<TxnId> },
    Delete { target: String, txn: Option<TxnId> },
    Get { target: String, txn: Option<TxnId> },
    Function { name: String, txn: Option<TxnId> },
    Commit(TxnId),
    Rollback(TxnId),
    Dispose(TxnId),
}

type CallLog = Arc<Mutex<Vec<Call>>>;

pub struct RecordingAdapter {
    log: CallLog,
    rows: Vec<Row>,
    transactional: bool,
    fail_dispose: bool,
    fail_update_at: Option<usize>,
    updates_seen: AtomicU64,
    next_txn: AtomicU64,
}

impl RecordingAdapter {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            rows: Vec::new(),
            transactional: true,
            fail_dispose: false,
            fail_update_at: None,
            updates_seen: AtomicU64::new(0),
            next_txn: AtomicU64::new(0),
        }
    }

    pub fn non_transactional() -> Self {
        Self {
            transactional: false,
            ..Self::new()
        }
    }

    /// `find` returns these rows regardless of criteria
    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    /// Every handle's `dispose` fails
    pub fn failing_dispose(mut self) -> Self {
        self.fail_dispose = true;
        self
    }

    /// The `n`th `update` call (0-based) fails
    pub fn failing_update_at(mut self, n: usize) -> Self {
        self.fail_update_at = Some(n);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.log.lock().unwrap().iter().filter(|c| pred(*c)).count()
    }

    fn record(&self, call: Call) {
        self.log.lock().unwrap().push(call);
    }
}

fn id_of(txn: Option<&dyn TransactionHandle>) -> Option<TxnId> {
    txn.map(|t| t.id())
}

fn check_row(row: Row) -> Result<Row, (Row, AdapterError)> {
    if row.contains_field("fail") {
        Err((row, AdapterError::ConstraintViolation("row marked to fail".into())))
    } else {
        Ok(row)
    }
}

impl StorageAdapter for RecordingAdapter {
    fn name(&self) -> &str {
        "recording"
    }

    fn find<'a>(
        &'a self,
        target: &str,
        _criteria: &Criteria,
        txn: Option<&'a dyn TransactionHandle>,
    ) -> AdapterResult<RowStream<'a>> {
        self.record(Call::Find { target: target.into(), txn: id_of(txn) });
        Ok(Box::new(self.rows.iter().cloned()))
    }

    fn insert(
        &self,
        target: &str,
        row: Row,
        txn: Option<&dyn TransactionHandle>,
        _result_required: bool,
    ) -> AdapterResult<Row> {
        self.record(Call::Insert { target: target.into(), row: row.clone(), txn: id_of(txn) });
        check_row(row).map_err(|(_, e)| e)
    }

    fn insert_many<'a>(
        &'a self,
        target: &str,
        rows: RowStream<'a>,
        txn: Option<&'a dyn TransactionHandle>,
        on_error: AdapterErrorSink<'a>,
        _result_required: bool,
    ) -> AdapterResult<RowStream<'a>> {
        self.record(Call::InsertMany { target: target.into(), txn: id_of(txn) });
        Ok(isolate_rows(rows, on_error, check_row))
    }

    fn update(
        &self,
        target: &str,
        row: Row,
        criteria: &Criteria,
        txn: Option<&dyn TransactionHandle>,
    ) -> AdapterResult<u64> {
        self.record(Call::Update {
            target: target.into(),
            row,
            criteria: criteria.clone(),
            txn: id_of(txn),
        });
        let n = self.updates_seen.fetch_add(1, Ordering::SeqCst) as usize;
        if self.fail_update_at == Some(n) {
            return Err(AdapterError::ConstraintViolation(format!("update #{} rejected", n)));
        }
        Ok(1)
    }

    fn update_many(
        &self,
        target: &str,
        rows: Vec<Row>,
        _criteria_fields: Option<&[String]>,
        txn: Option<&dyn TransactionHandle>,
    ) -> AdapterResult<u64> {
        self.record(Call::UpdateMany { target: target.into(), rows: rows.len(), txn: id_of(txn) });
        Ok(rows.len() as u64)
    }

    fn upsert(
        &self,
        target: &str,
        row: Row,
        _criteria: &Criteria,
        _result_required: bool,
        txn: Option<&dyn TransactionHandle>,
    ) -> AdapterResult<Row> {
        self.record(Call::Upsert { target: target.into(), row: row.clone(), txn: id_of(txn) });
        check_row(row).map_err(|(_, e)| e)
    }

    fn upsert_many<'a>(
        &'a self,
        target: &str,
        rows: RowStream<'a>,
        key_fields: Option<Vec<String>>,
        txn: Option<&'a dyn TransactionHandle>,
        _result_required: bool,
        on_error: AdapterErrorSink<'a>,
    ) -> AdapterResult<RowStream<'a>> {
        self.record(Call::UpsertMany { target: target.into(), key_fields, txn: id_of(txn) });
        Ok(isolate_rows(rows, on_error, check_row))
    }

    fn delete(
        &self,
        target: &str,
        _criteria: &Criteria,
        txn: Option<&dyn TransactionHandle>,
    ) -> AdapterResult<u64> {
        self.record(Call::Delete { target: target.into(), txn: id_of(txn) });
        Ok(0)
    }

    fn get(
        &self,
        target: &str,
        txn: Option<&dyn TransactionHandle>,
        _keys: &[Value],
    ) -> AdapterResult<Option<Row>> {
        self.record(Call::Get { target: target.into(), txn: id_of(txn) });
        Err(AdapterError::Unsupported("get by key".into()))
    }

    fn execute_function(
        &self,
        call: &FunctionCall,
        txn: Option<&dyn TransactionHandle>,
    ) -> AdapterResult<FunctionOutcome> {
        self.record(Call::Function { name: call.name.clone(), txn: id_of(txn) });
        match call.name.as_str() {
            "echo" => Ok(FunctionOutcome::Completed(
                call.args.first().cloned().unwrap_or(Value::Null),
            )),
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

impl TransactionalAdapter for RecordingAdapter {
    fn begin_transaction(&self, name: Option<&str>) -> AdapterResult<Box<dyn TransactionHandle>> {
        self.record(Call::Begin { name: name.map(str::to_string) });
        let id = TxnId::new(self.next_txn.fetch_add(1, Ordering::SeqCst) + 1);
        Ok(Box::new(RecordingHandle {
            id,
            name: name.map(str::to_string),
            log: self.log.clone(),
            terminated: false,
            fail_dispose: self.fail_dispose,
        }))
    }
}

struct RecordingHandle {
    id: TxnId,
    name: Option<String>,
    log: CallLog,
    terminated: bool,
    fail_dispose: bool,
}

impl RecordingHandle {
    fn terminate(&mut self, call: Call) -> AdapterResult<()> {
        if self.terminated {
            return Err(AdapterError::TransactionInactive(format!("{} already finished", self.id)));
        }
        self.terminated = true;
        self.log.lock().unwrap().push(call);
        Ok(())
    }
}

impl TransactionHandle for RecordingHandle {
    fn id(&self) -> TxnId {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn commit(&mut self) -> AdapterResult<()> {
        self.terminate(Call::Commit(self.id))
    }

    fn rollback(&mut self) -> AdapterResult<()> {
        self.terminate(Call::Rollback(self.id))
    }

    fn dispose(&mut self) -> AdapterResult<()> {
        self.log.lock().unwrap().push(Call::Dispose(self.id));
        if self.fail_dispose {
            return Err(AdapterError::backend(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "connection lost during release",
            )));
        }
        Ok(())
    }
}

/// Shared adapter plus a typed handle for inspecting its log
pub fn shared(adapter: RecordingAdapter) -> (Arc<RecordingAdapter>, Arc<dyn StorageAdapter>) {
    let typed = Arc::new(adapter);
    let erased: Arc<dyn StorageAdapter> = typed.clone();
    (typed, erased)
}

/// Run `f` with a `WARN`-level subscriber installed and return what it logged
pub fn capture_warnings<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_target(true)
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, buffer.contents())
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
