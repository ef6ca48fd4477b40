//! Mediator entry point
//!
//! The [`Mediator`] holds the adapter and configuration and hands out
//! execution contexts: [`AmbientContext`] for transaction-less work and
//! [`TransactionScope`] for transactional work.
//!
//! # Memory Ordering
//!
//! The transaction counters use `Relaxed` ordering. They are observational
//! only and synchronize nothing else.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rowgate_core::{Result, ScopeState, StorageAdapter};
use tracing::{debug, warn};

use crate::ambient::AmbientContext;
use crate::config::MediatorConfig;
use crate::scope::{ScopeOptions, TransactionScope};

/// Snapshot of a mediator's transaction counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediatorStats {
    /// Scopes successfully begun
    pub started: u64,
    /// Scopes committed
    pub committed: u64,
    /// Scopes rolled back explicitly
    pub rolled_back: u64,
    /// Scopes begun and not yet committed, rolled back or released
    pub active: u64,
}

#[derive(Debug, Default)]
pub(crate) struct TxnCounters {
    started: AtomicU64,
    committed: AtomicU64,
    rolled_back: AtomicU64,
    active: AtomicU64,
}

impl TxnCounters {
    pub(crate) fn record_begin(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::Relaxed);
    }

    /// A scope left `Begun` for `next`
    pub(crate) fn record_end(&self, next: ScopeState) {
        match next {
            ScopeState::Committed => {
                self.committed.fetch_add(1, Ordering::Relaxed);
            }
            ScopeState::RolledBack => {
                self.rolled_back.fetch_add(1, Ordering::Relaxed);
            }
            ScopeState::Begun | ScopeState::Disposed => {}
        }
        self.active.fetch_sub(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MediatorStats {
        MediatorStats {
            started: self.started.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            rolled_back: self.rolled_back.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Relaxed),
        }
    }
}

/// Hands out execution contexts over one storage adapter
pub struct Mediator {
    adapter: Arc<dyn StorageAdapter>,
    config: MediatorConfig,
    counters: Arc<TxnCounters>,
    name_seq: AtomicU64,
}

impl Mediator {
    /// Mediator with the default configuration
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        Self::with_config(adapter, MediatorConfig::default())
    }

    /// Mediator with an explicit configuration
    pub fn with_config(adapter: Arc<dyn StorageAdapter>, config: MediatorConfig) -> Self {
        debug!(
            target: "rowgate::txn",
            adapter = adapter.name(),
            transactional = adapter.as_transactional().is_some(),
            "Mediator created"
        );
        Self {
            adapter,
            config,
            counters: Arc::new(TxnCounters::default()),
            name_seq: AtomicU64::new(0),
        }
    }

    /// Mediator owning a concrete adapter
    pub fn from_adapter<A>(adapter: A) -> Self
    where
        A: StorageAdapter + 'static,
    {
        Self::new(Arc::new(adapter))
    }

    /// The adapter every context delegates to
    pub fn adapter(&self) -> &Arc<dyn StorageAdapter> {
        &self.adapter
    }

    /// Active configuration
    pub fn config(&self) -> &MediatorConfig {
        &self.config
    }

    /// Whether [`begin`](Self::begin) can succeed at all
    pub fn supports_transactions(&self) -> bool {
        self.adapter.as_transactional().is_some()
    }

    /// Context for transaction-less operations
    pub fn ambient(&self) -> AmbientContext {
        AmbientContext::new(self.adapter.clone()).with_tracing(self.config.trace_operations)
    }

    /// Begin a transaction.
    ///
    /// The transaction is unnamed unless `transaction_name_prefix` is
    /// configured, in which case it is named `"{prefix}-{n}"`.
    pub fn begin(&self) -> Result<TransactionScope> {
        let name = self.config.transaction_name_prefix.as_ref().map(|prefix| {
            let n = self.name_seq.fetch_add(1, Ordering::Relaxed) + 1;
            format!("{}-{}", prefix, n)
        });
        self.open(name)
    }

    /// Begin a named transaction
    pub fn begin_named(&self, name: impl Into<String>) -> Result<TransactionScope> {
        self.open(Some(name.into()))
    }

    /// Run `f` inside a transaction.
    ///
    /// Commits when `f` returns `Ok` and the scope is still begun. When `f`
    /// fails, rolls back (if `rollback_on_error`) and returns `f`'s error; a
    /// rollback failure at that point is only logged. The scope is released
    /// in every case.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TransactionScope) -> Result<T>,
    {
        let mut scope = self.begin()?;
        match f(&mut scope) {
            Ok(value) => {
                if scope.is_active() {
                    scope.commit()?;
                }
                scope.dispose();
                Ok(value)
            }
            Err(err) => {
                if self.config.rollback_on_error && scope.is_active() {
                    if let Err(rollback_err) = scope.rollback() {
                        warn!(
                            target: "rowgate::txn",
                            txn = %scope.id(),
                            error = %rollback_err,
                            "Rollback after failed transaction body also failed"
                        );
                    }
                }
                scope.dispose();
                Err(err)
            }
        }
    }

    /// Current transaction counters
    pub fn stats(&self) -> MediatorStats {
        self.counters.snapshot()
    }

    fn open(&self, name: Option<String>) -> Result<TransactionScope> {
        let options = ScopeOptions {
            trace: self.config.trace_operations,
            counters: Some(self.counters.clone()),
        };
        TransactionScope::open(self.adapter.clone(), name, options)
    }
}

impl std::fmt::Debug for Mediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mediator")
            .field("adapter", &self.adapter.name())
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}
