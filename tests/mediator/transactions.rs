//! Transaction scopes over the in-memory adapter.

use crate::common::*;
use rowgate::{AdapterError, ScopeState, TransactionScope};
use std::sync::Arc;

#[test]
fn committed_writes_become_visible() {
    let (mediator, adapter) = mediator();

    let mut scope = mediator.begin().unwrap();
    scope.insert("users", user("Alice", 30), false).unwrap();
    assert_eq!(adapter.committed_len("users"), 0);

    scope.commit().unwrap();
    scope.dispose();
    assert_eq!(adapter.committed_len("users"), 1);
    assert_eq!(adapter.open_transactions(), 0);
}

#[test]
fn scope_reads_its_own_writes() {
    let (mediator, _adapter) = mediator();
    let scope = mediator.begin().unwrap();
    scope.insert("users", user("Alice", 30), false).unwrap();

    let inside = scope.find_one("users", &Criteria::eq("name", "Alice")).unwrap();
    assert!(inside.is_some());
    let outside = mediator
        .ambient()
        .find_one("users", &Criteria::eq("name", "Alice"))
        .unwrap();
    assert!(outside.is_none());
}

#[test]
fn rollback_discards_writes() {
    let (mediator, adapter) = mediator();

    let mut scope = mediator.begin().unwrap();
    scope.insert("users", user("Alice", 30), false).unwrap();
    scope.rollback().unwrap();
    drop(scope);

    assert_eq!(adapter.committed_len("users"), 0);
    assert_eq!(mediator.stats().rolled_back, 1);
}

#[test]
fn dropping_an_uncommitted_scope_discards_writes() {
    let (mediator, adapter) = mediator();
    {
        let scope = mediator.begin_named("abandoned").unwrap();
        assert_eq!(scope.name(), Some("abandoned"));
        scope.insert("users", user("Ghost", 0), false).unwrap();
    }
    assert_eq!(adapter.committed_len("users"), 0);
    assert_eq!(adapter.open_transactions(), 0);
}

#[test]
fn second_terminal_call_fails() {
    let (mediator, _adapter) = mediator();
    let mut scope = mediator.begin().unwrap();

    scope.commit().unwrap();
    let err = scope.commit().unwrap_err();
    assert!(matches!(
        err.adapter_error(),
        Some(AdapterError::TransactionInactive(_))
    ));
    assert!(scope.rollback().is_err());
    assert_eq!(scope.state(), ScopeState::Committed);
}

#[test]
fn row_operations_after_commit_are_rejected() {
    let (mediator, _adapter) = mediator();
    let mut scope = mediator.begin().unwrap();
    scope.commit().unwrap();

    let err = scope.insert("users", user("Late", 1), false).unwrap_err();
    assert!(matches!(err, Error::ScopeClosed { .. }));
}

#[test]
fn begin_on_non_transactional_adapter() {
    let adapter = MemoryAdapter::without_transactions().with_table("users", TableSpec::default());
    let erased: Arc<dyn StorageAdapter> = Arc::new(adapter);

    let err = TransactionScope::begin(erased.clone()).unwrap_err();
    assert!(err.is_unsupported());

    let mediator = Mediator::new(erased);
    assert!(!mediator.supports_transactions());
    assert!(mediator.transaction(|_| Ok(())).unwrap_err().is_unsupported());

    // Ambient execution still works
    mediator.ambient().insert("users", Row::new(), false).unwrap();
}

#[test]
fn transaction_helper_commits_or_rolls_back() {
    let (mediator, adapter) = mediator();

    mediator
        .transaction(|scope| {
            scope.insert("users", user("Alice", 30), false)?;
            scope.insert("users", user("Bob", 40), false)?;
            Ok(())
        })
        .unwrap();
    assert_eq!(adapter.committed_len("users"), 2);

    let result = mediator.transaction(|scope| {
        scope.insert("tags", Row::new().with("name", "a"), false)?;
        scope.insert("tags", Row::new().with("name", "a"), false)
    });
    assert!(result.is_err());
    assert_eq!(adapter.committed_len("tags"), 0);

    let stats = mediator.stats();
    assert_eq!(stats.started, 2);
    assert_eq!(stats.committed, 1);
    assert_eq!(stats.rolled_back, 1);
    assert_eq!(stats.active, 0);
}

#[test]
fn last_committer_wins() {
    let (mediator, adapter) = mediator();

    let mut first = mediator.begin().unwrap();
    let mut second = mediator.begin().unwrap();
    first.insert("users", user("First", 1), false).unwrap();
    second.insert("users", user("Second", 2), false).unwrap();

    first.commit().unwrap();
    second.commit().unwrap();

    let ambient = mediator.ambient();
    let all = ambient.find("users", &Criteria::All).unwrap();
    assert_eq!(names(all), vec!["Second"]);
    assert_eq!(adapter.committed_len("users"), 1);
}
