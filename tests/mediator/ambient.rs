//! Ambient execution against the in-memory adapter.

use crate::common::*;
use rowgate::{AdapterError, FunctionCall, FunctionOutcome, Operation};

#[test]
fn insert_then_get_by_key() {
    let (mediator, _adapter) = mediator();
    let ctx = mediator.ambient();

    let stored = ctx.insert("users", user("Alice", 30), true).unwrap();
    assert_eq!(stored.get("id"), Some(&Value::Int(1)));

    let fetched = ctx.get("users", &[Value::Int(1)]).unwrap();
    assert_eq!(fetched, Some(stored));
}

#[test]
fn find_filters_by_criteria() {
    let (mediator, _adapter) = mediator();
    let ctx = mediator.ambient();
    for (name, age) in [("Alice", 30), ("Bob", 17), ("Carol", 45)] {
        ctx.insert("users", user(name, age), false).unwrap();
    }

    let adults = ctx.find("users", &Criteria::ge("age", 18)).unwrap();
    assert_eq!(names(adults), vec!["Alice", "Carol"]);
}

#[test]
fn find_one_with_no_match_is_none() {
    let (mediator, _adapter) = mediator();
    let ctx = mediator.ambient();
    ctx.insert("users", user("Alice", 30), false).unwrap();

    let missing = ctx.find_one("users", &Criteria::eq("name", "Zed")).unwrap();
    assert!(missing.is_none());
}

#[test]
fn update_upsert_delete() {
    let (mediator, adapter) = mediator();
    let ctx = mediator.ambient();
    ctx.insert("users", user("Alice", 30), false).unwrap();
    ctx.insert("users", user("Bob", 40), false).unwrap();

    let affected = ctx
        .update("users", Row::new().with("age", 31), &Criteria::eq("name", "Alice"))
        .unwrap();
    assert_eq!(affected, 1);

    let upserted = ctx
        .upsert(
            "tags",
            Row::new().with("name", "vip"),
            &Criteria::eq("name", "vip"),
            true,
        )
        .unwrap();
    assert_eq!(upserted.get("name"), Some(&Value::from("vip")));

    let deleted = ctx.delete("users", &Criteria::lt("age", 35)).unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(adapter.committed_len("users"), 1);
}

#[test]
fn update_many_by_named_fields() {
    let (mediator, _adapter) = mediator();
    let ctx = mediator.ambient();
    ctx.insert("users", user("Alice", 30), false).unwrap();
    ctx.insert("users", user("Bob", 40), false).unwrap();

    let fields = vec!["name".to_string()];
    let affected = ctx
        .update_many(
            "users",
            vec![
                Row::new().with("name", "Alice").with("age", 1),
                Row::new().with("name", "Bob").with("age", 2),
            ],
            Some(&fields),
        )
        .unwrap();
    assert_eq!(affected, 2);

    let bob = ctx.find_one("users", &Criteria::eq("name", "Bob")).unwrap().unwrap();
    assert_eq!(bob.get("age"), Some(&Value::Int(2)));
}

#[test]
fn adapter_errors_carry_operation_and_target() {
    let (mediator, _adapter) = mediator();
    let ctx = mediator.ambient();
    ctx.insert("tags", Row::new().with("name", "red"), false).unwrap();

    let err = ctx
        .insert("tags", Row::new().with("name", "red"), false)
        .unwrap_err();
    assert_eq!(err.operation(), Some(Operation::Insert));
    assert!(matches!(
        err.adapter_error(),
        Some(AdapterError::ConstraintViolation(_))
    ));
    assert!(err.to_string().contains("tags"));

    let err = ctx.find("nowhere", &Criteria::All).err().unwrap();
    assert!(matches!(
        err.adapter_error(),
        Some(AdapterError::TargetNotFound(_))
    ));
}

#[test]
fn execute_function_passthrough() {
    let (mediator, _adapter) = mediator();
    let ctx = mediator.ambient();
    ctx.insert("users", user("Alice", 30), false).unwrap();

    let (ok, value) = ctx
        .execute_function(&FunctionCall::new("count").arg("users"))
        .unwrap()
        .into_parts();
    assert!(ok);
    assert_eq!(value, Some(Value::Int(1)));

    let outcome = ctx.execute_function(&FunctionCall::new("explain")).unwrap();
    assert_eq!(outcome, FunctionOutcome::Unsupported);
}
