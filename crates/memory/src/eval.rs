//! Criteria evaluation against in-memory rows
//!
//! ## Comparison Rules
//!
//! - `Eq(field, Null)` matches a null or missing field
//! - Ordering comparisons only hold between values of the same type
//!   (`Int(1) < Float(2.0)` is false, not true)
//! - A missing field fails every comparison except `IsNull`, `Ne` and
//!   `Eq(field, Null)`

use std::cmp::Ordering;

use rowgate_core::{Criteria, Row, Value};

/// Whether `row` satisfies `criteria`
pub fn matches(criteria: &Criteria, row: &Row) -> bool {
    match criteria {
        Criteria::All => true,
        Criteria::Eq { field, value } => field_equals(row, field, value),
        Criteria::Ne { field, value } => !field_equals(row, field, value),
        Criteria::Lt { field, value } => {
            compare(row, field, value).is_some_and(|o| o == Ordering::Less)
        }
        Criteria::Le { field, value } => {
            compare(row, field, value).is_some_and(|o| o != Ordering::Greater)
        }
        Criteria::Gt { field, value } => {
            compare(row, field, value).is_some_and(|o| o == Ordering::Greater)
        }
        Criteria::Ge { field, value } => {
            compare(row, field, value).is_some_and(|o| o != Ordering::Less)
        }
        Criteria::In { field, values } => values.iter().any(|v| field_equals(row, field, v)),
        Criteria::IsNull(field) => row.get(field).map_or(true, Value::is_null),
        Criteria::And(children) => children.iter().all(|c| matches(c, row)),
        Criteria::Or(children) => children.iter().any(|c| matches(c, row)),
        Criteria::Not(child) => !matches(child, row),
    }
}

fn field_equals(row: &Row, field: &str, expected: &Value) -> bool {
    match row.get(field) {
        Some(actual) => actual == expected,
        None => expected.is_null(),
    }
}

fn compare(row: &Row, field: &str, bound: &Value) -> Option<Ordering> {
    row.get(field)?.partial_cmp_same_type(bound)
}
