//! Diff-based update planning
//!
//! Given the row a caller last read (`original`) and the row it wants
//! (`new`), the planner produces:
//!
//! - the changed-field row: every field of `new` whose value differs from
//!   `original` (fields absent from `new` are left alone, never cleared)
//! - the identity criteria: an equality term for every field of `original`,
//!   matched against its original value
//!
//! Both are built as fresh values; the caller's rows are never modified.

use rowgate_core::{Criteria, Error, Result, Row};

/// A resolved diff update, ready to hand to `update`
#[derive(Debug, Clone, PartialEq)]
pub struct DiffUpdate {
    /// Fields to write
    pub changes: Row,
    /// Rows to write them to
    pub criteria: Criteria,
}

impl DiffUpdate {
    /// Whether there is nothing to write
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Fields of `new` whose value differs from `original`.
///
/// A field missing from `original` counts as changed. Comparison is by
/// value, so `Float(NaN)` always counts as changed.
pub fn changed_fields(new: &Row, original: &Row) -> Row {
    new.iter()
        .filter(|(field, value)| original.get(field) != Some(*value))
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect()
}

/// Equality criteria over every field of `original`.
///
/// An empty `original` would match every row in `target`, so it is
/// rejected with [`Error::EmptyIdentity`].
pub fn identity_criteria(target: &str, original: &Row) -> Result<Criteria> {
    if original.is_empty() {
        return Err(Error::EmptyIdentity {
            target: target.to_string(),
        });
    }
    Ok(Criteria::fields_equal(original))
}

/// Build the update for one `(new, original)` pair.
///
/// When nothing changed the plan is a no-op and the identity is not
/// checked, so two empty rows plan an empty update rather than failing.
pub fn plan_update(target: &str, new: &Row, original: &Row) -> Result<DiffUpdate> {
    let changes = changed_fields(new, original);
    let criteria = if changes.is_empty() {
        Criteria::fields_equal(original)
    } else {
        identity_criteria(target, original)?
    };
    Ok(DiffUpdate { changes, criteria })
}
