//! In-memory tables
//!
//! A [`Table`] is a vector of rows plus a [`TableSpec`] naming its key
//! fields. Tables without key fields accept any row; keyed tables reject a
//! second row with the same key.
//!
//! Every mutating statement validates key uniqueness before it touches the
//! stored rows, so a failed statement leaves the table unchanged.

use std::collections::BTreeMap;

use rowgate_core::{AdapterError, AdapterResult, Criteria, Row, Value};
use serde::{Deserialize, Serialize};

use crate::eval::matches;

/// All tables of one database image, keyed by target name
pub type Tables = BTreeMap<String, Table>;

/// Key declaration for a table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Fields whose combined values must be unique, in positional `get` order
    pub key_fields: Vec<String>,
    /// Key field filled with the next integer when an inserted row lacks it
    pub auto_increment: Option<String>,
}

impl TableSpec {
    /// Table keyed on the given fields
    pub fn keyed<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            key_fields: fields.into_iter().map(Into::into).collect(),
            auto_increment: None,
        }
    }

    /// Table keyed on a single auto-increment integer field
    pub fn auto_increment(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            key_fields: vec![field.clone()],
            auto_increment: Some(field),
        }
    }
}

/// Rows of one target
#[derive(Debug, Clone)]
pub struct Table {
    spec: TableSpec,
    rows: Vec<Row>,
    next_auto: i64,
}

impl Default for Table {
    fn default() -> Self {
        Self::with_spec(TableSpec::default())
    }
}

impl Table {
    /// Empty table with the given spec
    pub fn with_spec(spec: TableSpec) -> Self {
        Self {
            spec,
            rows: Vec::new(),
            next_auto: 1,
        }
    }

    /// Key declaration
    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    /// Replace the key declaration; existing rows are kept as they are
    pub fn set_spec(&mut self, spec: TableSpec) {
        self.spec = spec;
    }

    /// Number of stored rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Remove every row, returning how many were removed
    pub fn truncate(&mut self) -> usize {
        let removed = self.rows.len();
        self.rows.clear();
        removed
    }

    /// Copies of the rows matching `criteria`, in insertion order
    pub fn find(&self, criteria: &Criteria) -> Vec<Row> {
        self.rows
            .iter()
            .filter(|row| matches(criteria, row))
            .cloned()
            .collect()
    }

    /// Insert one row.
    ///
    /// Returns the stored row (with any generated key) when
    /// `result_required`, otherwise the row as given.
    pub fn insert(&mut self, target: &str, row: Row, result_required: bool) -> AdapterResult<Row> {
        let mut stored = row.clone();
        let mut generated = None;
        if let Some(field) = &self.spec.auto_increment {
            match stored.get(field) {
                None | Some(Value::Null) => {
                    generated = Some(self.next_auto);
                    stored.insert(field.clone(), self.next_auto);
                }
                Some(Value::Int(explicit)) => {
                    if *explicit >= self.next_auto {
                        generated = Some(*explicit);
                    }
                }
                Some(other) => {
                    return Err(AdapterError::InvalidInput(format!(
                        "auto-increment field '{}' in '{}' must be Int, got {}",
                        field,
                        target,
                        other.type_name()
                    )))
                }
            }
        }

        if !self.spec.key_fields.is_empty() {
            let key = self.key_of(target, &stored)?;
            if self.rows.iter().any(|existing| self.same_key(existing, &key)) {
                return Err(AdapterError::ConstraintViolation(format!(
                    "duplicate key {} in '{}'",
                    key, target
                )));
            }
        }

        if let Some(last) = generated {
            self.next_auto = last + 1;
        }
        self.rows.push(stored.clone());
        Ok(if result_required { stored } else { row })
    }

    /// Apply `changes` to every row matching `criteria`
    pub fn update(&mut self, target: &str, changes: &Row, criteria: &Criteria) -> AdapterResult<u64> {
        let mut candidate = self.rows.clone();
        let mut affected = 0u64;
        for row in candidate.iter_mut().filter(|row| matches(criteria, row)) {
            row.merge_from(changes);
            affected += 1;
        }
        if affected > 0 && self.touches_key(changes) {
            self.check_unique(target, &candidate)?;
        }
        self.rows = candidate;
        Ok(affected)
    }

    /// Update matches, or insert when nothing matches
    pub fn upsert(
        &mut self,
        target: &str,
        row: Row,
        criteria: &Criteria,
        result_required: bool,
    ) -> AdapterResult<Row> {
        let first_match = self.rows.iter().position(|r| matches(criteria, r));
        match first_match {
            None => self.insert(target, row, result_required),
            Some(index) => {
                self.update(target, &row, criteria)?;
                Ok(if result_required {
                    self.rows[index].clone()
                } else {
                    row
                })
            }
        }
    }

    /// Delete rows matching `criteria`
    pub fn delete(&mut self, criteria: &Criteria) -> u64 {
        let before = self.rows.len();
        self.rows.retain(|row| !matches(criteria, row));
        (before - self.rows.len()) as u64
    }

    /// Look up one row by positional key values
    pub fn get(&self, target: &str, keys: &[Value]) -> AdapterResult<Option<Row>> {
        if self.spec.key_fields.is_empty() {
            return Err(AdapterError::InvalidInput(format!(
                "'{}' has no key fields",
                target
            )));
        }
        if keys.len() != self.spec.key_fields.len() {
            return Err(AdapterError::InvalidInput(format!(
                "'{}' is keyed on {} field(s), got {} key value(s)",
                target,
                self.spec.key_fields.len(),
                keys.len()
            )));
        }
        let criteria = self
            .spec
            .key_fields
            .iter()
            .zip(keys)
            .fold(Criteria::All, |acc, (field, value)| {
                acc.and(Criteria::eq(field.clone(), value.clone()))
            });
        Ok(self.rows.iter().find(|row| matches(&criteria, row)).cloned())
    }

    /// Identity criteria for `row` built from `fields`, or the table key
    pub fn identity(&self, target: &str, row: &Row, fields: Option<&[String]>) -> AdapterResult<Criteria> {
        let fields = match fields {
            Some(fields) => fields,
            None if !self.spec.key_fields.is_empty() => self.spec.key_fields.as_slice(),
            None => {
                return Err(AdapterError::InvalidInput(format!(
                    "'{}' has no key fields and no identity fields were given",
                    target
                )))
            }
        };
        let projected = row.project(fields).map_err(|missing| {
            AdapterError::InvalidInput(format!(
                "row for '{}' lacks identity field '{}'",
                target, missing
            ))
        })?;
        Ok(Criteria::fields_equal(&projected))
    }

    fn key_of(&self, target: &str, row: &Row) -> AdapterResult<Row> {
        row.project(&self.spec.key_fields).map_err(|missing| {
            AdapterError::InvalidInput(format!(
                "row for '{}' lacks key field '{}'",
                target, missing
            ))
        })
    }

    fn same_key(&self, row: &Row, key: &Row) -> bool {
        key.iter().all(|(field, value)| row.get(field) == Some(value))
    }

    fn touches_key(&self, changes: &Row) -> bool {
        self.spec
            .key_fields
            .iter()
            .any(|field| changes.contains_field(field))
    }

    fn check_unique(&self, target: &str, rows: &[Row]) -> AdapterResult<()> {
        for (i, row) in rows.iter().enumerate() {
            let key = self.key_of(target, row)?;
            if rows[i + 1..].iter().any(|other| self.same_key(other, &key)) {
                return Err(AdapterError::ConstraintViolation(format!(
                    "duplicate key {} in '{}'",
                    key, target
                )));
            }
        }
        Ok(())
    }
}
