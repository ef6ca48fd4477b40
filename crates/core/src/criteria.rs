//! Criteria expressions
//!
//! A [`Criteria`] is a side-effect-free predicate tree over row fields.
//! The mediator treats it as opaque: it only ever builds [`Criteria::All`]
//! and the field-equality conjunction returned by [`Criteria::fields_equal`].
//! Evaluation belongs to the storage adapter.

use serde::{Deserialize, Serialize};

use crate::row::Row;
use crate::value::Value;

/// Predicate tree used by find, update, upsert and delete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Criteria {
    /// Matches every row
    All,
    /// `field == value`
    Eq {
        /// Field name
        field: String,
        /// Expected value
        value: Value,
    },
    /// `field != value`
    Ne {
        /// Field name
        field: String,
        /// Rejected value
        value: Value,
    },
    /// `field < value`
    Lt {
        /// Field name
        field: String,
        /// Upper bound (exclusive)
        value: Value,
    },
    /// `field <= value`
    Le {
        /// Field name
        field: String,
        /// Upper bound (inclusive)
        value: Value,
    },
    /// `field > value`
    Gt {
        /// Field name
        field: String,
        /// Lower bound (exclusive)
        value: Value,
    },
    /// `field >= value`
    Ge {
        /// Field name
        field: String,
        /// Lower bound (inclusive)
        value: Value,
    },
    /// `field` equals one of `values`
    In {
        /// Field name
        field: String,
        /// Accepted values
        values: Vec<Value>,
    },
    /// `field` is null or missing
    IsNull(String),
    /// Every child matches (an empty conjunction matches every row)
    And(Vec<Criteria>),
    /// At least one child matches
    Or(Vec<Criteria>),
    /// Child does not match
    Not(Box<Criteria>),
}

impl Criteria {
    /// `field == value`
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Criteria::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// `field != value`
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Criteria::Ne {
            field: field.into(),
            value: value.into(),
        }
    }

    /// `field < value`
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Criteria::Lt {
            field: field.into(),
            value: value.into(),
        }
    }

    /// `field <= value`
    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Criteria::Le {
            field: field.into(),
            value: value.into(),
        }
    }

    /// `field > value`
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Criteria::Gt {
            field: field.into(),
            value: value.into(),
        }
    }

    /// `field >= value`
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Criteria::Ge {
            field: field.into(),
            value: value.into(),
        }
    }

    /// `field IN (values...)`
    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Criteria::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `field IS NULL`
    pub fn is_null(field: impl Into<String>) -> Self {
        Criteria::IsNull(field.into())
    }

    /// Conjunction of `self` and `other`, flattening nested `And`s
    pub fn and(self, other: Criteria) -> Self {
        match (self, other) {
            (Criteria::All, c) | (c, Criteria::All) => c,
            (Criteria::And(mut a), Criteria::And(b)) => {
                a.extend(b);
                Criteria::And(a)
            }
            (Criteria::And(mut a), c) => {
                a.push(c);
                Criteria::And(a)
            }
            (c, Criteria::And(mut b)) => {
                b.insert(0, c);
                Criteria::And(b)
            }
            (a, b) => Criteria::And(vec![a, b]),
        }
    }

    /// Disjunction of `self` and `other`
    pub fn or(self, other: Criteria) -> Self {
        match (self, other) {
            (Criteria::Or(mut a), c) => {
                a.push(c);
                Criteria::Or(a)
            }
            (a, b) => Criteria::Or(vec![a, b]),
        }
    }

    /// Negation
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Criteria::Not(Box::new(self))
    }

    /// Conjunction of one equality term per field of `row`, in field order.
    ///
    /// This is the identity criteria used by diff-based updates and batched
    /// updates. An empty row yields an empty conjunction.
    pub fn fields_equal(row: &Row) -> Self {
        Criteria::And(
            row.iter()
                .map(|(field, value)| Criteria::eq(field.clone(), value.clone()))
                .collect(),
        )
    }

    /// Whether this is the match-everything criteria
    pub fn is_all(&self) -> bool {
        match self {
            Criteria::All => true,
            Criteria::And(children) => children.iter().all(Criteria::is_all),
            _ => false,
        }
    }
}

impl Default for Criteria {
    fn default() -> Self {
        Criteria::All
    }
}
