//! Query shape understood by sequence sources
//!
//! A [`SequenceQuery`] asks for the rows of one collection ordered by the
//! sequence field, optionally scoped by a [`SequenceFilter`] (e.g. only the
//! areas of one project). Filters render to OData `$filter` syntax and can
//! also be evaluated directly against in-memory rows.

use crate::allocator::extract_digits;
use dtrack_model::{record_field_text, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// Comparison operator of a filter clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
}

impl FilterOp {
    /// OData keyword
    #[inline]
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
        }
    }
}

/// Literal on the right-hand side of a filter clause
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Integer literal
    Integer(i64),
    /// String literal
    Text(String),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// `field op value`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterClause {
    /// Field the clause tests
    pub field: String,
    /// Operator
    pub op: FilterOp,
    /// Literal
    pub value: FilterValue,
}

impl FilterClause {
    /// Evaluate against a row; a missing field never matches
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let Some(actual) = record.get(&self.field) else {
            return false;
        };
        let ordering = match (&self.value, actual) {
            (FilterValue::Integer(expected), Value::Number(n)) => {
                n.as_i64().map(|v| v.cmp(expected))
            }
            (FilterValue::Integer(expected), Value::String(s)) => {
                s.trim().parse::<i64>().ok().map(|v| v.cmp(expected))
            }
            (FilterValue::Text(expected), _) => {
                record_field_text(record, &self.field).map(|v| v.as_str().cmp(expected.as_str()))
            }
            _ => None,
        };
        ordering.is_some_and(|o| self.op.accepts(o))
    }
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op.keyword(), self.value)
    }
}

/// Conjunction of clauses scoping a sequence query
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceFilter(Vec<FilterClause>);

impl SequenceFilter {
    /// Filter that matches everything
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter with a single equality clause
    #[inline]
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new().and(field, FilterOp::Eq, value)
    }

    /// Add a clause
    #[must_use]
    pub fn and(
        mut self,
        field: impl Into<String>,
        op: FilterOp,
        value: impl Into<FilterValue>,
    ) -> Self {
        self.0.push(FilterClause {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Clauses in insertion order
    #[inline]
    #[must_use]
    pub fn clauses(&self) -> &[FilterClause] {
        &self.0
    }

    /// Check if no clause is present
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Evaluate all clauses against a row
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.0.iter().all(|c| c.matches(record))
    }

    /// Render as an OData `$filter` expression
    #[must_use]
    pub fn to_odata(&self) -> String {
        self.0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

/// "Sort by field, take the top N, optionally filtered"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceQuery {
    /// Collection locator (OData entity set or in-memory collection name)
    pub endpoint: String,
    /// Field to order by
    pub field: String,
    /// Descending order when true
    pub descending: bool,
    /// Maximum number of rows
    pub top: usize,
    /// Optional scope
    pub filter: Option<SequenceFilter>,
}

impl SequenceQuery {
    /// Query for the single row with the highest `field`
    #[must_use]
    pub fn latest(endpoint: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            field: field.into(),
            descending: true,
            top: 1,
            filter: None,
        }
    }

    /// With scope filter; an empty filter is dropped
    #[must_use]
    pub fn with_filter(mut self, filter: Option<SequenceFilter>) -> Self {
        self.filter = filter.filter(|f| !f.is_empty());
        self
    }

    /// OData `$orderby` value
    #[must_use]
    pub fn order_by(&self) -> String {
        let direction = if self.descending { "desc" } else { "asc" };
        format!("{} {direction}", self.field)
    }
}

/// Order two rows by `field`: numbers numerically, text by the value of its
/// digit run and then as text, rows without the field first
pub(crate) fn compare_by_field(a: &Record, b: &Record, field: &str) -> Ordering {
    if let (Some(Value::Number(x)), Some(Value::Number(y))) = (a.get(field), b.get(field)) {
        return x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal);
    }
    match (record_field_text(a, field), record_field_text(b, field)) {
        (Some(x), Some(y)) => {
            let by_digits = match (extract_digits(&x), extract_digits(&y)) {
                (Some(dx), Some(dy)) => compare_digit_runs(dx, dy),
                _ => Ordering::Equal,
            };
            by_digits.then_with(|| x.cmp(&y))
        }
        (x, y) => x.cmp(&y),
    }
}

/// Compare unbounded decimal digit strings by value
fn compare_digit_runs(x: &str, y: &str) -> Ordering {
    let x = x.trim_start_matches('0');
    let y = y.trim_start_matches('0');
    x.len().cmp(&y.len()).then_with(|| x.cmp(y))
}
