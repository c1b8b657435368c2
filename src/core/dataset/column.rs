use crate::core::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A column identifier as a caller writes it: a position or a label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl ColumnRef {
    /// Positions and all-digit labels resolve without looking at the data.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            ColumnRef::Index(i) => Some(*i),
            ColumnRef::Name(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                s.parse().ok()
            }
            ColumnRef::Name(_) => None,
        }
    }
}

impl From<usize> for ColumnRef {
    fn from(i: usize) -> Self {
        ColumnRef::Index(i)
    }
}

impl From<&str> for ColumnRef {
    fn from(s: &str) -> Self {
        ColumnRef::Name(s.to_string())
    }
}

impl From<String> for ColumnRef {
    fn from(s: String) -> Self {
        ColumnRef::Name(s)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Index(i) => write!(f, "{}", i),
            ColumnRef::Name(s) => write!(f, "{}", s),
        }
    }
}

/// Reductions usable with `DataSet::column_agg`. Nulls are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Min,
    Max,
    Sum,
    Count,
}

impl Aggregate {
    pub fn reduce<I: Iterator<Item = Value>>(self, values: I) -> Option<Value> {
        let mut present = values.filter(|v| !v.is_null());
        match self {
            Aggregate::Min => present.reduce(|acc, v| match v.compare(&acc) {
                Some(std::cmp::Ordering::Less) => v,
                _ => acc,
            }),
            Aggregate::Max => present.reduce(|acc, v| match v.compare(&acc) {
                Some(std::cmp::Ordering::Greater) => v,
                _ => acc,
            }),
            Aggregate::Sum => {
                let first = present.next()?;
                present.try_fold(first, |acc, v| acc.checked_add(&v))
            }
            Aggregate::Count => Some(Value::Int(present.count() as i64)),
        }
    }
}
