use crate::core::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// One row of the `records` representation, also used as the row view
/// produced by iteration over any representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Row {
    /// field name -> value, in key insertion order
    Mapping(IndexMap<String, Value>),
    /// positional scalars
    Sequence(Vec<Value>),
}

impl Row {
    pub fn mapping<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Row::Mapping(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn sequence<I: IntoIterator<Item = Value>>(values: I) -> Self {
        Row::Sequence(values.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Row::Mapping(m) => m.len(),
            Row::Sequence(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Positional read; for mappings the position follows key order.
    pub fn get(&self, idx: usize) -> Option<&Value> {
        match self {
            Row::Mapping(m) => m.get_index(idx).map(|(_, v)| v),
            Row::Sequence(s) => s.get(idx),
        }
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Value> {
        match self {
            Row::Mapping(m) => m.get_index_mut(idx).map(|(_, v)| v),
            Row::Sequence(s) => s.get_mut(idx),
        }
    }

    /// Position of a key (mappings only).
    pub fn key_position(&self, key: &str) -> Option<usize> {
        match self {
            Row::Mapping(m) => m.get_index_of(key),
            Row::Sequence(_) => None,
        }
    }

    pub fn keys(&self) -> Option<Vec<&str>> {
        match self {
            Row::Mapping(m) => Some(m.keys().map(String::as_str).collect()),
            Row::Sequence(_) => None,
        }
    }

    pub fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            Row::Mapping(m) => Box::new(m.values()),
            Row::Sequence(s) => Box::new(s.iter()),
        }
    }

    pub fn into_values(self) -> Vec<Value> {
        match self {
            Row::Mapping(m) => m.into_values().collect(),
            Row::Sequence(s) => s,
        }
    }

    /// `(label, value)` pairs; sequence rows are labeled by position.
    pub fn labeled(&self) -> Vec<(Cow<'_, str>, &Value)> {
        match self {
            Row::Mapping(m) => m.iter().map(|(k, v)| (Cow::Borrowed(k.as_str()), v)).collect(),
            Row::Sequence(s) => s
                .iter()
                .enumerate()
                .map(|(i, v)| (Cow::Owned(i.to_string()), v))
                .collect(),
        }
    }
}
