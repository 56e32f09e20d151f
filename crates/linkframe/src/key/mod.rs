//! Module: key
//! Responsibility: row keys, row identity, and key selection for links.
//! Does not own: indexer caching or cardinality policy (see `link`).
//! Boundary: turns a table plus a `KeySelector` into an ordered key sequence.

mod positions;
mod selector;

#[cfg(test)]
mod tests;

use crate::{error::TableError, value::Value};
use derive_more::Deref;
use serde::{Deserialize, Serialize};
use std::fmt;

// re-exports
pub(crate) use positions::{KeyPositions, factorize, is_unique};
pub use selector::KeySelector;

///
/// Key
///
/// One row key: an ordered tuple with one value per level. Single-level keys
/// are one-element tuples.
///

#[derive(Clone, Debug, Deref, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Key(Vec<Value>);

impl Key {
    #[must_use]
    pub const fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn scalar(value: impl Into<Value>) -> Self {
        Self(vec![value.into()])
    }

    #[must_use]
    pub const fn nlevels(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.0
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [single] = self.0.as_slice() {
            return write!(f, "{single}");
        }

        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")
    }
}

impl From<Value> for Key {
    fn from(value: Value) -> Self {
        Self::scalar(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::scalar(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self::scalar(value)
    }
}

impl From<Vec<Value>> for Key {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

///
/// RowIndex
///
/// Row identity of a table: optional level names plus one key per row.
/// Every key has exactly `nlevels()` values.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RowIndex {
    names: Vec<Option<String>>,
    keys: Vec<Key>,
}

impl RowIndex {
    /// Build a row index, checking that every key has one value per level.
    pub fn new(names: Vec<Option<String>>, keys: Vec<Key>) -> Result<Self, TableError> {
        if names.is_empty() {
            return Err(TableError::EmptyIndex);
        }
        if let Some((row, key)) = keys
            .iter()
            .enumerate()
            .find(|(_, key)| key.nlevels() != names.len())
        {
            return Err(TableError::IndexLevelMismatch {
                row,
                expected: names.len(),
                actual: key.nlevels(),
            });
        }

        Ok(Self { names, keys })
    }

    /// Default unnamed positional identity `0..len`.
    #[must_use]
    pub fn range(len: usize) -> Self {
        let keys = (0..len)
            .map(|i| Key::scalar(Value::Uint(i as u64)))
            .collect();

        Self {
            names: vec![None],
            keys,
        }
    }

    /// Single named level.
    pub fn named<V: Into<Value>>(name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            names: vec![Some(name.into())],
            keys: values.into_iter().map(Key::scalar).collect(),
        }
    }

    /// Multi-level identity built from equally long named level arrays.
    pub fn from_levels(levels: Vec<(String, Vec<Value>)>) -> Result<Self, TableError> {
        let Some(len) = levels.first().map(|(_, values)| values.len()) else {
            return Err(TableError::EmptyIndex);
        };
        if let Some((name, values)) = levels.iter().find(|(_, values)| values.len() != len) {
            return Err(TableError::LengthMismatch {
                column: name.clone(),
                expected: len,
                actual: values.len(),
            });
        }

        let names = levels.iter().map(|(name, _)| Some(name.clone())).collect();
        let keys = (0..len)
            .map(|row| Key::new(levels.iter().map(|(_, values)| values[row].clone()).collect()))
            .collect();

        Ok(Self { names, keys })
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub const fn nlevels(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn names(&self) -> &[Option<String>] {
        &self.names
    }

    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    #[must_use]
    pub fn key(&self, row: usize) -> Option<&Key> {
        self.keys.get(row)
    }

    /// Position of a named level.
    #[must_use]
    pub fn level_position(&self, name: &str) -> Option<usize> {
        self.names
            .iter()
            .position(|level| level.as_deref() == Some(name))
    }

    /// Values of the level `name`, one per row.
    #[must_use]
    pub fn level_values(&self, name: &str) -> Option<Vec<&Value>> {
        let level = self.level_position(name)?;

        Some(self.keys.iter().filter_map(|key| key.get(level)).collect())
    }

    /// Every row position carrying `key`, in row order.
    #[must_use]
    pub fn positions_of(&self, key: &Key) -> Vec<usize> {
        self.keys
            .iter()
            .enumerate()
            .filter_map(|(row, candidate)| (candidate == key).then_some(row))
            .collect()
    }

    #[must_use]
    pub(crate) fn take(&self, positions: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            keys: positions
                .iter()
                .filter_map(|&pos| self.keys.get(pos).cloned())
                .collect(),
        }
    }
}
