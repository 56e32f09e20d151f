//! Owned column vectors.
//!
//! A column is a sequence of `Value`s tagged with its `ValueFamily`. The
//! family is fixed at construction and only widens when a gather writes fill
//! values of another family.

use crate::{
    link::Indexer,
    value::{Value, ValueFamily},
};
use serde::{Deserialize, Serialize};

///
/// Column
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Column {
    family: ValueFamily,
    values: Vec<Value>,
}

impl Column {
    /// Build a column and infer its family from the values.
    #[must_use]
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            family: ValueFamily::infer(&values),
            values,
        }
    }

    /// Build a column with an explicit family (useful for empty or all-null
    /// columns whose family cannot be inferred).
    #[must_use]
    pub const fn with_family(family: ValueFamily, values: Vec<Value>) -> Self {
        Self { family, values }
    }

    pub fn ints(values: impl IntoIterator<Item = i64>) -> Self {
        Self::typed(ValueFamily::Integer, values.into_iter().map(Value::Int))
    }

    pub fn uints(values: impl IntoIterator<Item = u64>) -> Self {
        Self::typed(ValueFamily::Unsigned, values.into_iter().map(Value::Uint))
    }

    pub fn floats(values: impl IntoIterator<Item = f64>) -> Self {
        Self::typed(ValueFamily::Float, values.into_iter().map(Value::Float))
    }

    pub fn bools(values: impl IntoIterator<Item = bool>) -> Self {
        Self::typed(ValueFamily::Boolean, values.into_iter().map(Value::Bool))
    }

    pub fn texts<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::typed(
            ValueFamily::Other,
            values.into_iter().map(|v| Value::Text(v.into())),
        )
    }

    /// Epoch-millisecond timestamps.
    pub fn timestamps(values: impl IntoIterator<Item = i64>) -> Self {
        Self::typed(ValueFamily::Time, values.into_iter().map(Value::Timestamp))
    }

    /// A column repeating one value `len` times.
    #[must_use]
    pub fn constant(value: Value, len: usize) -> Self {
        let family = value.family().unwrap_or(ValueFamily::Other);

        Self {
            family,
            values: vec![value; len],
        }
    }

    fn typed(family: ValueFamily, values: impl Iterator<Item = Value>) -> Self {
        Self {
            family,
            values: values.collect(),
        }
    }

    #[must_use]
    pub const fn family(&self) -> ValueFamily {
        self.family
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Positional gather. Callers validate positions; out-of-range positions
    /// yield `Null`.
    #[must_use]
    pub(crate) fn take(&self, positions: &[usize]) -> Self {
        let values = positions
            .iter()
            .map(|&pos| self.values.get(pos).cloned().unwrap_or(Value::Null))
            .collect();

        Self {
            family: self.family,
            values,
        }
    }

    /// Gather through an indexer, writing `fill` wherever the indexer has no
    /// match. The output has one value per indexer entry.
    #[must_use]
    pub fn take_with_fill(&self, indexer: &Indexer, fill: &Value) -> Self {
        let fill = fill.coerced_for(self.family);
        let mut filled = false;
        let values = indexer
            .iter()
            .map(
                |position| match position.and_then(|pos| self.values.get(pos)) {
                    Some(value) => value.clone(),
                    None => {
                        filled = true;
                        fill.clone()
                    }
                },
            )
            .collect();

        let family = match fill.family() {
            Some(fill_family) if filled => self.family.unify(fill_family),
            _ => self.family,
        };

        Self { family, values }
    }
}

impl<'a> IntoIterator for &'a Column {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
