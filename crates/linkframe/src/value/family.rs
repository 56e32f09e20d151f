//! Semantic dtype families for columns and evaluated expressions.
//!
//! Families drive two decisions only: whether an aggregate accepts its input,
//! and which fill value stands in for unmatched rows.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// ValueFamily
///
/// Coarse classification of a column's values.
/// Boolean counts as numeric, matching the reduction semantics.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFamily {
    Integer,
    Unsigned,
    Float,
    Boolean,
    Time,
    Other,
}

impl ValueFamily {
    pub const ALL: [Self; 6] = [
        Self::Integer,
        Self::Unsigned,
        Self::Float,
        Self::Boolean,
        Self::Time,
        Self::Other,
    ];

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Unsigned | Self::Float | Self::Boolean
        )
    }

    #[must_use]
    pub const fn is_integral(self) -> bool {
        matches!(self, Self::Integer | Self::Unsigned)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Unsigned => "unsigned",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Time => "time",
            Self::Other => "other",
        }
    }

    /// Family of a column holding values of both `self` and `other`.
    #[must_use]
    pub const fn unify(self, other: Self) -> Self {
        match (self, other) {
            (Self::Integer, Self::Integer) => Self::Integer,
            (Self::Unsigned, Self::Unsigned) => Self::Unsigned,
            (Self::Float, Self::Float) => Self::Float,
            (Self::Boolean, Self::Boolean) => Self::Boolean,
            (Self::Time, Self::Time) => Self::Time,
            (Self::Integer, Self::Unsigned) | (Self::Unsigned, Self::Integer) => Self::Integer,
            (Self::Integer | Self::Unsigned, Self::Float)
            | (Self::Float, Self::Integer | Self::Unsigned) => Self::Float,
            _ => Self::Other,
        }
    }

    /// Infer the family of a sequence of values. Nulls are ignored; an empty
    /// or all-null sequence is `Other`.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        values
            .into_iter()
            .filter_map(Value::family)
            .reduce(Self::unify)
            .unwrap_or(Self::Other)
    }
}

impl fmt::Display for ValueFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
