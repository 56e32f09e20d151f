mod compare;
mod family;


use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

// re-exports
pub use compare::canonical_cmp;
pub use family::ValueFamily;

///
/// Value
///
/// One cell of a column or one level of a key.
///
/// Equality, hashing and ordering are canonical so values can sit inside join
/// keys: `Int` and `Uint` compare numerically, every `NaN` equals every other
/// `NaN`, and `-0.0 == 0.0`. `Null` is the "no value" sentinel.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum Value {
    Bool(bool),
    Float(f64),
    Int(i64),
    Null,
    Text(String),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    Uint(u64),
}

impl Value {
    pub const NAN: Self = Self::Float(f64::NAN);

    /// Semantic family of this value, or `None` for `Null`.
    #[must_use]
    pub const fn family(&self) -> Option<ValueFamily> {
        match self {
            Self::Bool(_) => Some(ValueFamily::Boolean),
            Self::Float(_) => Some(ValueFamily::Float),
            Self::Int(_) => Some(ValueFamily::Integer),
            Self::Uint(_) => Some(ValueFamily::Unsigned),
            Self::Timestamp(_) => Some(ValueFamily::Time),
            Self::Text(_) => Some(ValueFamily::Other),
            Self::Null => None,
        }
    }

    /// True for `Null` and for floating `NaN`.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Numeric view used by reductions. Booleans count as `0`/`1`.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Uint(v) => Some(*v as f64),
            Self::Null | Self::Text(_) | Self::Timestamp(_) => None,
        }
    }

    /// Integral view; booleans count as `0`/`1`.
    #[must_use]
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Self::Bool(v) => Some(i128::from(*v)),
            Self::Int(v) => Some(i128::from(*v)),
            Self::Uint(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Cast a fill value so it can sit in a column of `family` without
    /// changing the column's representation where a lossless cast exists.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn coerced_for(&self, family: ValueFamily) -> Self {
        match (family, self) {
            (ValueFamily::Float, Self::Int(v)) => Self::Float(*v as f64),
            (ValueFamily::Float, Self::Uint(v)) => Self::Float(*v as f64),
            (ValueFamily::Integer, Self::Uint(v)) => {
                i64::try_from(*v).map_or_else(|_| self.clone(), Self::Int)
            }
            (ValueFamily::Unsigned, Self::Int(v)) => {
                u64::try_from(*v).map_or_else(|_| self.clone(), Self::Uint)
            }
            _ => self.clone(),
        }
    }

    // Canonical bits for float hashing/equality.
    fn float_bits(v: f64) -> u64 {
        if v.is_nan() {
            f64::NAN.to_bits()
        } else if v == 0.0 {
            0.0f64.to_bits()
        } else {
            v.to_bits()
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        canonical_cmp(self, other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        canonical_cmp(self, other)
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_rank().hash(state);
        match self {
            Self::Bool(v) => v.hash(state),
            Self::Float(v) => Self::float_bits(*v).hash(state),
            Self::Int(v) => i128::from(*v).hash(state),
            Self::Uint(v) => i128::from(*v).hash(state),
            Self::Timestamp(v) => v.hash(state),
            Self::Text(v) => v.hash(state),
            Self::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) | Self::Timestamp(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Null => write!(f, "null"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}
