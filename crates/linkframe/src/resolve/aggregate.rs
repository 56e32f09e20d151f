use crate::error::{AggregateOptionError, UnresolvedSymbolError};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

///
/// AggregateKind
///
/// Reductions available on an aggregating link. The first nine require a
/// numeric (or boolean) input; `count`, `first`, `last` and `nth` accept any
/// family.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    Count,
    First,
    Last,
    Max,
    Mean,
    Median,
    Min,
    Nth,
    Prod,
    Quantile,
    Std,
    Sum,
    Var,
}

impl AggregateKind {
    /// Every function, in name order.
    pub const ALL: [Self; 13] = [
        Self::Count,
        Self::First,
        Self::Last,
        Self::Max,
        Self::Mean,
        Self::Median,
        Self::Min,
        Self::Nth,
        Self::Prod,
        Self::Quantile,
        Self::Std,
        Self::Sum,
        Self::Var,
    ];

    pub const NAMES: [&'static str; 13] = [
        "count", "first", "last", "max", "mean", "median", "min", "nth", "prod", "quantile", "std",
        "sum", "var",
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::First => "first",
            Self::Last => "last",
            Self::Max => "max",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Min => "min",
            Self::Nth => "nth",
            Self::Prod => "prod",
            Self::Quantile => "quantile",
            Self::Std => "std",
            Self::Sum => "sum",
            Self::Var => "var",
        }
    }

    #[must_use]
    pub const fn requires_numeric(self) -> bool {
        !matches!(self, Self::Count | Self::First | Self::Last | Self::Nth)
    }
}

impl FromStr for AggregateKind {
    type Err = UnresolvedSymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnresolvedSymbolError::Aggregation {
                name: s.to_string(),
                expected: Self::NAMES.join(", "),
            })
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

///
/// AggregateOptions
///
/// Extra arguments for an aggregator call. Each function reads only the
/// options it understands.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct AggregateOptions {
    /// Fill for unmatched owner rows when the evaluated expression is
    /// integral (NaN cannot be stored there).
    pub int_fill: i64,
    /// Quantile in `[0, 1]`, read by `quantile`.
    pub q: f64,
    /// Row position inside each group, read by `nth`; negative counts from
    /// the end.
    pub n: i64,
    /// Delta degrees of freedom, read by `var` and `std`.
    pub ddof: u32,
}

impl AggregateOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn int_fill(mut self, int_fill: i64) -> Self {
        self.int_fill = int_fill;
        self
    }

    #[must_use]
    pub const fn q(mut self, q: f64) -> Self {
        self.q = q;
        self
    }

    #[must_use]
    pub const fn n(mut self, n: i64) -> Self {
        self.n = n;
        self
    }

    #[must_use]
    pub const fn ddof(mut self, ddof: u32) -> Self {
        self.ddof = ddof;
        self
    }

    /// Check the options `kind` reads.
    pub fn validate(&self, kind: AggregateKind) -> Result<(), AggregateOptionError> {
        if kind == AggregateKind::Quantile && !(0.0..=1.0).contains(&self.q) {
            return Err(AggregateOptionError {
                function: kind,
                option: "q",
                reason: format!("{} is outside [0, 1]", self.q),
            });
        }

        Ok(())
    }
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            int_fill: -1,
            q: 0.5,
            n: 0,
            ddof: 1,
        }
    }
}
