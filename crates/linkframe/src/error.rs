use crate::{key::Key, resolve::AggregateKind, value::ValueFamily};
use std::fmt;
use thiserror::Error as ThisError;

///
/// LinkageSpecificationError
///
/// Malformed link declaration. Always surfaced from `link_to` and never
/// deferred to access time.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum LinkageSpecificationError {
    #[error("link name must not be empty")]
    EmptyName,

    #[error("empty label list given for '{argument}'")]
    EmptyLabels { argument: &'static str },

    #[error("can only specify one of 'on=' or 'levels='")]
    OnAndLevels,

    #[error("'{shared}=' cannot be combined with per-side key arguments")]
    SharedAndSplit { shared: &'static str },

    #[error("can only specify one of 'on_self=' or 'self_levels='")]
    SelfColumnsAndLevels,

    #[error("can only specify one of 'on_other=' or 'other_levels='")]
    OtherColumnsAndLevels,

    #[error("owner key has {owner} level(s) but target key has {target}")]
    LevelCountMismatch { owner: usize, target: usize },

    #[error("cannot select {requested} level(s) from an index with {available}")]
    TooManyLevels { requested: usize, available: usize },

    #[error("level '{0}' not in the index")]
    MissingLevel(String),

    #[error("column '{0}' not in the columns")]
    MissingColumn(String),
}

///
/// CardinalityError
///
/// Both sides of a prospective link repeat their keys. This is a modeling
/// error and is raised while the link is being created.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("many-to-many links are not permitted: link '{link}' repeats keys on both sides")]
pub struct CardinalityError {
    pub link: String,
}

///
/// UnresolvedSymbolError
///
/// A traversal referenced a name that does not exist at that hop, or used a
/// handle in a way its variant does not allow.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum UnresolvedSymbolError {
    #[error("'{name}' is not a column or link of {scope}")]
    Attribute { name: String, scope: String },

    #[error("'{0}' is not a link")]
    NotALink(String),

    #[error("'{name}' is not a supported aggregation (expected one of: {expected})")]
    Aggregation { name: String, expected: String },

    #[error("link '{0}' joins many target rows per owner row and requires an aggregation")]
    AggregationRequired(String),

    #[error("link '{0}' does not require an aggregation")]
    AggregationNotRequired(String),

    #[error("chain ends at link '{0}' instead of an attribute")]
    ChainIncomplete(String),

    #[error("'{0}' resolved to a column but the chain continues")]
    ChainPastColumn(String),

    #[error("cannot evaluate expression '{0}'")]
    Expression(String),
}

///
/// AggregationTypeError
///
/// A numeric-only aggregate was requested against a non-numeric expression.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error(
    "result of evaluation '{expression}' is non-numeric type {family}, which is not allowed for aggregation function '{function}'"
)]
pub struct AggregationTypeError {
    pub expression: String,
    pub family: ValueFamily,
    pub function: AggregateKind,
}

///
/// UnsupportedReductionError
///
/// Aggregation produced time values, which have no defined fill value.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("'{function}' over time-typed expression '{expression}' has no defined fill value")]
pub struct UnsupportedReductionError {
    pub expression: String,
    pub function: AggregateKind,
}

///
/// AggregateOptionError
///
/// Out-of-range extra argument for an aggregate function.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
#[error("invalid '{option}' for aggregation '{function}': {reason}")]
pub struct AggregateOptionError {
    pub function: AggregateKind,
    pub option: &'static str,
    pub reason: String,
}

///
/// ResolutionError
///
/// Failures while materializing a traversal that are not naming problems.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ResolutionError {
    #[error("target table of link '{0}' has been dropped")]
    TargetDropped(String),

    #[error("link '{0}' has no grouping key for aggregation")]
    MissingGrouping(String),

    #[error("expression '{expression}' produced {actual} value(s) for a table of {expected} row(s)")]
    EvaluationLength {
        expression: String,
        expected: usize,
        actual: usize,
    },
}

///
/// TableError
///
/// Shape and selection errors raised by table construction and derivation.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum TableError {
    #[error("column '{column}' has {actual} row(s), expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("row index needs at least one level")]
    EmptyIndex,

    #[error("row key at position {row} has {actual} level(s), expected {expected}")]
    IndexLevelMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("column '{0}' not in the columns")]
    MissingColumn(String),

    #[error("label {0} not in the index")]
    MissingLabel(Key),

    #[error("position {position} out of bounds for {len} row(s)")]
    PositionOutOfBounds { position: usize, len: usize },

    #[error("boolean mask has {actual} value(s), expected {expected}")]
    MaskLength { expected: usize, actual: usize },
}

///
/// Error
///
/// Crate-level error surface. Every failure is a deterministic function of the
/// declared schema or expression; retrying never helps.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum Error {
    #[error(transparent)]
    Specification(#[from] LinkageSpecificationError),

    #[error(transparent)]
    Cardinality(#[from] CardinalityError),

    #[error(transparent)]
    UnresolvedSymbol(#[from] UnresolvedSymbolError),

    #[error(transparent)]
    AggregationType(#[from] AggregationTypeError),

    #[error(transparent)]
    UnsupportedReduction(#[from] UnsupportedReductionError),

    #[error(transparent)]
    AggregateOption(#[from] AggregateOptionError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Table(#[from] TableError),
}

impl Error {
    /// Stable classification of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Specification(_) | Self::AggregateOption(_) => ErrorClass::Specification,
            Self::Cardinality(_) => ErrorClass::Modeling,
            Self::UnresolvedSymbol(_) | Self::Table(_) => ErrorClass::NotFound,
            Self::AggregationType(_) | Self::UnsupportedReduction(_) => ErrorClass::Unsupported,
            Self::Resolution(ResolutionError::TargetDropped(_)) => ErrorClass::NotFound,
            Self::Resolution(_) => ErrorClass::InvariantViolation,
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}: {self}", self.class())
    }
}

///
/// ErrorClass
///
/// Coarse error taxonomy for hosts that route failures without matching on
/// every variant.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Specification,
    Modeling,
    NotFound,
    Unsupported,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Specification => "specification",
            Self::Modeling => "modeling",
            Self::NotFound => "not_found",
            Self::Unsupported => "unsupported",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}
