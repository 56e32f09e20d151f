use crate::{
    column::Column,
    error::{
        AggregationTypeError, Error, ResolutionError, UnresolvedSymbolError,
        UnsupportedReductionError,
    },
    eval::{BasicEvaluator, Evaluator},
    obs::sink::{self, LinkEvent},
    resolve::{AggregateKind, AggregateOptions, Traversal, reduce},
    value::{Value, ValueFamily},
};
use std::{borrow::Cow, rc::Rc};

///
/// LinkHandle
///
/// Result of accessing a link by name. The variant is fixed by the most
/// recent hop: a link that needs aggregation yields `Aggregation`, a target
/// with links of its own yields `Relay`, anything else is a `Leaf`.
/// Handles are built per access and never cached.
///

#[derive(Clone, Debug)]
pub enum LinkHandle<'a> {
    Leaf(Leaf<'a>),
    Relay(Relay<'a>),
    Aggregation(Aggregation<'a>),
}

impl<'a> LinkHandle<'a> {
    pub(crate) fn open(traversal: Traversal<'a>) -> Self {
        let spec = traversal.top().spec();

        if spec.requires_aggregation() {
            Self::Aggregation(Aggregation { traversal })
        } else if spec.is_chainable() {
            Self::Relay(Relay { traversal })
        } else {
            Self::Leaf(Leaf { traversal })
        }
    }

    #[must_use]
    pub const fn traversal(&self) -> &Traversal<'a> {
        match self {
            Self::Leaf(Leaf { traversal })
            | Self::Relay(Relay { traversal })
            | Self::Aggregation(Aggregation { traversal }) => traversal,
        }
    }

    /// Name of the most recently traversed link.
    #[must_use]
    pub fn link_name(&self) -> &str {
        self.traversal().top().spec().name()
    }

    /// Uniform access: a column for leaves and relays, a deeper handle for
    /// onward links, an aggregator for aggregation handles.
    pub fn get(&self, name: &str) -> Result<Attribute<'a>, Error> {
        match self {
            Self::Leaf(leaf) => leaf.get(name).map(Attribute::from),
            Self::Relay(relay) => relay.get(name),
            Self::Aggregation(aggregation) => aggregation.aggregator(name).map(Attribute::Aggregator),
        }
    }

    /// Names valid for [`LinkHandle::get`].
    #[must_use]
    pub fn attributes(&self) -> Vec<String> {
        match self {
            Self::Leaf(leaf) => leaf.attributes(),
            Self::Relay(relay) => relay.attributes(),
            Self::Aggregation(_) => Aggregation::functions()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    #[must_use]
    pub const fn requires_aggregation(&self) -> bool {
        matches!(self, Self::Aggregation(_))
    }
}

///
/// Leaf
///
/// Final hop into a table without links; only columns can be read.
///

#[derive(Clone, Debug)]
pub struct Leaf<'a> {
    traversal: Traversal<'a>,
}

impl Leaf<'_> {
    /// Resolve column `name` of the target onto the root rows.
    pub fn get(&self, name: &str) -> Result<Column, Error> {
        self.traversal
            .resolve_column(name)
            .unwrap_or_else(|| Err(missing_attribute(&self.traversal, name)))
    }

    #[must_use]
    pub fn attributes(&self) -> Vec<String> {
        self.traversal
            .target()
            .column_names()
            .map(ToString::to_string)
            .collect()
    }
}

///
/// Relay
///
/// Hop into a table that declares links of its own. Link names take
/// precedence over column names.
///

#[derive(Clone, Debug)]
pub struct Relay<'a> {
    traversal: Traversal<'a>,
}

impl<'a> Relay<'a> {
    pub fn get(&self, name: &str) -> Result<Attribute<'a>, Error> {
        if let Some(spec) = self.traversal.target().link(name) {
            let traversal = self.traversal.advance(Rc::clone(spec))?;

            return Ok(Attribute::Link(LinkHandle::open(traversal)));
        }

        self.traversal
            .resolve_column(name)
            .unwrap_or_else(|| Err(missing_attribute(&self.traversal, name)))
            .map(Attribute::from)
    }

    /// Column names followed by onward link names.
    #[must_use]
    pub fn attributes(&self) -> Vec<String> {
        let target = self.traversal.target();

        target
            .column_names()
            .chain(target.link_names())
            .map(ToString::to_string)
            .collect()
    }
}

///
/// Aggregation
///
/// Hop through a link with many target rows per owner key. Only aggregate
/// functions can be read; values come from calling the returned aggregator.
///

#[derive(Clone, Debug)]
pub struct Aggregation<'a> {
    traversal: Traversal<'a>,
}

impl<'a> Aggregation<'a> {
    /// Look up an aggregate function by name.
    pub fn aggregator(&self, function: &str) -> Result<Aggregator<'a>, Error> {
        let kind = function.parse::<AggregateKind>()?;

        Ok(self.aggregate(kind))
    }

    #[must_use]
    pub fn aggregate(&self, kind: AggregateKind) -> Aggregator<'a> {
        Aggregator {
            traversal: self.traversal.clone(),
            kind,
        }
    }

    #[must_use]
    pub const fn functions() -> &'static [&'static str] {
        &AggregateKind::NAMES
    }
}

///
/// Aggregator
///
/// One aggregate function bound to a chain ending in an aggregating link.
///

#[derive(Clone, Debug)]
pub struct Aggregator<'a> {
    traversal: Traversal<'a>,
    kind: AggregateKind,
}

impl Aggregator<'_> {
    #[must_use]
    pub const fn kind(&self) -> AggregateKind {
        self.kind
    }

    /// Aggregate `expression` with the default evaluator.
    pub fn call(&self, expression: &str, options: &AggregateOptions) -> Result<Column, Error> {
        self.call_with(&BasicEvaluator, expression, options)
    }

    /// Evaluate `expression` on the aggregating link's target, reduce it per
    /// target-key group, and project the groups back onto the root rows.
    pub fn call_with(
        &self,
        evaluator: &dyn Evaluator,
        expression: &str,
        options: &AggregateOptions,
    ) -> Result<Column, Error> {
        options.validate(self.kind)?;

        let top = self.traversal.top();
        let target = top.target();
        let evaluated = evaluator.evaluate(target, expression)?;
        if evaluated.len() != target.row_count() {
            return Err(ResolutionError::EvaluationLength {
                expression: expression.to_string(),
                expected: target.row_count(),
                actual: evaluated.len(),
            }
            .into());
        }

        let family = evaluated.family();
        if self.kind.requires_numeric() && !family.is_numeric() {
            return Err(AggregationTypeError {
                expression: expression.to_string(),
                family,
                function: self.kind,
            }
            .into());
        }
        let fill = match family {
            ValueFamily::Integer | ValueFamily::Unsigned => Value::Int(options.int_fill),
            ValueFamily::Float | ValueFamily::Boolean => Value::NAN,
            ValueFamily::Other => Value::Null,
            ValueFamily::Time => {
                return Err(UnsupportedReductionError {
                    expression: expression.to_string(),
                    function: self.kind,
                }
                .into());
            }
        };

        let index = top.spec().index(top.owner())?;
        let grouping = index
            .grouping()
            .ok_or_else(|| ResolutionError::MissingGrouping(top.spec().name().to_string()))?;
        let reduced = reduce::reduce_groups(self.kind, &evaluated, grouping, options);

        sink::record(&LinkEvent::Aggregated {
            link: top.spec().name(),
            function: self.kind.name(),
            groups: grouping.groups() as u64,
        });

        self.traversal.resolve(reduced, &fill)
    }
}

///
/// Attribute
///
/// Named access result: a plain column, a link handle, or an aggregator.
///

#[derive(Clone, Debug)]
pub enum Attribute<'a> {
    Column(Cow<'a, Column>),
    Link(LinkHandle<'a>),
    Aggregator(Aggregator<'a>),
}

impl<'a> Attribute<'a> {
    #[must_use]
    pub fn as_column(&self) -> Option<&Column> {
        match self {
            Self::Column(column) => Some(column),
            Self::Link(_) | Self::Aggregator(_) => None,
        }
    }

    /// The column, or an error naming the link the access stopped at.
    pub fn into_column(self) -> Result<Cow<'a, Column>, Error> {
        match self {
            Self::Column(column) => Ok(column),
            Self::Link(LinkHandle::Aggregation(aggregation)) => Err(
                UnresolvedSymbolError::AggregationRequired(link_name(&aggregation.traversal))
                    .into(),
            ),
            Self::Link(handle) => {
                Err(UnresolvedSymbolError::ChainIncomplete(handle.link_name().to_string()).into())
            }
            Self::Aggregator(aggregator) => Err(UnresolvedSymbolError::ChainIncomplete(
                link_name(&aggregator.traversal),
            )
            .into()),
        }
    }

    #[must_use]
    pub fn into_link(self) -> Option<LinkHandle<'a>> {
        match self {
            Self::Link(handle) => Some(handle),
            Self::Column(_) | Self::Aggregator(_) => None,
        }
    }

    #[must_use]
    pub fn into_aggregator(self) -> Option<Aggregator<'a>> {
        match self {
            Self::Aggregator(aggregator) => Some(aggregator),
            Self::Column(_) | Self::Link(_) => None,
        }
    }

    #[must_use]
    pub const fn is_link(&self) -> bool {
        matches!(self, Self::Link(_))
    }
}

impl From<Column> for Attribute<'_> {
    fn from(column: Column) -> Self {
        Self::Column(Cow::Owned(column))
    }
}

fn link_name(traversal: &Traversal<'_>) -> String {
    traversal.top().spec().name().to_string()
}

fn missing_attribute(traversal: &Traversal<'_>, name: &str) -> Error {
    UnresolvedSymbolError::Attribute {
        name: name.to_string(),
        scope: format!("link '{}'", traversal.top().spec().name()),
    }
    .into()
}
