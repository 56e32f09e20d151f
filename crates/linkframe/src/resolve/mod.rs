//! Module: resolve
//! Responsibility: link-chain traversal handles, per-hop gather with fill
//! substitution, and many-to-one aggregation.
//! Does not own: link declaration or indexer caching (see `link`).
//! Boundary: consumes `LinkSpec` indexers; produces columns aligned with the
//! root table's rows.

mod aggregate;
mod handle;
mod reduce;

#[cfg(test)]
mod tests;

use crate::{
    column::Column,
    error::Error,
    link::LinkSpec,
    obs::sink::{self, LinkEvent},
    table::Table,
    value::Value,
};
use std::{collections::VecDeque, ops::Deref, rc::Rc};

// re-exports
pub use aggregate::{AggregateKind, AggregateOptions};
pub use handle::{Aggregation, Aggregator, Attribute, Leaf, LinkHandle, Relay};

///
/// TableRef
///
/// Owner of one hop: the borrowed root table, or a shared target reached by
/// an earlier hop.
///

#[derive(Clone, Debug)]
pub enum TableRef<'a> {
    Borrowed(&'a Table),
    Shared(Rc<Table>),
}

impl Deref for TableRef<'_> {
    type Target = Table;

    fn deref(&self) -> &Table {
        match self {
            Self::Borrowed(table) => table,
            Self::Shared(table) => table,
        }
    }
}

///
/// Hop
///
/// One traversed link with the table it starts from and the table it reaches.
///

#[derive(Clone, Debug)]
pub struct Hop<'a> {
    owner: TableRef<'a>,
    spec: Rc<LinkSpec>,
    target: Rc<Table>,
}

impl<'a> Hop<'a> {
    /// Open `link` on `owner`, upgrading its target.
    pub(crate) fn open(owner: TableRef<'a>, spec: Rc<LinkSpec>) -> Result<Self, Error> {
        let target = spec.target()?;

        Ok(Self {
            owner,
            spec,
            target,
        })
    }

    #[must_use]
    pub fn owner(&self) -> &Table {
        &self.owner
    }

    #[must_use]
    pub fn spec(&self) -> &LinkSpec {
        &self.spec
    }

    #[must_use]
    pub const fn target(&self) -> &Rc<Table> {
        &self.target
    }
}

///
/// ChainState
///
/// Path from the root to the table currently inspected. The most recently
/// traversed hop is `top`; `outer` holds the earlier hops, most recent first,
/// so iteration runs from the final target back to the root.
///

#[derive(Clone, Debug)]
pub struct ChainState<'a> {
    top: Hop<'a>,
    outer: VecDeque<Hop<'a>>,
}

impl<'a> ChainState<'a> {
    #[must_use]
    pub const fn new(first: Hop<'a>) -> Self {
        Self {
            top: first,
            outer: VecDeque::new(),
        }
    }

    /// The chain with `hop` prepended; `self` is left untouched.
    #[must_use]
    pub fn extend(&self, hop: Hop<'a>) -> Self {
        let mut outer = self.outer.clone();
        outer.push_front(self.top.clone());

        Self { top: hop, outer }
    }

    /// Most recently traversed hop.
    #[must_use]
    pub const fn top(&self) -> &Hop<'a> {
        &self.top
    }

    /// Number of hops from the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.outer.len() + 1
    }

    /// Hops from the final target back to the root.
    pub fn iter(&self) -> impl Iterator<Item = &Hop<'a>> {
        std::iter::once(&self.top).chain(self.outer.iter())
    }

    /// Link names from the root outwards.
    #[must_use]
    pub fn path(&self) -> Vec<&str> {
        let mut path: Vec<&str> = self.iter().map(|hop| hop.spec.name()).collect();
        path.reverse();
        path
    }
}

///
/// Traversal
///
/// Root row count plus the chain taken so far.
///

#[derive(Clone, Debug)]
pub struct Traversal<'a> {
    root_rows: usize,
    chain: ChainState<'a>,
}

impl<'a> Traversal<'a> {
    /// Start a traversal at `root` through the link `spec`.
    pub(crate) fn start(root: &'a Table, spec: Rc<LinkSpec>) -> Result<Self, Error> {
        let hop = Hop::open(TableRef::Borrowed(root), spec)?;

        Ok(Self {
            root_rows: root.row_count(),
            chain: ChainState::new(hop),
        })
    }

    /// Continue through `spec`, a link declared on the current target.
    pub(crate) fn advance(&self, spec: Rc<LinkSpec>) -> Result<Self, Error> {
        let owner = TableRef::Shared(Rc::clone(self.target()));
        let hop = Hop::open(owner, spec)?;

        Ok(Self {
            root_rows: self.root_rows,
            chain: self.chain.extend(hop),
        })
    }

    #[must_use]
    pub const fn root_rows(&self) -> usize {
        self.root_rows
    }

    #[must_use]
    pub const fn chain(&self) -> &ChainState<'a> {
        &self.chain
    }

    #[must_use]
    pub const fn top(&self) -> &Hop<'a> {
        &self.chain.top
    }

    /// Table reached by the most recent hop.
    #[must_use]
    pub const fn target(&self) -> &Rc<Table> {
        &self.chain.top.target
    }

    /// Project `raw`, aligned with the rows of the final target, back onto
    /// the root rows. Every hop gathers through its indexer and writes `fill`
    /// where that hop has no match.
    pub fn resolve(&self, raw: Column, fill: &Value) -> Result<Column, Error> {
        let mut column = raw;
        let mut unmatched = 0usize;

        for hop in self.chain.iter() {
            let indexer = hop.spec.indexer(&hop.owner)?;
            unmatched = unmatched.saturating_add(indexer.unmatched());
            column = column.take_with_fill(indexer, fill);
        }

        sink::record(&LinkEvent::ChainResolved {
            hops: self.chain.depth() as u64,
            rows: column.len() as u64,
            unmatched: unmatched as u64,
        });

        Ok(column)
    }

    /// Resolve the column `name` of the final target, filled with that
    /// table's fill value for the column.
    pub(crate) fn resolve_column(&self, name: &str) -> Option<Result<Column, Error>> {
        let target = self.target();
        let column = target.column(name)?;
        let fill = target.fill_value_for(name, column.family());

        Some(self.resolve(column.clone(), &fill))
    }
}
