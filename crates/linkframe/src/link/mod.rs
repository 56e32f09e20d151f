//! Module: link
//! Responsibility: link declarations, cardinality detection, and cached
//! positional indexers.
//! Does not own: traversal of link chains or aggregation (see `resolve`).
//! Boundary: a `LinkSpec` turns two key selectors into an `Indexer` that the
//! resolver gathers through.

mod index;
mod options;
mod registry;
mod summary;

#[cfg(test)]
mod tests;

use crate::{
    error::{CardinalityError, Error, LinkageSpecificationError, ResolutionError},
    key::{KeySelector, is_unique},
    obs::sink::{self, IndexerBuild, LinkEvent},
    table::Table,
};
use serde::{Deserialize, Serialize};
use std::{
    cell::OnceCell,
    fmt,
    rc::{Rc, Weak},
};

// re-exports
pub use index::{GroupingKey, Indexer, LinkIndex};
pub use options::LinkOptions;
pub use registry::LinkRegistry;
pub use summary::{LinkSummary, LinkSummaryTable};

///
/// Cardinality
///
/// Direction-aware join shape from owner to target.
///
/// Aggregation is a property of the owner → target traversal: only a target
/// key that repeats under a unique owner key forces a reduction.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Both keys are unique.
    OneToOne,
    /// Owner rows repeat the key; each still finds at most one target row.
    RepeatedOwner,
    /// Many target rows share one owner key; values must be aggregated.
    ManyToOne,
}

impl Cardinality {
    /// Classify a link from the uniqueness of each side. Both sides repeating
    /// is a many-to-many link and has no cardinality.
    #[must_use]
    pub const fn detect(owner_unique: bool, target_unique: bool) -> Option<Self> {
        match (owner_unique, target_unique) {
            (true, true) => Some(Self::OneToOne),
            (false, true) => Some(Self::RepeatedOwner),
            (true, false) => Some(Self::ManyToOne),
            (false, false) => None,
        }
    }

    #[must_use]
    pub const fn requires_aggregation(self) -> bool {
        matches!(self, Self::ManyToOne)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::OneToOne => "one_to_one",
            Self::RepeatedOwner => "repeated_owner",
            Self::ManyToOne => "many_to_one",
        };
        write!(f, "{label}")
    }
}

///
/// AggregationRequired
///
/// Returned by `link_to`: whether access through the new link needs an
/// explicit aggregation.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AggregationRequired {
    No,
    Yes,
}

impl AggregationRequired {
    #[must_use]
    pub const fn is_required(self) -> bool {
        matches!(self, Self::Yes)
    }
}

impl From<Cardinality> for AggregationRequired {
    fn from(cardinality: Cardinality) -> Self {
        if cardinality.requires_aggregation() {
            Self::Yes
        } else {
            Self::No
        }
    }
}

///
/// LinkSpec
///
/// One declared link. Holds a non-owning reference to its target; the
/// target's lifetime stays with the caller.
///
/// The indexer is memoized: it is computed at creation when precomputed, or
/// on the first call to [`LinkSpec::index`]. It is never invalidated
/// automatically; callers refresh through `Table::compute_indexers` after
/// keys change.
///

#[derive(Debug)]
pub struct LinkSpec {
    name: String,
    target: Weak<Table>,
    owner_selector: KeySelector,
    target_selector: KeySelector,
    cardinality: Cardinality,
    chainable: bool,
    index: OnceCell<LinkIndex>,
}

impl LinkSpec {
    /// Validate a declaration, detect its cardinality, and optionally build
    /// the indexer right away.
    pub(crate) fn create(
        owner: &Table,
        target: &Rc<Table>,
        name: &str,
        owner_selector: KeySelector,
        target_selector: KeySelector,
        build: Option<IndexerBuild>,
    ) -> Result<Self, Error> {
        if name.is_empty() {
            return Err(LinkageSpecificationError::EmptyName.into());
        }

        let owner_levels = owner_selector.nlevels(owner);
        let target_levels = target_selector.nlevels(target);
        if owner_levels != target_levels {
            return Err(LinkageSpecificationError::LevelCountMismatch {
                owner: owner_levels,
                target: target_levels,
            }
            .into());
        }

        let owner_keys = owner_selector.resolve(owner)?;
        let target_keys = target_selector.resolve(target)?;
        let cardinality = Cardinality::detect(is_unique(&owner_keys), is_unique(&target_keys))
            .ok_or_else(|| CardinalityError {
                link: name.to_string(),
            })?;

        let built = build.map(|build| {
            let index = LinkIndex::build(cardinality, &owner_keys, &target_keys);
            Self::record_build_for(name, build, &index);
            index
        });

        Ok(Self {
            name: name.to_string(),
            target: Rc::downgrade(target),
            owner_selector,
            target_selector,
            cardinality,
            chainable: !target.links().is_empty(),
            index: built.map_or_else(OnceCell::new, OnceCell::from),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Upgrade the target reference.
    pub fn target(&self) -> Result<Rc<Table>, ResolutionError> {
        self.target
            .upgrade()
            .ok_or_else(|| ResolutionError::TargetDropped(self.name.clone()))
    }

    #[must_use]
    pub const fn owner_selector(&self) -> &KeySelector {
        &self.owner_selector
    }

    #[must_use]
    pub const fn target_selector(&self) -> &KeySelector {
        &self.target_selector
    }

    #[must_use]
    pub const fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    #[must_use]
    pub const fn requires_aggregation(&self) -> bool {
        self.cardinality.requires_aggregation()
    }

    /// True when the target declares links of its own.
    #[must_use]
    pub const fn is_chainable(&self) -> bool {
        self.chainable
    }

    #[must_use]
    pub fn is_precomputed(&self) -> bool {
        self.index.get().is_some()
    }

    /// Memoized lookup state for `owner`, which must be the table this link
    /// is registered on.
    ///
    /// The first call on a link that was not precomputed resolves both keys
    /// and caches the result; this is the one mutation a read performs.
    pub fn index(&self, owner: &Table) -> Result<&LinkIndex, Error> {
        if let Some(index) = self.index.get() {
            return Ok(index);
        }

        let index = self.build_index(owner)?;
        Self::record_build_for(&self.name, IndexerBuild::Lazy, &index);

        Ok(self.index.get_or_init(|| index))
    }

    /// Convenience accessor for the memoized indexer.
    pub fn indexer(&self, owner: &Table) -> Result<&Indexer, Error> {
        self.index(owner).map(LinkIndex::indexer)
    }

    /// Compute the indexer now if it is not cached yet.
    pub fn precompute(&self, owner: &Table) -> Result<(), Error> {
        self.index(owner).map(|_| ())
    }

    /// Rebuild the link from the current keys of `owner` and the target.
    /// Cardinality is re-detected, so a refresh can fail with a
    /// `CardinalityError` if the keys changed shape.
    pub fn refresh(&self, owner: &Table) -> Result<Self, Error> {
        let target = self.target()?;

        Self::create(
            owner,
            &target,
            &self.name,
            self.owner_selector.clone(),
            self.target_selector.clone(),
            Some(IndexerBuild::Refresh),
        )
    }

    /// Copy this link for a derived owner. With a row subset, a cached
    /// indexer is re-sliced by the same positions the owner's rows were;
    /// an uncomputed indexer stays uncomputed.
    #[must_use]
    pub fn copy(&self, subset: Option<&[usize]>) -> Self {
        let copied = self.index.get().map(|current| match subset {
            Some(rows) => {
                sink::record(&LinkEvent::IndexerSliced {
                    link: &self.name,
                    rows: rows.len() as u64,
                });
                current.subset(rows)
            }
            None => current.clone(),
        });

        Self {
            name: self.name.clone(),
            target: self.target.clone(),
            owner_selector: self.owner_selector.clone(),
            target_selector: self.target_selector.clone(),
            cardinality: self.cardinality,
            chainable: self.chainable,
            index: copied.map_or_else(OnceCell::new, OnceCell::from),
        }
    }

    fn build_index(&self, owner: &Table) -> Result<LinkIndex, Error> {
        let target = self.target()?;
        let owner_keys = self.owner_selector.resolve(owner)?;
        let target_keys = self.target_selector.resolve(&target)?;

        Ok(LinkIndex::build(self.cardinality, &owner_keys, &target_keys))
    }

    fn record_build_for(link: &str, build: IndexerBuild, index: &LinkIndex) {
        sink::record(&LinkEvent::IndexerBuilt {
            link,
            build,
            owner_rows: index.indexer().len() as u64,
            unmatched: index.indexer().unmatched() as u64,
        });
    }
}
