use crate::{
    key::{Key, KeyPositions, factorize},
    link::Cardinality,
};
use std::rc::Rc;

///
/// Indexer
///
/// Maps each owner row to a position in the target's key space (or in the
/// target's distinct groups for aggregating links). `-1` marks "no match".
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Indexer {
    positions: Vec<i64>,
}

impl Indexer {
    pub const NO_MATCH: i64 = -1;

    /// Build from optional positions; `None` becomes `NO_MATCH`.
    pub fn from_positions(positions: impl IntoIterator<Item = Option<usize>>) -> Self {
        let positions = positions
            .into_iter()
            .map(|pos| pos.map_or(Self::NO_MATCH, encode_position))
            .collect();

        Self { positions }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Raw signed positions, `-1` for unmatched rows.
    #[must_use]
    pub fn as_slice(&self) -> &[i64] {
        &self.positions
    }

    /// Target position for one owner row, `None` when unmatched or out of range.
    #[must_use]
    pub fn position(&self, row: usize) -> Option<usize> {
        self.positions
            .get(row)
            .and_then(|&pos| usize::try_from(pos).ok())
    }

    /// True when the owner row found a target.
    #[must_use]
    pub fn is_match(&self, row: usize) -> bool {
        self.position(row).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<usize>> + '_ {
        self.positions.iter().map(|&pos| usize::try_from(pos).ok())
    }

    /// Number of owner rows without a match.
    #[must_use]
    pub fn unmatched(&self) -> usize {
        self.positions.iter().filter(|&&pos| pos < 0).count()
    }

    /// Re-slice with the same positional subset applied to the owner's rows.
    #[must_use]
    pub fn subset(&self, rows: &[usize]) -> Self {
        let positions = rows
            .iter()
            .map(|&row| self.positions.get(row).copied().unwrap_or(Self::NO_MATCH))
            .collect();

        Self { positions }
    }
}

fn encode_position(pos: usize) -> i64 {
    i64::try_from(pos).unwrap_or(Indexer::NO_MATCH)
}

///
/// GroupingKey
///
/// Factorized target key of an aggregating link: one group code per target
/// row plus the number of distinct groups. Shared between copies of a link
/// because row subsets of the owner never touch the target.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GroupingKey {
    codes: Rc<[usize]>,
    groups: usize,
}

impl GroupingKey {
    #[must_use]
    pub fn codes(&self) -> &[usize] {
        &self.codes
    }

    #[must_use]
    pub const fn groups(&self) -> usize {
        self.groups
    }
}

///
/// LinkIndex
///
/// Cached lookup state of one link: the indexer and, for aggregating links,
/// the grouping key.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinkIndex {
    indexer: Indexer,
    grouping: Option<GroupingKey>,
}

impl LinkIndex {
    /// Compute the lookup state from resolved owner and target keys.
    pub(crate) fn build(cardinality: Cardinality, owner_keys: &[Key], target_keys: &[Key]) -> Self {
        if cardinality.requires_aggregation() {
            let (codes, uniques) = factorize(target_keys);
            let groups = KeyPositions::first_positions(&uniques);
            let indexer = Indexer::from_positions(owner_keys.iter().map(|key| groups.get(key)));

            return Self {
                indexer,
                grouping: Some(GroupingKey {
                    codes: codes.into(),
                    groups: uniques.len(),
                }),
            };
        }

        let targets = KeyPositions::first_positions(target_keys);
        let indexer = Indexer::from_positions(owner_keys.iter().map(|key| targets.get(key)));

        Self {
            indexer,
            grouping: None,
        }
    }

    #[must_use]
    pub const fn indexer(&self) -> &Indexer {
        &self.indexer
    }

    #[must_use]
    pub const fn grouping(&self) -> Option<&GroupingKey> {
        self.grouping.as_ref()
    }

    #[must_use]
    pub(crate) fn subset(&self, rows: &[usize]) -> Self {
        Self {
            indexer: self.indexer.subset(rows),
            grouping: self.grouping.clone(),
        }
    }
}
