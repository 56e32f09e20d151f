//! Row and column derivations.
//!
//! Row subsets copy every link with its cached indexer re-sliced by the same
//! positions used for the rows. Column projections keep only links whose
//! owner key columns survive.

use crate::{
    error::TableError,
    key::Key,
    link::LinkRegistry,
    table::Table,
};
use std::{
    collections::{BTreeMap, HashMap},
    ops::Range,
};

impl Table {
    /// Rows at `positions`, in that order. Positions may repeat.
    pub fn take(&self, positions: &[usize]) -> Result<Self, TableError> {
        let len = self.row_count();
        if let Some(&position) = positions.iter().find(|&&position| position >= len) {
            return Err(TableError::PositionOutOfBounds { position, len });
        }

        Ok(self.derive_rows(positions))
    }

    /// Rows where `mask` is true.
    pub fn filter(&self, mask: &[bool]) -> Result<Self, TableError> {
        if mask.len() != self.row_count() {
            return Err(TableError::MaskLength {
                expected: self.row_count(),
                actual: mask.len(),
            });
        }

        let positions: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(row, &keep)| keep.then_some(row))
            .collect();

        Ok(self.derive_rows(&positions))
    }

    /// Rows in `range`, clamped to the table.
    #[must_use]
    pub fn slice(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.row_count());
        let start = range.start.min(end);
        let positions: Vec<usize> = (start..end).collect();

        self.derive_rows(&positions)
    }

    #[must_use]
    pub fn head(&self, n: usize) -> Self {
        self.slice(0..n)
    }

    #[must_use]
    pub fn tail(&self, n: usize) -> Self {
        let rows = self.row_count();

        self.slice(rows.saturating_sub(n)..rows)
    }

    /// Rows selected by row-identity label. Each label contributes every row
    /// carrying it, in request order.
    pub fn loc(&self, labels: &[Key]) -> Result<Self, TableError> {
        let mut by_key: HashMap<&Key, Vec<usize>> = HashMap::new();
        for (row, key) in self.index().keys().iter().enumerate() {
            by_key.entry(key).or_default().push(row);
        }

        let mut positions = Vec::with_capacity(labels.len());
        for label in labels {
            let rows = by_key
                .get(label)
                .ok_or_else(|| TableError::MissingLabel(label.clone()))?;
            positions.extend_from_slice(rows);
        }

        Ok(self.derive_rows(&positions))
    }

    /// Rows from the first row labelled `start` through the last row
    /// labelled `end`, both inclusive. Empty when `end` sits before `start`.
    pub fn loc_range(&self, start: &Key, end: &Key) -> Result<Self, TableError> {
        let keys = self.index().keys();
        let first = keys
            .iter()
            .position(|key| key == start)
            .ok_or_else(|| TableError::MissingLabel(start.clone()))?;
        let last = keys
            .iter()
            .rposition(|key| key == end)
            .ok_or_else(|| TableError::MissingLabel(end.clone()))?;
        let positions: Vec<usize> = (first..=last).collect();

        Ok(self.derive_rows(&positions))
    }

    /// Split rows by the values of `columns`, in sorted key order. Each
    /// sub-table keeps its links.
    pub fn group_by(&self, columns: &[&str]) -> Result<Vec<(Key, Self)>, TableError> {
        let selected = columns
            .iter()
            .map(|&name| {
                self.column(name)
                    .ok_or_else(|| TableError::MissingColumn(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut groups: BTreeMap<Key, Vec<usize>> = BTreeMap::new();
        for row in 0..self.row_count() {
            let key = Key::new(
                selected
                    .iter()
                    .filter_map(|column| column.get(row).cloned())
                    .collect(),
            );
            groups.entry(key).or_default().push(row);
        }

        Ok(groups
            .into_iter()
            .map(|(key, positions)| (key, self.derive_rows(&positions)))
            .collect())
    }

    /// Keep only `columns`. Links whose owner key reads a dropped column are
    /// removed without error.
    pub fn select(&self, columns: &[&str]) -> Result<Self, TableError> {
        if let Some(missing) = columns.iter().find(|&&name| !self.has_column(name)) {
            return Err(TableError::MissingColumn((*missing).to_string()));
        }

        Ok(self.project(|name| columns.contains(&name)))
    }

    /// Remove `columns`, with the same link handling as [`Table::select`].
    pub fn drop_columns(&self, columns: &[&str]) -> Result<Self, TableError> {
        if let Some(missing) = columns.iter().find(|&&name| !self.has_column(name)) {
            return Err(TableError::MissingColumn((*missing).to_string()));
        }

        Ok(self.project(|name| !columns.contains(&name)))
    }

    fn derive_rows(&self, positions: &[usize]) -> Self {
        let mut derived = Self {
            name: self.name.clone(),
            index: self.index.take(positions),
            columns: self
                .columns
                .iter()
                .map(|(name, column)| (name.clone(), column.take(positions)))
                .collect(),
            links: LinkRegistry::new(),
            fills: self.fills.clone(),
        };
        self.links.copy_into(&mut derived, Some(positions));

        derived
    }

    fn project(&self, keep: impl Fn(&str) -> bool) -> Self {
        let mut derived = Self {
            name: self.name.clone(),
            index: self.index.clone(),
            columns: self
                .columns
                .iter()
                .filter(|(name, _)| keep(name))
                .map(|(name, column)| (name.clone(), column.clone()))
                .collect(),
            links: LinkRegistry::new(),
            fills: self.fills.clone(),
        };
        derived.fills.retain_columns(|name| derived.columns.contains_key(name));

        let mut links = self.links.clone();
        links.retain_satisfied(&derived);
        derived.replace_links(links);

        derived
    }
}
