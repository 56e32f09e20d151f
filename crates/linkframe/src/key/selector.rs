use crate::{
    error::LinkageSpecificationError,
    key::Key,
    table::Table,
};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// KeySelector
///
/// Names the key one side of a link joins on. `Index` uses the table's full
/// row identity; `Levels` picks named index levels; `Columns` picks columns.
/// A selector without labels always reads the row identity.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySelector {
    Index,
    Levels(Vec<String>),
    Columns(Vec<String>),
}

impl KeySelector {
    /// Build a selector from the raw `(labels, from_row_identity)` pair.
    /// Missing labels always select the full row identity.
    #[must_use]
    pub fn from_labels(labels: Option<Vec<String>>, from_row_identity: bool) -> Self {
        match labels {
            None => Self::Index,
            Some(labels) if from_row_identity => Self::Levels(labels),
            Some(labels) => Self::Columns(labels),
        }
    }

    #[must_use]
    pub fn labels(&self) -> Option<&[String]> {
        match self {
            Self::Index => None,
            Self::Levels(labels) | Self::Columns(labels) => Some(labels),
        }
    }

    #[must_use]
    pub const fn from_row_identity(&self) -> bool {
        matches!(self, Self::Index | Self::Levels(_))
    }

    /// Number of key levels this selector produces for `table`.
    #[must_use]
    pub fn nlevels(&self, table: &Table) -> usize {
        match self {
            Self::Index => table.index().nlevels(),
            Self::Levels(labels) | Self::Columns(labels) => labels.len(),
        }
    }

    /// Columns the selector reads; empty for row-identity selectors.
    #[must_use]
    pub fn depends_on_columns(&self) -> &[String] {
        match self {
            Self::Columns(labels) => labels,
            Self::Index | Self::Levels(_) => &[],
        }
    }

    /// True when every column the selector reads exists on `table`.
    #[must_use]
    pub fn is_satisfied_by(&self, table: &Table) -> bool {
        self.depends_on_columns()
            .iter()
            .all(|name| table.has_column(name))
    }

    /// Resolve the ordered key sequence, one key per row of `table`.
    pub fn resolve(&self, table: &Table) -> Result<Vec<Key>, LinkageSpecificationError> {
        let index = table.index();

        match self {
            Self::Index => Ok(index.keys().to_vec()),
            Self::Levels(labels) => {
                if labels.len() > index.nlevels() {
                    return Err(LinkageSpecificationError::TooManyLevels {
                        requested: labels.len(),
                        available: index.nlevels(),
                    });
                }
                let levels = labels
                    .iter()
                    .map(|name| {
                        index
                            .level_position(name)
                            .ok_or_else(|| LinkageSpecificationError::MissingLevel(name.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(index
                    .keys()
                    .iter()
                    .map(|key| {
                        Key::new(
                            levels
                                .iter()
                                .filter_map(|&level| key.get(level).cloned())
                                .collect(),
                        )
                    })
                    .collect())
            }
            Self::Columns(labels) => {
                let columns = labels
                    .iter()
                    .map(|name| {
                        table
                            .column(name)
                            .ok_or_else(|| LinkageSpecificationError::MissingColumn(name.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok((0..table.row_count())
                    .map(|row| {
                        Key::new(
                            columns
                                .iter()
                                .filter_map(|column| column.get(row).cloned())
                                .collect(),
                        )
                    })
                    .collect())
            }
        }
    }
}

impl fmt::Display for KeySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index => write!(f, "From index: all levels"),
            Self::Levels(labels) => write!(f, "From index: {labels:?}"),
            Self::Columns(labels) => write!(f, "From columns: {labels:?}"),
        }
    }
}
