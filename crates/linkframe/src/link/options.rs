use crate::{error::LinkageSpecificationError, key::KeySelector};
use serde::{Deserialize, Serialize};

///
/// LinkOptions
///
/// Declaration arguments for `Table::link_to`.
///
/// `on` and `levels` apply the same labels to both sides; the split forms
/// name each side separately. Unset sides join on the full row identity.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct LinkOptions {
    pub on: Option<Vec<String>>,
    pub levels: Option<Vec<String>>,
    pub on_self: Option<Vec<String>>,
    pub on_other: Option<Vec<String>>,
    pub self_levels: Option<Vec<String>>,
    pub other_levels: Option<Vec<String>>,
    pub precompute: bool,
}

impl LinkOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Join both sides on the same column(s).
    #[must_use]
    pub fn on<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.on = Some(labels(columns));
        self
    }

    /// Join both sides on the same index level(s).
    #[must_use]
    pub fn levels<S: Into<String>>(mut self, levels: impl IntoIterator<Item = S>) -> Self {
        self.levels = Some(labels(levels));
        self
    }

    #[must_use]
    pub fn on_self<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.on_self = Some(labels(columns));
        self
    }

    #[must_use]
    pub fn on_other<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.on_other = Some(labels(columns));
        self
    }

    #[must_use]
    pub fn self_levels<S: Into<String>>(mut self, levels: impl IntoIterator<Item = S>) -> Self {
        self.self_levels = Some(labels(levels));
        self
    }

    #[must_use]
    pub fn other_levels<S: Into<String>>(mut self, levels: impl IntoIterator<Item = S>) -> Self {
        self.other_levels = Some(labels(levels));
        self
    }

    /// Defer indexer computation to first access.
    #[must_use]
    pub const fn lazy(mut self) -> Self {
        self.precompute = false;
        self
    }

    #[must_use]
    pub const fn precompute(mut self, precompute: bool) -> Self {
        self.precompute = precompute;
        self
    }

    /// Validate the argument combination and produce the owner and target
    /// selectors.
    pub fn resolve(&self) -> Result<(KeySelector, KeySelector), LinkageSpecificationError> {
        let split_set = self.on_self.is_some()
            || self.on_other.is_some()
            || self.self_levels.is_some()
            || self.other_levels.is_some();

        match (&self.on, &self.levels) {
            (Some(_), Some(_)) => Err(LinkageSpecificationError::OnAndLevels),
            (Some(_), None) if split_set => {
                Err(LinkageSpecificationError::SharedAndSplit { shared: "on" })
            }
            (None, Some(_)) if split_set => {
                Err(LinkageSpecificationError::SharedAndSplit { shared: "levels" })
            }
            (Some(on), None) => {
                let on = non_empty(on, "on")?;
                Ok((
                    KeySelector::Columns(on.to_vec()),
                    KeySelector::Columns(on.to_vec()),
                ))
            }
            (None, Some(levels)) => {
                let levels = non_empty(levels, "levels")?;
                Ok((
                    KeySelector::Levels(levels.to_vec()),
                    KeySelector::Levels(levels.to_vec()),
                ))
            }
            (None, None) => {
                let owner = side(
                    self.on_self.as_deref(),
                    self.self_levels.as_deref(),
                    ("on_self", "self_levels"),
                )
                .map_err(|err| err.unwrap_or(LinkageSpecificationError::SelfColumnsAndLevels))?;
                let target = side(
                    self.on_other.as_deref(),
                    self.other_levels.as_deref(),
                    ("on_other", "other_levels"),
                )
                .map_err(|err| err.unwrap_or(LinkageSpecificationError::OtherColumnsAndLevels))?;

                Ok((owner, target))
            }
        }
    }
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            on: None,
            levels: None,
            on_self: None,
            on_other: None,
            self_levels: None,
            other_levels: None,
            precompute: true,
        }
    }
}

fn labels<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Vec<String> {
    labels.into_iter().map(Into::into).collect()
}

fn non_empty<'a>(
    labels: &'a [String],
    argument: &'static str,
) -> Result<&'a [String], LinkageSpecificationError> {
    if labels.is_empty() {
        return Err(LinkageSpecificationError::EmptyLabels { argument });
    }

    Ok(labels)
}

// `Err(None)` marks a columns/levels conflict on this side; the caller picks
// the side-specific variant.
fn side(
    columns: Option<&[String]>,
    levels: Option<&[String]>,
    arguments: (&'static str, &'static str),
) -> Result<KeySelector, Option<LinkageSpecificationError>> {
    match (columns, levels) {
        (Some(_), Some(_)) => Err(None),
        (Some(columns), None) => Ok(KeySelector::Columns(
            non_empty(columns, arguments.0).map_err(Some)?.to_vec(),
        )),
        (None, Some(levels)) => Ok(KeySelector::Levels(
            non_empty(levels, arguments.1).map_err(Some)?.to_vec(),
        )),
        (None, None) => Ok(KeySelector::Index),
    }
}
