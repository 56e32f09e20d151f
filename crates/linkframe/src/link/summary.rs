use crate::link::LinkSpec;
use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// LinkSummary
///
/// Diagnostic row describing one declared link.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct LinkSummary {
    pub name: String,
    /// `(rows, columns)` of the target, `None` once the target is dropped.
    pub target_shape: Option<(usize, usize)>,
    pub on_self: String,
    pub on_other: String,
    pub chained: bool,
    pub aggregation: bool,
    pub preindexed: bool,
}

impl LinkSummary {
    #[must_use]
    pub fn describe(spec: &LinkSpec) -> Self {
        Self {
            name: spec.name().to_string(),
            target_shape: spec.target().ok().map(|target| target.shape()),
            on_self: spec.owner_selector().to_string(),
            on_other: spec.target_selector().to_string(),
            chained: spec.is_chainable(),
            aggregation: spec.requires_aggregation(),
            preindexed: spec.is_precomputed(),
        }
    }
}

///
/// LinkSummaryTable
///
/// All summaries of one table, in link-name order. `Display` renders a
/// fixed-width listing.
///

#[derive(Clone, Debug, Default, Deref, Deserialize, Eq, IntoIterator, PartialEq, Serialize)]
pub struct LinkSummaryTable(Vec<LinkSummary>);

impl LinkSummaryTable {
    #[must_use]
    pub const fn new(rows: Vec<LinkSummary>) -> Self {
        Self(rows)
    }
}

const HEADERS: [&str; 7] = [
    "name",
    "target_shape",
    "on_self",
    "on_other",
    "chained",
    "aggregation",
    "preindexed",
];

impl fmt::Display for LinkSummaryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<[String; 7]> = self
            .0
            .iter()
            .map(|row| {
                [
                    row.name.clone(),
                    row.target_shape
                        .map_or_else(|| "dropped".to_string(), |(r, c)| format!("({r}, {c})")),
                    row.on_self.clone(),
                    row.on_other.clone(),
                    row.chained.to_string(),
                    row.aggregation.to_string(),
                    row.preindexed.to_string(),
                ]
            })
            .collect();

        let mut widths = HEADERS.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        write_row(f, &HEADERS, &widths)?;
        for row in &rows {
            writeln!(f)?;
            write_row(f, row, &widths)?;
        }

        Ok(())
    }
}

fn write_row<S: AsRef<str>>(f: &mut fmt::Formatter<'_>, cells: &[S; 7], widths: &[usize; 7]) -> fmt::Result {
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            write!(f, "  ")?;
        }
        write!(f, "{:<width$}", cell.as_ref())?;
    }

    Ok(())
}
