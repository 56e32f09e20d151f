//! Module: table
//! Responsibility: the linkable dataset: row identity, named columns, the
//! link registry, fill policy, and row/column derivations that keep links.
//! Does not own: indexer computation (see `link`) or chain traversal (see
//! `resolve`).
//! Boundary: `Table::get` is the entry point that turns a name into a column
//! or a link handle.

mod derive;
mod fill;


use crate::{
    column::Column,
    error::{Error, TableError, UnresolvedSymbolError},
    key::RowIndex,
    link::{
        AggregationRequired, LinkOptions, LinkRegistry, LinkSpec, LinkSummary, LinkSummaryTable,
    },
    obs::sink::{self, IndexerBuild, LinkEvent},
    resolve::{AggregateOptions, Attribute, LinkHandle, Traversal},
    value::{Value, ValueFamily},
};
use std::{borrow::Cow, collections::BTreeMap, rc::Rc};

// re-exports
pub use fill::{FillDefaults, FillPolicy};

///
/// Table
///
/// Row identity plus named columns, with an owned registry of links to other
/// tables. Link targets are held as `Rc<Table>` by the caller; a table never
/// keeps its targets alive.
///

#[derive(Clone, Debug)]
pub struct Table {
    name: Option<String>,
    index: RowIndex,
    columns: BTreeMap<String, Column>,
    links: LinkRegistry,
    fills: FillPolicy,
}

impl Table {
    /// Build a table over `index`. Every column must have one value per row.
    pub fn new<N: Into<String>>(
        index: RowIndex,
        columns: impl IntoIterator<Item = (N, Column)>,
    ) -> Result<Self, TableError> {
        let mut table = Self {
            name: None,
            index,
            columns: BTreeMap::new(),
            links: LinkRegistry::new(),
            fills: FillPolicy::default(),
        };

        for (name, column) in columns {
            let name = name.into();
            if table.columns.contains_key(&name) {
                return Err(TableError::DuplicateColumn(name));
            }
            table.insert_column(name, column)?;
        }

        Ok(table)
    }

    /// Build a table with the default positional row identity.
    pub fn from_columns<N: Into<String>>(
        columns: impl IntoIterator<Item = (N, Column)>,
    ) -> Result<Self, TableError> {
        let columns: Vec<(String, Column)> = columns
            .into_iter()
            .map(|(name, column)| (name.into(), column))
            .collect();
        let rows = columns.first().map_or(0, |(_, column)| column.len());

        Self::new(RowIndex::range(rows), columns)
    }

    /// Diagnostic name used in error messages.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach shared class-level fill defaults.
    #[must_use]
    pub fn with_class_defaults(mut self, defaults: Rc<FillDefaults>) -> Self {
        self.fills.set_class(defaults);
        self
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub const fn index(&self) -> &RowIndex {
        &self.index
    }

    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.index.len()
    }

    /// `(rows, columns)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.columns.len())
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(name, column)| (name.as_str(), column))
    }

    /// Add or replace a column. Cached indexers are not invalidated; call
    /// [`Table::compute_indexers`] with `refresh` after changing key columns.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        column: Column,
    ) -> Result<Option<Column>, TableError> {
        let name = name.into();
        if column.len() != self.row_count() {
            return Err(TableError::LengthMismatch {
                column: name,
                expected: self.row_count(),
                actual: column.len(),
            });
        }

        Ok(self.columns.insert(name, column))
    }

    /// Named access. Link names take precedence over column names.
    pub fn get(&self, name: &str) -> Result<Attribute<'_>, Error> {
        if let Some(spec) = self.links.get(name) {
            let traversal = Traversal::start(self, Rc::clone(spec))?;

            return Ok(Attribute::Link(LinkHandle::open(traversal)));
        }
        if let Some(column) = self.columns.get(name) {
            return Ok(Attribute::Column(Cow::Borrowed(column)));
        }

        Err(UnresolvedSymbolError::Attribute {
            name: name.to_string(),
            scope: self.scope(),
        }
        .into())
    }

    // ------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------

    /// Declare a link named `name` from this table to `target`, replacing
    /// any link already registered under that name.
    ///
    /// Specification and cardinality errors are raised here, never at
    /// access time. The result tells whether access through the link needs
    /// an explicit aggregation.
    pub fn link_to(
        &mut self,
        target: &Rc<Self>,
        name: &str,
        options: LinkOptions,
    ) -> Result<AggregationRequired, Error> {
        let (owner_selector, target_selector) = options.resolve()?;
        let build = options.precompute.then_some(IndexerBuild::Eager);
        let spec = LinkSpec::create(self, target, name, owner_selector, target_selector, build)?;
        let required = AggregationRequired::from(spec.cardinality());

        sink::record(&LinkEvent::LinkDeclared {
            link: name,
            aggregation: required.is_required(),
        });
        self.links.insert(spec);

        Ok(required)
    }

    #[must_use]
    pub const fn links(&self) -> &LinkRegistry {
        &self.links
    }

    #[must_use]
    pub fn has_link(&self, name: &str) -> bool {
        self.links.contains(name)
    }

    #[must_use]
    pub fn link(&self, name: &str) -> Option<&Rc<LinkSpec>> {
        self.links.get(name)
    }

    pub fn link_names(&self) -> impl Iterator<Item = &str> {
        self.links.names()
    }

    /// Compute every missing indexer, or rebuild all of them from the
    /// current keys when `refresh` is set.
    pub fn compute_indexers(&mut self, refresh: bool) -> Result<(), Error> {
        if refresh {
            let refreshed = self
                .links
                .iter()
                .map(|(_, spec)| spec.refresh(self))
                .collect::<Result<Vec<_>, _>>()?;
            for spec in refreshed {
                self.links.insert(spec);
            }

            return Ok(());
        }

        for (_, spec) in self.links.iter() {
            spec.precompute(self)?;
        }

        Ok(())
    }

    #[must_use]
    pub fn link_summary(&self) -> LinkSummaryTable {
        LinkSummaryTable::new(
            self.links
                .iter()
                .map(|(_, spec)| LinkSummary::describe(spec))
                .collect(),
        )
    }

    /// Resolve `link` followed by `chain` (onward link names ending in a
    /// column name) into a column aligned with this table's rows.
    pub fn resolve_chain(&self, link: &str, chain: &[&str]) -> Result<Column, Error> {
        self.walk(link, chain)?
            .into_column()
            .map(Cow::into_owned)
    }

    /// Resolve `link` followed by `chain` (onward link names) ending in an
    /// aggregating link, and reduce `expression` with `function`.
    pub fn resolve_aggregate(
        &self,
        link: &str,
        chain: &[&str],
        function: &str,
        expression: &str,
        options: &AggregateOptions,
    ) -> Result<Column, Error> {
        match self.walk(link, chain)? {
            Attribute::Link(LinkHandle::Aggregation(aggregation)) => aggregation
                .aggregator(function)?
                .call(expression, options),
            Attribute::Link(handle) => Err(UnresolvedSymbolError::AggregationNotRequired(
                handle.link_name().to_string(),
            )
            .into()),
            Attribute::Column(_) | Attribute::Aggregator(_) => {
                let last = chain.last().copied().unwrap_or(link);
                Err(UnresolvedSymbolError::NotALink(last.to_string()).into())
            }
        }
    }

    fn walk(&self, link: &str, chain: &[&str]) -> Result<Attribute<'_>, Error> {
        let mut current = self.get(link)?;
        if !current.is_link() {
            return Err(UnresolvedSymbolError::NotALink(link.to_string()).into());
        }

        let mut last = link;
        for &name in chain {
            current = match current {
                Attribute::Link(LinkHandle::Aggregation(_)) => {
                    return Err(UnresolvedSymbolError::AggregationRequired(last.to_string()).into());
                }
                Attribute::Link(handle) => handle.get(name)?,
                Attribute::Column(_) | Attribute::Aggregator(_) => {
                    return Err(UnresolvedSymbolError::ChainPastColumn(last.to_string()).into());
                }
            };
            last = name;
        }

        Ok(current)
    }

    pub(crate) fn replace_links(&mut self, links: LinkRegistry) {
        self.links = links;
    }

    // ------------------------------------------------------------------
    // Fill values
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn fill_policy(&self) -> &FillPolicy {
        &self.fills
    }

    /// Fill value for unmatched rows when `column` (of `family`) is pulled
    /// through a link into another table.
    #[must_use]
    pub fn fill_value_for(&self, column: &str, family: ValueFamily) -> Value {
        self.fills.fill_for(column, family)
    }

    /// Override the fill value of one column.
    pub fn set_column_fill(
        &mut self,
        column: &str,
        value: impl Into<Value>,
    ) -> Result<(), TableError> {
        if !self.has_column(column) {
            return Err(TableError::MissingColumn(column.to_string()));
        }
        self.fills.set_column(column.to_string(), value.into());

        Ok(())
    }

    pub fn set_fill_defaults(&mut self, defaults: FillDefaults) {
        self.fills.replace_instance(Some(defaults));
    }

    pub fn reset_fill_defaults(&mut self) {
        self.fills.replace_instance(None);
    }

    /// Run `f` with `defaults` installed as this table's instance defaults.
    /// The previous defaults are restored afterwards, also on unwind.
    pub fn temporary_fill_defaults<T>(
        &mut self,
        defaults: FillDefaults,
        f: impl FnOnce(&Self) -> T,
    ) -> T {
        struct Restore<'t> {
            table: &'t mut Table,
            prev: Option<FillDefaults>,
        }

        impl Drop for Restore<'_> {
            fn drop(&mut self) {
                let prev = self.prev.take();
                self.table.fills.replace_instance(prev);
            }
        }

        let prev = self.fills.replace_instance(Some(defaults));
        let guard = Restore { table: self, prev };

        f(&*guard.table)
    }

    fn scope(&self) -> String {
        self.name
            .as_ref()
            .map_or_else(|| "the table".to_string(), |name| format!("table '{name}'"))
    }
}
