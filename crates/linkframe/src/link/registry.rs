use crate::{
    link::LinkSpec,
    obs::sink::{self, LinkEvent},
    table::Table,
};
use std::{collections::BTreeMap, rc::Rc};

///
/// LinkRegistry
///
/// Per-table map from link name to `LinkSpec`. Owned by exactly one table;
/// cloning the registry copies every spec, so two tables never share an
/// indexer cache.
///

#[derive(Debug, Default)]
pub struct LinkRegistry {
    links: BTreeMap<String, Rc<LinkSpec>>,
}

impl Clone for LinkRegistry {
    fn clone(&self) -> Self {
        let links = self
            .links
            .iter()
            .map(|(name, spec)| (name.clone(), Rc::new(spec.copy(None))))
            .collect();

        Self { links }
    }
}

impl LinkRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rc<LinkSpec>> {
        self.links.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.links.contains_key(name)
    }

    /// Link names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.links.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rc<LinkSpec>)> {
        self.links.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Register a spec under its name, replacing any previous entry.
    pub(crate) fn insert(&mut self, spec: LinkSpec) -> Option<Rc<LinkSpec>> {
        self.links.insert(spec.name().to_string(), Rc::new(spec))
    }

    /// Install a copy of every link on `derived`. With a row subset, cached
    /// indexers are re-sliced by the same positions `derived` was built from.
    pub fn copy_into(&self, derived: &mut Table, subset: Option<&[usize]>) {
        let links = self
            .links
            .iter()
            .map(|(name, spec)| (name.clone(), Rc::new(spec.copy(subset))))
            .collect();

        derived.replace_links(Self { links });
    }

    /// Drop links whose owner key reads columns `table` no longer has.
    /// Used when building a column projection; the loss is silent apart
    /// from a `LinkDropped` event.
    pub fn retain_satisfied(&mut self, table: &Table) {
        self.links.retain(|name, spec| {
            let keep = spec.owner_selector().is_satisfied_by(table);
            if !keep {
                sink::record(&LinkEvent::LinkDropped { link: name });
            }
            keep
        });
    }
}
