use crate::key::Key;
use std::collections::{HashMap, HashSet, hash_map::Entry};

///
/// KeyPositions
///
/// Hash lookup from key to its first position in a key sequence.
///

pub(crate) struct KeyPositions<'a> {
    positions: HashMap<&'a Key, usize>,
}

impl<'a> KeyPositions<'a> {
    pub(crate) fn first_positions(keys: &'a [Key]) -> Self {
        let mut positions = HashMap::with_capacity(keys.len());
        for (pos, key) in keys.iter().enumerate() {
            positions.entry(key).or_insert(pos);
        }

        Self { positions }
    }

    pub(crate) fn get(&self, key: &Key) -> Option<usize> {
        self.positions.get(key).copied()
    }
}

/// True when no key appears twice.
pub(crate) fn is_unique(keys: &[Key]) -> bool {
    let mut seen = HashSet::with_capacity(keys.len());
    keys.iter().all(|key| seen.insert(key))
}

/// Factorize keys into one group code per key plus the distinct keys.
///
/// Codes follow first-appearance order, so `uniques[codes[i]] == keys[i]`.
pub(crate) fn factorize(keys: &[Key]) -> (Vec<usize>, Vec<Key>) {
    let mut lookup: HashMap<&Key, usize> = HashMap::new();
    let mut uniques = Vec::new();
    let mut codes = Vec::with_capacity(keys.len());

    for key in keys {
        let code = match lookup.entry(key) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                uniques.push(key.clone());
                *entry.insert(uniques.len() - 1)
            }
        };
        codes.push(code);
    }

    (codes, uniques)
}
