use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for link operations.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventState {
    pub counters: LinkCounters,
    pub links: BTreeMap<String, LinkActivity>,
}

///
/// LinkCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct LinkCounters {
    // Declarations
    pub links_declared: u64,
    pub aggregating_links: u64,
    pub links_dropped: u64,

    // Indexers
    pub indexers_eager: u64,
    pub indexers_lazy: u64,
    pub indexers_refreshed: u64,
    pub indexers_sliced: u64,

    // Resolution
    pub chains_resolved: u64,
    pub hops_gathered: u64,
    pub rows_resolved: u64,
    pub rows_filled: u64,
    pub aggregations: u64,
}

///
/// LinkActivity
/// Per-link-name counters; links with the same name on different tables
/// share one entry.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct LinkActivity {
    pub indexer_builds: u64,
    pub owner_rows: u64,
    pub unmatched_rows: u64,
    pub slices: u64,
    pub rows_sliced: u64,
    pub aggregations: u64,
    pub groups: u64,
    pub functions: BTreeMap<String, u64>,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow counters immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow counters mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters (useful in tests).
pub fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    pub counters: LinkCounters,
    pub links: BTreeMap<String, LinkActivity>,
    /// Share of owner rows left unmatched by the last indexer of each link.
    pub unmatched_share: BTreeMap<String, f64>,
}

/// Build a report from the in-memory counters.
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub fn report() -> EventReport {
    let snap = with_state(Clone::clone);

    let unmatched_share = snap
        .links
        .iter()
        .filter(|(_, activity)| activity.owner_rows > 0)
        .map(|(name, activity)| {
            (
                name.clone(),
                activity.unmatched_rows as f64 / activity.owner_rows as f64,
            )
        })
        .collect();

    EventReport {
        counters: snap.counters,
        links: snap.links,
        unmatched_share,
    }
}
