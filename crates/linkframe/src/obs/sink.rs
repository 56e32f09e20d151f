//! Event sink boundary.
//!
//! Link, table and resolver code never touch `obs::metrics` directly.
//! All instrumentation flows through `LinkEvent` and `EventSink`.
use crate::obs::metrics;
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn EventSink>>> = RefCell::new(None);
}

///
/// IndexerBuild
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexerBuild {
    /// Built inside `link_to`.
    Eager,
    /// Built on first access.
    Lazy,
    /// Rebuilt by an explicit refresh.
    Refresh,
}

///
/// LinkEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkEvent<'a> {
    LinkDeclared {
        link: &'a str,
        aggregation: bool,
    },
    IndexerBuilt {
        link: &'a str,
        build: IndexerBuild,
        owner_rows: u64,
        unmatched: u64,
    },
    IndexerSliced {
        link: &'a str,
        rows: u64,
    },
    LinkDropped {
        link: &'a str,
    },
    ChainResolved {
        hops: u64,
        rows: u64,
        unmatched: u64,
    },
    Aggregated {
        link: &'a str,
        function: &'a str,
        groups: u64,
    },
}

///
/// EventSink
///

pub trait EventSink {
    fn record(&self, event: &LinkEvent<'_>);
}

/// CountersSink
/// Default sink that folds events into the thread-local counters.

pub(crate) struct CountersSink;

impl EventSink for CountersSink {
    fn record(&self, event: &LinkEvent<'_>) {
        match *event {
            LinkEvent::LinkDeclared { link, aggregation } => {
                metrics::with_state_mut(|m| {
                    m.counters.links_declared = m.counters.links_declared.saturating_add(1);
                    if aggregation {
                        m.counters.aggregating_links =
                            m.counters.aggregating_links.saturating_add(1);
                    }
                    m.links.entry(link.to_string()).or_default();
                });
            }

            LinkEvent::IndexerBuilt {
                link,
                build,
                owner_rows,
                unmatched,
            } => {
                metrics::with_state_mut(|m| {
                    match build {
                        IndexerBuild::Eager => {
                            m.counters.indexers_eager = m.counters.indexers_eager.saturating_add(1);
                        }
                        IndexerBuild::Lazy => {
                            m.counters.indexers_lazy = m.counters.indexers_lazy.saturating_add(1);
                        }
                        IndexerBuild::Refresh => {
                            m.counters.indexers_refreshed =
                                m.counters.indexers_refreshed.saturating_add(1);
                        }
                    }

                    let entry = m.links.entry(link.to_string()).or_default();
                    entry.indexer_builds = entry.indexer_builds.saturating_add(1);
                    entry.owner_rows = owner_rows;
                    entry.unmatched_rows = unmatched;
                });
            }

            LinkEvent::IndexerSliced { link, rows } => {
                metrics::with_state_mut(|m| {
                    m.counters.indexers_sliced = m.counters.indexers_sliced.saturating_add(1);
                    let entry = m.links.entry(link.to_string()).or_default();
                    entry.slices = entry.slices.saturating_add(1);
                    entry.rows_sliced = entry.rows_sliced.saturating_add(rows);
                });
            }

            LinkEvent::LinkDropped { .. } => {
                metrics::with_state_mut(|m| {
                    m.counters.links_dropped = m.counters.links_dropped.saturating_add(1);
                });
            }

            LinkEvent::ChainResolved {
                hops,
                rows,
                unmatched,
            } => {
                metrics::with_state_mut(|m| {
                    m.counters.chains_resolved = m.counters.chains_resolved.saturating_add(1);
                    m.counters.hops_gathered = m.counters.hops_gathered.saturating_add(hops);
                    m.counters.rows_resolved = m.counters.rows_resolved.saturating_add(rows);
                    m.counters.rows_filled = m.counters.rows_filled.saturating_add(unmatched);
                });
            }

            LinkEvent::Aggregated {
                link,
                function,
                groups,
            } => {
                metrics::with_state_mut(|m| {
                    m.counters.aggregations = m.counters.aggregations.saturating_add(1);
                    let entry = m.links.entry(link.to_string()).or_default();
                    entry.aggregations = entry.aggregations.saturating_add(1);
                    entry.groups = groups;
                    let calls = entry.functions.entry(function.to_string()).or_default();
                    *calls = calls.saturating_add(1);
                });
            }
        }
    }
}

pub(crate) fn record(event: &LinkEvent<'_>) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => CountersSink.record(event),
    }
}

/// Snapshot the current counters.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all counters.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary event sink override. The previous sink is
/// restored on every exit, including unwind.
pub fn with_event_sink<T>(sink: Rc<dyn EventSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn EventSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}
