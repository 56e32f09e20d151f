//! Observability: link counters and the event sink abstraction.
//!
//! This module never inspects tables or links; it only receives events.

pub mod metrics;
pub mod sink;

// re-exports
pub use metrics::{EventReport, LinkActivity, LinkCounters};
pub use sink::{EventSink, IndexerBuild, LinkEvent, metrics_report, metrics_reset_all, with_event_sink};
