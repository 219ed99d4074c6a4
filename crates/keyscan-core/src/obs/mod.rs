//! Observability: scan metrics counters and sink abstractions.
//!
//! Structured log events go through `tracing` directly at the call sites;
//! this module only carries counters.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::ScanCounters;
pub use sink::{
    MetricsSink, ScanEvent, ScanOutcome, metrics_report, metrics_reset_all, with_metrics_sink,
};
pub(crate) use sink::ScanSpan;
