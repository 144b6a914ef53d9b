//! Port for structured pipeline tracing.
//!
//! Separate from `tracing`-based operation logs: tracing carries
//! human-readable diagnostics, while this port captures a machine-readable
//! record of what each request did (the graph produced, per-node outcomes,
//! synthesis usage) for later inspection.

use serde_json::Value;

/// A structured trace event.
pub struct TraceEvent {
    /// Event type identifier (e.g. "graph_decomposed", "node_completed").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl TraceEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for recording trace events.
///
/// `record` is intentionally synchronous and non-fallible so tracing can
/// never disrupt the pipeline; adapters swallow their own write errors.
pub trait TraceLogger: Send + Sync {
    fn record(&self, event: TraceEvent);
}

/// No-op implementation for tests and when tracing is disabled.
pub struct NoTraceLogger;

impl TraceLogger for NoTraceLogger {
    fn record(&self, _event: TraceEvent) {}
}
