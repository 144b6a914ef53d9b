//! Logging adapters

mod jsonl_trace;

pub use jsonl_trace::JsonlTraceLogger;
