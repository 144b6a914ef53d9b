//! Ports - interfaces the application layer consumes.
//!
//! Implementations (adapters) live in the infrastructure layer and are
//! injected at construction time.

pub mod calendar_reader;
pub mod llm_gateway;
pub mod mail_reader;
pub mod progress;
pub mod trace_logger;
