//! Infrastructure layer for courier
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod mailstore;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileCorpusConfig, FileModelConfig,
    FilePipelineConfig,
};
pub use logging::JsonlTraceLogger;
pub use mailstore::{JsonMailStore, MailStoreError};
pub use providers::OpenAiGateway;
