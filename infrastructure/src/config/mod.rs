//! Configuration loading and validation

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileCorpusConfig, FileLoggingConfig, FileModelConfig,
    FilePipelineConfig,
};
pub use loader::ConfigLoader;
