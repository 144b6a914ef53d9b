//! Application configuration

pub mod pipeline_params;

pub use pipeline_params::PipelineParams;
