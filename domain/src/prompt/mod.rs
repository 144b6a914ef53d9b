//! Prompt templates and structured-output schemas for each pipeline stage.

pub mod decompose;
pub mod extraction;
pub mod synthesis;
