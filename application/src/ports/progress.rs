//! Progress notification port
//!
//! Defines the interface for reporting pipeline progress. Implementations
//! live in the presentation layer (console bars, logs, etc.).

use courier_domain::PipelineStage;

/// Callback for progress updates during query processing
pub trait PipelineProgress: Send + Sync {
    /// Called when a pipeline stage starts. `total_units` is the number of
    /// trackable units within the stage (nodes for execution, 1 otherwise).
    fn on_stage_start(&self, stage: &PipelineStage, total_units: usize);

    /// Called when a parallel group begins executing.
    fn on_group_start(&self, _group: u32, _nodes: usize) {}

    /// Called when one node finishes (successfully, failed, or skipped).
    fn on_node_complete(&self, node_id: &str, success: bool);

    /// Called when a pipeline stage completes.
    fn on_stage_complete(&self, stage: &PipelineStage);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl PipelineProgress for NoProgress {
    fn on_stage_start(&self, _stage: &PipelineStage, _total_units: usize) {}
    fn on_node_complete(&self, _node_id: &str, _success: bool) {}
    fn on_stage_complete(&self, _stage: &PipelineStage) {}
}
