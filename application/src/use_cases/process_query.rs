//! Process query use case - the orchestrator.
//!
//! Sequences decomposition, execution, and synthesis, accumulating
//! per-layer wall-clock and token metrics. When the decomposition marks the
//! plan as needing confirmation, the request short-circuits before layer 2
//! and returns the estimate; the confirmation UX itself belongs to the
//! caller.

use crate::ports::progress::PipelineProgress;
use crate::ports::trace_logger::{TraceEvent, TraceLogger};
use crate::use_cases::decompose_query::{
    DecomposeError, DecomposeQueryInput, DecomposeQueryUseCase,
};
use crate::use_cases::execute_graph::{CoordinatorError, ExecuteGraphUseCase};
use crate::use_cases::synthesize_answer::{SynthesisError, SynthesizeAnswerUseCase};
use courier_domain::{PipelineStage, ResourceEstimate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

/// Errors from any pipeline layer, all fatal: the caller receives either a
/// complete answer or an explicit failure, never a silently partial one.
#[derive(Error, Debug)]
pub enum ProcessQueryError {
    #[error("decomposition failed: {0}")]
    Decompose(#[from] DecomposeError),

    #[error("execution failed: {0}")]
    Execute(#[from] CoordinatorError),

    #[error("synthesis failed: {0}")]
    Synthesize(#[from] SynthesisError),
}

/// Input for one query.
#[derive(Debug, Clone)]
pub struct ProcessQueryInput {
    pub query: String,
    pub user_id: String,
    /// Recent conversation as `(role, content)`, oldest first.
    pub history: Vec<(String, String)>,
    pub context: Option<String>,
    /// Answer preferences (tone/format/verbosity) for synthesis.
    pub preferences: Option<String>,
    /// When true, execute even if the plan asks for confirmation.
    pub confirmed: bool,
}

impl ProcessQueryInput {
    pub fn new(query: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            user_id: user_id.into(),
            history: Vec::new(),
            context: None,
            preferences: None,
            confirmed: false,
        }
    }

    pub fn with_history(mut self, history: Vec<(String, String)>) -> Self {
        self.history = history;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_preferences(mut self, preferences: impl Into<String>) -> Self {
        self.preferences = Some(preferences.into());
        self
    }

    pub fn confirmed(mut self) -> Self {
        self.confirmed = true;
        self
    }
}

/// Per-layer timing and token usage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerMetrics {
    pub layer1_time_ms: u64,
    pub layer1_tokens: u64,
    pub layer2_time_ms: u64,
    pub layer2_tokens: u64,
    /// Number of parallel groups (barriers) layer 2 ran.
    pub layer2_stages: u32,
    pub layer3_time_ms: u64,
    pub layer3_tokens: u64,
}

/// Request-level metadata attached to every answer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Total tokens across all three layers.
    pub tokens_used: u64,
    pub layers: LayerMetrics,
}

/// A complete, synthesized answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub success: bool,
    pub message: String,
    pub metadata: ResponseMetadata,
}

/// Outcome of processing one query.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    /// The full pipeline ran; here is the answer.
    Answer(QueryResponse),
    /// The plan wants user confirmation before executing. Re-run with
    /// `confirmed` set to proceed.
    ConfirmationNeeded {
        estimate: ResourceEstimate,
        tokens_used: u64,
    },
}

/// Use case composing the three pipeline layers.
pub struct ProcessQueryUseCase {
    decomposer: DecomposeQueryUseCase,
    coordinator: ExecuteGraphUseCase,
    synthesizer: SynthesizeAnswerUseCase,
    trace: Arc<dyn TraceLogger>,
}

impl ProcessQueryUseCase {
    pub fn new(
        decomposer: DecomposeQueryUseCase,
        coordinator: ExecuteGraphUseCase,
        synthesizer: SynthesizeAnswerUseCase,
        trace: Arc<dyn TraceLogger>,
    ) -> Self {
        Self {
            decomposer,
            coordinator,
            synthesizer,
            trace,
        }
    }

    pub async fn execute(
        &self,
        input: ProcessQueryInput,
        progress: &dyn PipelineProgress,
    ) -> Result<QueryOutcome, ProcessQueryError> {
        let mut layers = LayerMetrics::default();

        // Layer 1: decomposition
        progress.on_stage_start(&PipelineStage::Decompose, 1);
        let started = Instant::now();
        let decomposed = self
            .decomposer
            .execute(
                &DecomposeQueryInput {
                    query: input.query.clone(),
                    history: input.history.clone(),
                    context: input.context.clone(),
                },
            )
            .await?;
        layers.layer1_time_ms = started.elapsed().as_millis() as u64;
        layers.layer1_tokens = decomposed.tokens_used;
        progress.on_stage_complete(&PipelineStage::Decompose);

        let graph = decomposed.graph;
        self.trace.record(TraceEvent::new(
            "graph_decomposed",
            json!({
                "query": input.query,
                "nodes": graph.information_needs.len(),
                "classification": graph.query_classification,
                "estimate": graph.resource_estimate,
                "tokens_used": decomposed.tokens_used,
            }),
        ));

        if graph.resource_estimate.user_should_confirm && !input.confirmed {
            warn!(
                estimated_tokens = graph.resource_estimate.estimated_tokens,
                "plan requires confirmation, short-circuiting before execution"
            );
            return Ok(QueryOutcome::ConfirmationNeeded {
                estimate: graph.resource_estimate.clone(),
                tokens_used: decomposed.tokens_used,
            });
        }

        // Layer 2: graph execution
        progress.on_stage_start(&PipelineStage::Execute, graph.information_needs.len());
        let started = Instant::now();
        let results = self
            .coordinator
            .execute(&graph, &input.user_id, progress)
            .await?;
        layers.layer2_time_ms = started.elapsed().as_millis() as u64;
        layers.layer2_tokens = results.total_tokens();
        layers.layer2_stages = results.groups_executed;
        progress.on_stage_complete(&PipelineStage::Execute);

        for (node_id, result) in results.iter() {
            self.trace.record(TraceEvent::new(
                "node_completed",
                json!({
                    "node_id": node_id,
                    "success": result.success,
                    "tokens_used": result.tokens_used,
                    "error": result.error,
                }),
            ));
        }

        // Layer 3: synthesis
        progress.on_stage_start(&PipelineStage::Synthesize, 1);
        let started = Instant::now();
        let output = self
            .synthesizer
            .execute(
                &input.query,
                &graph,
                &results,
                input.preferences.as_deref(),
            )
            .await?;
        layers.layer3_time_ms = started.elapsed().as_millis() as u64;
        layers.layer3_tokens = output.metadata.tokens_used;
        progress.on_stage_complete(&PipelineStage::Synthesize);

        self.trace.record(TraceEvent::new(
            "answer_synthesized",
            json!({
                "findings_count": output.metadata.findings_count,
                "tokens_used": output.metadata.tokens_used,
            }),
        ));

        let tokens_used = layers.layer1_tokens + layers.layer2_tokens + layers.layer3_tokens;
        info!(
            tokens_used,
            findings = output.metadata.findings_count,
            "query processed"
        );
        Ok(QueryOutcome::Answer(QueryResponse {
            success: true,
            message: output.message,
            metadata: ResponseMetadata {
                tokens_used,
                layers,
            },
        }))
    }
}
