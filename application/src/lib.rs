//! Application layer for courier
//!
//! This crate contains use cases, port definitions, and application
//! configuration. It depends only on the domain layer.
//!
//! The pipeline is three use cases composed by a fourth:
//!
//! 1. [`DecomposeQueryUseCase`] - one schema-constrained model call turns the
//!    query into an [`ExecutionGraph`](courier_domain::ExecutionGraph)
//! 2. [`ExecuteGraphUseCase`] - runs the graph group-by-group against the
//!    registered strategies under a bounded in-flight count
//! 3. [`SynthesizeAnswerUseCase`] - compresses all results and makes exactly
//!    one final model call
//!
//! [`ProcessQueryUseCase`] sequences the three and reports per-layer metrics.

pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::PipelineParams;
pub use ports::{
    calendar_reader::CalendarReader,
    llm_gateway::{
        ChatMessage, ChatOptions, ChatResponse, GatewayError, LlmGateway, Role,
        StructuredRequest, StructuredResponse,
    },
    mail_reader::{MailReader, ServiceError},
    progress::{NoProgress, PipelineProgress},
    trace_logger::{NoTraceLogger, TraceEvent, TraceLogger},
};
pub use use_cases::decompose_query::{
    DecomposeError, DecomposeOutput, DecomposeQueryInput, DecomposeQueryUseCase,
};
pub use use_cases::execute_graph::{CoordinatorError, ExecuteGraphUseCase};
pub use use_cases::process_query::{
    LayerMetrics, ProcessQueryError, ProcessQueryInput, ProcessQueryUseCase, QueryOutcome,
    QueryResponse, ResponseMetadata,
};
pub use use_cases::strategies::{Strategy, StrategyContext, StrategyError, StrategyRegistry};
pub use use_cases::synthesize_answer::{SynthesisError, SynthesizeAnswerUseCase};
