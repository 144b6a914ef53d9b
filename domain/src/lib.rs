//! Domain layer for courier
//!
//! This crate contains the core data model and algorithms for answering
//! natural-language questions over a communication corpus. It has no
//! dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Execution Graph
//!
//! A query is decomposed into an [`ExecutionGraph`]: a DAG of
//! [`InformationNode`]s, each describing one unit of retrieval or analysis
//! work with declared dependencies and an expected cost. Nodes sharing a
//! `parallel_group` are eligible to run concurrently.
//!
//! ## Bounded Context
//!
//! Every model call made on behalf of a graph must keep its input under a
//! fixed token ceiling regardless of how much data was retrieved upstream.
//! The [`synthesis`] module implements the ranking, truncation, and capping
//! that make the final answer prompt respect that ceiling.

pub mod core;
pub mod corpus;
pub mod execution;
pub mod graph;
pub mod prompt;
pub mod synthesis;

// Re-export commonly used types
pub use crate::core::token::{estimate_tokens, estimate_value_tokens};
pub use corpus::entities::{CalendarEvent, MailItem, Message, Participant, Thread, TimeRange};
pub use execution::value_objects::{ExecutionResults, NodeResult, PipelineStage};
pub use graph::{
    entities::{
        Complexity, Domain, ExecutionGraph, ExpectedCost, InformationNode, QueryClassification,
        QueryType, ResourceEstimate, StrategySpec, SynthesisInstructions,
    },
    strategy_method::StrategyMethod,
    validation::GraphError,
};
pub use prompt::{
    decompose::DecomposePrompt,
    extraction::{ThreadExtractionPrompt, DEFAULT_EXTRACT_FIELDS},
    synthesis::SynthesisPrompt,
};
pub use synthesis::{
    compression::{compress_findings, findings_tokens, CompressedFinding, CompressionBudget},
    value_objects::{SynthesisMetadata, SynthesisOutput},
};
