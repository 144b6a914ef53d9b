//! Strategies - pluggable retrieval/analysis techniques, one per node type.
//!
//! Every strategy honors the same contract:
//!
//! - it bounds its own work (sub-batches, per-unit prompt budgets)
//! - a failing unit becomes an inline error placeholder, not a node failure
//! - only a total failure (every unit, or the backing service itself)
//!   surfaces as an unsuccessful result
//!
//! The registry is keyed by [`StrategyMethod`], so an unknown tag can never
//! reach dispatch: decode rejects it first, and a method missing from the
//! registry is a configuration error reported by the coordinator.

mod cross_reference;
mod keyword_search;
mod metadata_filter;
mod semantic_analysis;
mod thread_analysis;

pub use cross_reference::CrossReferenceStrategy;
pub use keyword_search::KeywordSearchStrategy;
pub use metadata_filter::MetadataFilterStrategy;
pub use semantic_analysis::SemanticAnalysisStrategy;
pub use thread_analysis::ThreadAnalysisStrategy;

use crate::config::PipelineParams;
use crate::ports::calendar_reader::CalendarReader;
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::mail_reader::{MailReader, ServiceError};
use async_trait::async_trait;
use courier_domain::{InformationNode, NodeResult, StrategyMethod};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors a strategy can raise for the node as a whole.
///
/// Unit-level failures never appear here; they are absorbed into the result
/// payload as placeholders.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("invalid params for {method}: {reason}")]
    InvalidParams {
        method: StrategyMethod,
        reason: String,
    },

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Per-node execution context handed to a strategy by the coordinator.
#[derive(Debug, Clone, Default)]
pub struct StrategyContext {
    pub user_id: String,
    /// Results of this node's `depends_on` entries, all present and final
    /// by the time the strategy runs.
    pub dependencies: HashMap<String, NodeResult>,
}

impl StrategyContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            dependencies: HashMap::new(),
        }
    }

    pub fn with_dependency(mut self, result: NodeResult) -> Self {
        self.dependencies.insert(result.node_id.clone(), result);
        self
    }

    /// All items carried by dependency payloads, in dependency-id order.
    pub fn dependency_items(&self) -> Vec<serde_json::Value> {
        let mut ids: Vec<&String> = self.dependencies.keys().collect();
        ids.sort();
        let mut items = Vec::new();
        for id in ids {
            let result = &self.dependencies[id];
            if let Some(array) = result.data.get("items").and_then(|v| v.as_array()) {
                items.extend(array.iter().cloned());
            }
        }
        items
    }
}

/// A pluggable retrieval/analysis technique.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// The method tag this strategy executes.
    fn method(&self) -> StrategyMethod;

    /// Execute one node. `Err` means the node failed wholesale (the
    /// coordinator records it as a failed result); partial unit failures
    /// must be returned as placeholders inside an `Ok` result.
    async fn execute(
        &self,
        node: &InformationNode,
        ctx: &StrategyContext,
    ) -> Result<NodeResult, StrategyError>;
}

/// Registry of strategies keyed by method tag.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: HashMap<StrategyMethod, Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy under its own method tag.
    pub fn register(mut self, strategy: Arc<dyn Strategy>) -> Self {
        self.strategies.insert(strategy.method(), strategy);
        self
    }

    pub fn get(&self, method: StrategyMethod) -> Option<Arc<dyn Strategy>> {
        self.strategies.get(&method).cloned()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// The full catalogue wired against the given collaborators.
    pub fn full(
        mail: Arc<dyn MailReader>,
        calendar: Arc<dyn CalendarReader>,
        gateway: Arc<dyn LlmGateway>,
        params: &PipelineParams,
    ) -> Self {
        Self::new()
            .register(Arc::new(KeywordSearchStrategy::new(
                Arc::clone(&mail),
                params.search_limit,
            )))
            .register(Arc::new(MetadataFilterStrategy::new(
                Arc::clone(&mail),
                Arc::clone(&calendar),
                params.search_limit,
            )))
            .register(Arc::new(ThreadAnalysisStrategy::new(
                Arc::clone(&mail),
                Arc::clone(&gateway),
                params.clone(),
            )))
            .register(Arc::new(SemanticAnalysisStrategy::new(
                mail,
                gateway,
                params.clone(),
            )))
            .register(Arc::new(CrossReferenceStrategy::new()))
    }
}
