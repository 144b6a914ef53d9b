//! Decompose query use case - layer 1.
//!
//! One schema-constrained model call turns the query (plus recent
//! conversation) into an execution graph. The decoded value is validated
//! twice: serde enforces field presence and enum membership, then the
//! graph's own structural validation rejects anything that is not a DAG.
//! This use case never retries; retry and backoff live in the gateway
//! adapter.

use crate::ports::llm_gateway::{GatewayError, LlmGateway, StructuredRequest};
use courier_domain::{DecomposePrompt, ExecutionGraph, GraphError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the decomposition layer. All are fatal for the request.
#[derive(Error, Debug)]
pub enum DecomposeError {
    #[error("decomposition output violated the schema: {0}")]
    SchemaViolation(String),

    #[error("decomposition produced an invalid graph: {0}")]
    InvalidGraph(#[from] GraphError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Input for the decompose use case.
#[derive(Debug, Clone, Default)]
pub struct DecomposeQueryInput {
    pub query: String,
    /// Recent conversation turns as `(role, content)`, oldest first.
    pub history: Vec<(String, String)>,
    /// Optional ambient context (timezone, current date, active project).
    pub context: Option<String>,
}

impl DecomposeQueryInput {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            history: Vec::new(),
            context: None,
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
}

/// Output of decomposition: the validated graph and the call's token usage.
#[derive(Debug, Clone)]
pub struct DecomposeOutput {
    pub graph: ExecutionGraph,
    pub tokens_used: u64,
}

/// Use case for decomposing a query into an execution graph.
pub struct DecomposeQueryUseCase {
    gateway: Arc<dyn LlmGateway>,
}

impl DecomposeQueryUseCase {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    pub async fn execute(&self, input: &DecomposeQueryInput) -> Result<DecomposeOutput, DecomposeError> {
        info!("decomposing query into execution graph");

        let request = StructuredRequest::new(
            DecomposePrompt::user(&input.query, &input.history, input.context.as_deref()),
            "execution_graph",
            DecomposePrompt::schema(),
        )
        .with_system(DecomposePrompt::system());

        let response = self.gateway.generate_structured(request).await?;

        let graph: ExecutionGraph = serde_json::from_value(response.value)
            .map_err(|e| DecomposeError::SchemaViolation(e.to_string()))?;

        // Hard correctness gate: a non-DAG never reaches the coordinator.
        graph.validate()?;

        debug!(
            nodes = graph.information_needs.len(),
            complexity = ?graph.query_classification.complexity,
            confirm = graph.resource_estimate.user_should_confirm,
            "graph decomposed"
        );
        Ok(DecomposeOutput {
            graph,
            tokens_used: response.tokens_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::StructuredResponse;
    use crate::test_support::StubGateway;
    use serde_json::json;

    fn valid_graph_value() -> serde_json::Value {
        json!({
            "query_classification": {
                "type": "lookup",
                "complexity": "simple",
                "domains": ["email"],
                "reasoning": "direct search"
            },
            "information_needs": [{
                "id": "find_mail",
                "description": "find urgent mail",
                "type": "keyword_search",
                "strategy": {"method": "keyword_search", "params": {"keywords": ["urgent"]}},
                "depends_on": [],
                "parallel_group": 1,
                "expected_cost": {"tokens": 0, "llm_calls": 0, "time_seconds": 1.0}
            }],
            "synthesis_instructions": {
                "task": "list urgent mail",
                "ranking_criteria": ["urgency"],
                "presentation_format": "bullets"
            },
            "resource_estimate": {
                "total_items_accessed": 50,
                "total_llm_calls": 1,
                "estimated_tokens": 1000,
                "estimated_time_seconds": 2.0,
                "estimated_cost_usd": 0.005,
                "user_should_confirm": false
            }
        })
    }

    #[tokio::test]
    async fn test_valid_output_becomes_graph() {
        let gateway = StubGateway::default().script_structured(Ok(StructuredResponse {
            value: valid_graph_value(),
            tokens_used: 900,
        }));
        let use_case = DecomposeQueryUseCase::new(Arc::new(gateway));
        let output = use_case
            .execute(&DecomposeQueryInput::new("show me urgent emails"))
            .await
            .unwrap();
        assert_eq!(output.graph.information_needs.len(), 1);
        assert_eq!(output.tokens_used, 900);
    }

    #[tokio::test]
    async fn test_unknown_strategy_tag_is_schema_violation() {
        let mut value = valid_graph_value();
        value["information_needs"][0]["type"] = json!("mind_reading");
        value["information_needs"][0]["strategy"]["method"] = json!("mind_reading");
        let gateway = StubGateway::default().script_structured(Ok(StructuredResponse {
            value,
            tokens_used: 100,
        }));
        let use_case = DecomposeQueryUseCase::new(Arc::new(gateway));
        let err = use_case
            .execute(&DecomposeQueryInput::new("anything"))
            .await
            .unwrap_err();
        assert!(matches!(err, DecomposeError::SchemaViolation(_)));
    }

    #[tokio::test]
    async fn test_cyclic_graph_rejected() {
        let mut value = valid_graph_value();
        value["information_needs"][0]["depends_on"] = json!(["find_mail"]);
        let gateway = StubGateway::default().script_structured(Ok(StructuredResponse {
            value,
            tokens_used: 100,
        }));
        let use_case = DecomposeQueryUseCase::new(Arc::new(gateway));
        let err = use_case
            .execute(&DecomposeQueryInput::new("anything"))
            .await
            .unwrap_err();
        assert!(matches!(err, DecomposeError::InvalidGraph(_)));
    }

    #[tokio::test]
    async fn test_gateway_error_propagates() {
        let gateway = StubGateway::failing(GatewayError::Timeout);
        let use_case = DecomposeQueryUseCase::new(Arc::new(gateway));
        let err = use_case
            .execute(&DecomposeQueryInput::new("anything"))
            .await
            .unwrap_err();
        assert!(matches!(err, DecomposeError::Gateway(GatewayError::Timeout)));
    }
}
