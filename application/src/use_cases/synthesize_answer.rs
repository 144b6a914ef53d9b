//! Synthesize answer use case - layer 3.
//!
//! Compresses all node results under the hard prompt ceiling and makes
//! exactly one chat call. Raw item bodies never reach the prompt; only
//! ranked, capped, field-truncated findings do. A model failure here is
//! terminal: there is no partial-answer fallback.

use crate::config::PipelineParams;
use crate::ports::llm_gateway::{ChatMessage, ChatOptions, GatewayError, LlmGateway};
use courier_domain::{
    compress_findings, estimate_tokens, findings_tokens, ExecutionGraph, ExecutionResults,
    SynthesisOutput, SynthesisPrompt,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the synthesis layer. Fatal for the request.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Use case for producing the final user-facing answer.
pub struct SynthesizeAnswerUseCase {
    gateway: Arc<dyn LlmGateway>,
    params: PipelineParams,
}

impl SynthesizeAnswerUseCase {
    pub fn new(gateway: Arc<dyn LlmGateway>, params: PipelineParams) -> Self {
        Self { gateway, params }
    }

    /// Synthesize one answer from the executed graph's results.
    ///
    /// `preferences` overrides the graph's own user preferences when given
    /// (the caller knows the live user better than the decomposition did).
    pub async fn execute(
        &self,
        query: &str,
        graph: &ExecutionGraph,
        results: &ExecutionResults,
        preferences: Option<&str>,
    ) -> Result<SynthesisOutput, SynthesisError> {
        let mut instructions = graph.synthesis_instructions.clone();
        if let Some(preferences) = preferences {
            instructions.user_preferences = Some(preferences.to_string());
        }

        let findings = compress_findings(graph, results, &self.params.compression_budget());
        debug!(
            findings = findings.len(),
            findings_tokens = findings_tokens(&findings),
            "findings compressed"
        );

        let system = SynthesisPrompt::system(&instructions);
        let user = SynthesisPrompt::user(query, &instructions, &findings);
        let prompt_tokens = estimate_tokens(&system) + estimate_tokens(&user);
        debug!(prompt_tokens, "synthesis prompt built");

        let messages = [ChatMessage::system(system), ChatMessage::user(user)];
        let response = self
            .gateway
            .chat(&messages, &ChatOptions::default())
            .await?;

        info!(
            findings = findings.len(),
            tokens = response.tokens_used,
            "answer synthesized"
        );
        Ok(SynthesisOutput::new(
            response.content,
            findings.len(),
            response.tokens_used,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubGateway;
    use courier_domain::{
        Complexity, Domain, ExpectedCost, InformationNode, NodeResult, QueryClassification,
        QueryType, ResourceEstimate, StrategyMethod, StrategySpec, SynthesisInstructions,
    };
    use serde_json::{json, Value};

    fn graph(node_ids: &[&str]) -> ExecutionGraph {
        ExecutionGraph {
            query_classification: QueryClassification {
                query_type: QueryType::Analysis,
                complexity: Complexity::Moderate,
                domains: vec![Domain::Email],
                reasoning: String::new(),
            },
            information_needs: node_ids
                .iter()
                .enumerate()
                .map(|(i, id)| InformationNode {
                    id: id.to_string(),
                    description: format!("finding {id}"),
                    node_type: StrategyMethod::KeywordSearch,
                    strategy: StrategySpec {
                        method: StrategyMethod::KeywordSearch,
                        params: json!({}),
                    },
                    depends_on: vec![],
                    parallel_group: i as u32 + 1,
                    expected_cost: ExpectedCost::default(),
                })
                .collect(),
            synthesis_instructions: SynthesisInstructions {
                task: "answer the question".to_string(),
                ranking_criteria: vec!["urgency".to_string()],
                presentation_format: "short prose".to_string(),
                user_preferences: None,
            },
            resource_estimate: ResourceEstimate::default(),
        }
    }

    fn long_items(count: usize) -> Vec<Value> {
        (0..count)
            .map(|i| {
                json!({
                    "subject": format!("item {i}"),
                    "body": "lorem ipsum ".repeat(400),
                })
            })
            .collect()
    }

    fn use_case(gateway: Arc<StubGateway>) -> SynthesizeAnswerUseCase {
        SynthesizeAnswerUseCase::new(gateway, PipelineParams::default())
    }

    #[tokio::test]
    async fn test_single_chat_call_with_metadata() {
        let gateway = Arc::new(
            StubGateway::default().with_chat_reply("Three urgent emails need replies.", 1_200),
        );
        let g = graph(&["a", "b"]);
        let mut results = ExecutionResults::new();
        results.insert(NodeResult::success("a", json!({"items": long_items(3)}), 500));
        results.insert(NodeResult::success("b", json!({"items": long_items(2)}), 400));

        let output = use_case(gateway.clone())
            .execute("what needs my attention?", &g, &results, None)
            .await
            .unwrap();

        assert_eq!(gateway.chat_calls(), 1);
        assert_eq!(output.metadata.findings_count, 2);
        // Usage of this call only, never cumulative across the request.
        assert_eq!(output.metadata.tokens_used, 1_200);
        assert_eq!(output.message, "Three urgent emails need replies.");
    }

    #[tokio::test]
    async fn test_prompt_under_ceiling_for_heavy_results() {
        let gateway = Arc::new(StubGateway::default());
        let ids: Vec<String> = (0..10).map(|i| format!("n{i}")).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let g = graph(&id_refs);
        let mut results = ExecutionResults::new();
        for id in &ids {
            results.insert(NodeResult::success(
                id.clone(),
                json!({"items": long_items(20)}),
                1_000,
            ));
        }

        use_case(gateway.clone())
            .execute("summarize everything", &g, &results, None)
            .await
            .unwrap();

        let messages = gateway.last_chat_messages().unwrap();
        let prompt_chars: usize = messages.iter().map(|m| m.content.chars().count()).sum();
        assert!(
            prompt_chars / 4 < 20_000,
            "estimated {} tokens",
            prompt_chars / 4
        );
    }

    #[tokio::test]
    async fn test_failed_nodes_not_counted_as_findings() {
        let gateway = Arc::new(StubGateway::default());
        let g = graph(&["a", "b"]);
        let mut results = ExecutionResults::new();
        results.insert(NodeResult::success("a", json!({"items": long_items(1)}), 100));
        results.insert(NodeResult::failure("b", "boom", 0));

        let output = use_case(gateway)
            .execute("what happened?", &g, &results, None)
            .await
            .unwrap();
        assert_eq!(output.metadata.findings_count, 1);
    }

    #[tokio::test]
    async fn test_preferences_reach_the_prompt() {
        let gateway = Arc::new(StubGateway::default());
        let g = graph(&["a"]);
        let mut results = ExecutionResults::new();
        results.insert(NodeResult::success("a", json!({"items": long_items(1)}), 100));

        use_case(gateway.clone())
            .execute("anything new?", &g, &results, Some("one short paragraph"))
            .await
            .unwrap();

        let messages = gateway.last_chat_messages().unwrap();
        assert!(messages[0].content.contains("one short paragraph"));
        assert!(messages[1].content.contains("one short paragraph"));
    }

    #[tokio::test]
    async fn test_idempotent_against_deterministic_stub() {
        let g = graph(&["a"]);
        let mut results = ExecutionResults::new();
        results.insert(NodeResult::success("a", json!({"items": long_items(5)}), 100));

        let first = use_case(Arc::new(StubGateway::default()))
            .execute("q", &g, &results, None)
            .await
            .unwrap();
        let second = use_case(Arc::new(StubGateway::default()))
            .execute("q", &g, &results, None)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_gateway_failure_is_terminal() {
        let g = graph(&["a"]);
        let mut results = ExecutionResults::new();
        results.insert(NodeResult::success("a", json!({"items": long_items(1)}), 100));

        let err = use_case(Arc::new(StubGateway::failing(GatewayError::Timeout)))
            .execute("q", &g, &results, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::Gateway(GatewayError::Timeout)));
    }
}
