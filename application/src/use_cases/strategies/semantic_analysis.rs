//! Semantic analysis strategy - bounded-batch clustering/summarization.
//!
//! Items come from dependency results (or a search when the node has no
//! dependencies). They are summarized in sub-batches, one model call per
//! batch, each call's prompt bounded by the unit char budget. Batch
//! failures leave placeholders; the node fails only if every batch failed.

use super::{Strategy, StrategyContext, StrategyError};
use crate::config::PipelineParams;
use crate::ports::llm_gateway::{LlmGateway, StructuredRequest};
use crate::ports::mail_reader::MailReader;
use async_trait::async_trait;
use courier_domain::{InformationNode, NodeResult, StrategyMethod};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct SemanticAnalysisParams {
    /// What to look for across the items (e.g. "common requests").
    #[serde(default)]
    focus: Option<String>,
    /// Search query used only when the node has no dependencies to draw from.
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    max_items: Option<usize>,
}

/// Clusters and summarizes retrieved items in bounded batches.
pub struct SemanticAnalysisStrategy {
    mail: Arc<dyn MailReader>,
    gateway: Arc<dyn LlmGateway>,
    params: PipelineParams,
}

impl SemanticAnalysisStrategy {
    pub fn new(
        mail: Arc<dyn MailReader>,
        gateway: Arc<dyn LlmGateway>,
        params: PipelineParams,
    ) -> Self {
        Self {
            mail,
            gateway,
            params,
        }
    }

    fn batch_schema() -> Value {
        json!({
            "type": "object",
            "required": ["themes", "summary"],
            "additionalProperties": false,
            "properties": {
                "themes": {"type": "array", "items": {"type": "string"}},
                "summary": {"type": "string"}
            }
        })
    }

    fn batch_prompt(&self, focus: Option<&str>, batch: &[Value]) -> String {
        let mut prompt = String::from("Cluster these items into themes and summarize them.\n");
        if let Some(focus) = focus {
            prompt.push_str(&format!("Focus on: {focus}\n"));
        }
        prompt.push_str("\nItems:\n");

        let per_item = self.params.unit_prompt_chars / batch.len().max(1);
        for item in batch {
            let rendered = serde_json::to_string(item).unwrap_or_default();
            let bounded: String = rendered.chars().take(per_item).collect();
            prompt.push_str(&format!("- {bounded}\n"));
        }
        prompt
    }

    /// Summarize one batch. Failures come back as `(placeholder, 0, false)`.
    async fn analyze_batch(&self, index: usize, focus: Option<&str>, batch: &[Value]) -> (Value, u64, bool) {
        let request = StructuredRequest::new(
            self.batch_prompt(focus, batch),
            "semantic_batch",
            Self::batch_schema(),
        )
        .with_system("You cluster communication items into concise themes.")
        .with_max_output_tokens(400);

        match self.gateway.generate_structured(request).await {
            Ok(response) => (response.value, response.tokens_used, true),
            Err(e) => {
                warn!(batch = index, "semantic batch failed: {e}");
                (
                    json!({"error": format!("Error analyzing batch {index}: {e}")}),
                    0,
                    false,
                )
            }
        }
    }
}

#[async_trait]
impl Strategy for SemanticAnalysisStrategy {
    fn method(&self) -> StrategyMethod {
        StrategyMethod::SemanticAnalysis
    }

    async fn execute(
        &self,
        node: &InformationNode,
        ctx: &StrategyContext,
    ) -> Result<NodeResult, StrategyError> {
        let params: SemanticAnalysisParams = serde_json::from_value(node.strategy.params.clone())
            .map_err(|e| StrategyError::InvalidParams {
                method: self.method(),
                reason: e.to_string(),
            })?;

        let mut items = ctx.dependency_items();
        if items.is_empty() {
            if let Some(query) = &params.query {
                let hits = self.mail.search(query, self.params.search_limit).await?;
                items = hits
                    .iter()
                    .map(|h| serde_json::to_value(h).unwrap_or(Value::Null))
                    .collect();
            }
        }
        if items.is_empty() {
            return Ok(NodeResult::success(
                &node.id,
                json!({"themes": [], "summary": "no items to analyze", "items_considered": 0}),
                0,
            ));
        }

        let max_items = params.max_items.unwrap_or(30);
        items.truncate(max_items);

        let mut themes: Vec<Value> = Vec::new();
        let mut summaries: Vec<String> = Vec::new();
        let mut notes: Vec<Value> = Vec::new();
        let mut tokens_used = 0u64;
        let mut ok_batches = 0usize;
        let mut total_batches = 0usize;

        for (index, batch) in items.chunks(self.params.batch_size).enumerate() {
            total_batches += 1;
            let (value, tokens, ok) =
                self.analyze_batch(index, params.focus.as_deref(), batch).await;
            tokens_used += tokens;
            if ok {
                ok_batches += 1;
                if let Some(batch_themes) = value.get("themes").and_then(Value::as_array) {
                    for theme in batch_themes {
                        if !themes.contains(theme) {
                            themes.push(theme.clone());
                        }
                    }
                }
                if let Some(summary) = value.get("summary").and_then(Value::as_str) {
                    summaries.push(summary.to_string());
                }
            } else {
                notes.push(value);
            }
        }

        debug!(
            node = %node.id,
            items = items.len(),
            batches = total_batches,
            ok = ok_batches,
            "semantic analysis"
        );

        if ok_batches == 0 {
            return Ok(NodeResult::failure(
                &node.id,
                format!("all {total_batches} analysis batches failed"),
                tokens_used,
            ));
        }

        Ok(NodeResult::success(
            &node.id,
            json!({
                "themes": themes,
                "summary": summaries.join(" "),
                "items_considered": items.len(),
                "batches": total_batches,
                "errors": notes,
            }),
            tokens_used,
        ))
    }
}
