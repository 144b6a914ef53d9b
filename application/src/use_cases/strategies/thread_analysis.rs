//! Thread analysis strategy - batch thread read with field extraction.
//!
//! One model call per thread, never one call for the whole batch: each
//! call's context stays bounded and independently retryable. Threads are
//! processed in sub-batches of `batch_size` concurrent units. A unit that
//! fails (fetch or model call) leaves an inline placeholder and processing
//! continues; the node fails only when every unit failed.

use super::{Strategy, StrategyContext, StrategyError};
use crate::config::PipelineParams;
use crate::ports::llm_gateway::{LlmGateway, StructuredRequest};
use crate::ports::mail_reader::MailReader;
use async_trait::async_trait;
use courier_domain::{
    InformationNode, NodeResult, StrategyMethod, ThreadExtractionPrompt, DEFAULT_EXTRACT_FIELDS,
};
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ThreadAnalysisParams {
    /// Explicit thread ids; when empty, ids are inherited from dependency
    /// results (the usual shape: a search node feeds an analysis node).
    #[serde(default)]
    thread_ids: Vec<String>,
    /// Requested field set; defaults to the standard extraction fields.
    #[serde(default)]
    extract_fields: Vec<String>,
    #[serde(default)]
    batch_size: Option<usize>,
}

/// Analyzes threads one model call at a time with a fixed field set.
pub struct ThreadAnalysisStrategy {
    mail: Arc<dyn MailReader>,
    gateway: Arc<dyn LlmGateway>,
    params: PipelineParams,
}

impl ThreadAnalysisStrategy {
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

    fn placeholder(thread_id: &str, reason: &str) -> Value {
        json!({
            "thread_id": thread_id,
            "error": format!("Error analyzing thread: {reason}"),
        })
    }

    /// Analyze one thread. Returns `(item, tokens_used, ok)`; failures come
    /// back as placeholder items, never as errors.
    async fn analyze_one(&self, thread_id: &str, schema: &Value) -> (Value, u64, bool) {
        let thread = match self.mail.get_thread(thread_id).await {
            Ok(thread) => thread,
            Err(e) => {
                warn!(thread = thread_id, "thread fetch failed: {e}");
                return (Self::placeholder(thread_id, &e.to_string()), 0, false);
            }
        };

        let body_budget = self.params.unit_prompt_chars / self.params.max_messages_per_thread.max(1);
        let prompt = ThreadExtractionPrompt::user(
            &thread,
            self.params.max_messages_per_thread,
            body_budget,
        );
        let request = StructuredRequest::new(prompt, "thread_extraction", schema.clone())
            .with_system(ThreadExtractionPrompt::system())
            .with_max_output_tokens(500);

        match self.gateway.generate_structured(request).await {
            Ok(response) => {
                let mut item = json!({
                    "thread_id": thread.id,
                    "subject": thread.subject,
                });
                if let (Some(target), Some(extracted)) =
                    (item.as_object_mut(), response.value.as_object())
                {
                    for (field, value) in extracted {
                        target.insert(field.clone(), value.clone());
                    }
                }
                (item, response.tokens_used, true)
            }
            Err(e) => {
                warn!(thread = thread_id, "extraction call failed: {e}");
                (Self::placeholder(thread_id, &e.to_string()), 0, false)
            }
        }
    }
}

#[async_trait]
impl Strategy for ThreadAnalysisStrategy {
    fn method(&self) -> StrategyMethod {
        StrategyMethod::ThreadAnalysis
    }

    async fn execute(
        &self,
        node: &InformationNode,
        ctx: &StrategyContext,
    ) -> Result<NodeResult, StrategyError> {
        let params: ThreadAnalysisParams = serde_json::from_value(node.strategy.params.clone())
            .map_err(|e| StrategyError::InvalidParams {
                method: self.method(),
                reason: e.to_string(),
            })?;

        let mut thread_ids = params.thread_ids;
        if thread_ids.is_empty() {
            for item in ctx.dependency_items() {
                if let Some(id) = item.get("thread_id").and_then(Value::as_str) {
                    if !thread_ids.iter().any(|t| t == id) {
                        thread_ids.push(id.to_string());
                    }
                }
            }
        }
        if thread_ids.is_empty() {
            return Err(StrategyError::InvalidParams {
                method: self.method(),
                reason: "no thread ids given and none inherited from dependencies".to_string(),
            });
        }

        let fields: Vec<String> = if params.extract_fields.is_empty() {
            DEFAULT_EXTRACT_FIELDS.iter().map(|f| f.to_string()).collect()
        } else {
            params.extract_fields
        };
        let schema = ThreadExtractionPrompt::schema(&fields);
        let batch_size = params.batch_size.unwrap_or(self.params.batch_size).max(1);

        let mut items = Vec::with_capacity(thread_ids.len());
        let mut tokens_used = 0u64;
        let mut ok_units = 0usize;

        for batch in thread_ids.chunks(batch_size) {
            let outcomes = join_all(batch.iter().map(|id| self.analyze_one(id, &schema))).await;
            for (item, tokens, ok) in outcomes {
                items.push(item);
                tokens_used += tokens;
                if ok {
                    ok_units += 1;
                }
            }
        }

        let failed_units = thread_ids.len() - ok_units;
        debug!(
            node = %node.id,
            threads = thread_ids.len(),
            ok = ok_units,
            failed = failed_units,
            tokens = tokens_used,
            "thread analysis"
        );

        if ok_units == 0 {
            return Ok(NodeResult::failure(
                &node.id,
                format!("all {} threads failed to analyze", thread_ids.len()),
                tokens_used,
            ));
        }

        Ok(NodeResult::success(
            &node.id,
            json!({
                "items": items,
                "threads_analyzed": ok_units,
                "threads_failed": failed_units,
            }),
            tokens_used,
        ))
    }
}
