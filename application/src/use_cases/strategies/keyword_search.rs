//! Keyword search strategy - pure filter over mail search, no model calls.

use super::{Strategy, StrategyContext, StrategyError};
use crate::ports::mail_reader::MailReader;
use async_trait::async_trait;
use courier_domain::{InformationNode, MailItem, NodeResult, StrategyMethod};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct KeywordSearchParams {
    keywords: Vec<String>,
    #[serde(default)]
    limit: Option<usize>,
}

/// Searches mail and keeps items matching any of the given keywords.
pub struct KeywordSearchStrategy {
    mail: Arc<dyn MailReader>,
    default_limit: usize,
}

impl KeywordSearchStrategy {
    pub fn new(mail: Arc<dyn MailReader>, default_limit: usize) -> Self {
        Self {
            mail,
            default_limit,
        }
    }

    fn matches(item: &MailItem, keywords: &[String]) -> bool {
        let haystack = format!("{} {}", item.subject, item.snippet).to_lowercase();
        keywords
            .iter()
            .any(|k| haystack.contains(&k.to_lowercase()))
    }
}

#[async_trait]
impl Strategy for KeywordSearchStrategy {
    fn method(&self) -> StrategyMethod {
        StrategyMethod::KeywordSearch
    }

    async fn execute(
        &self,
        node: &InformationNode,
        _ctx: &StrategyContext,
    ) -> Result<NodeResult, StrategyError> {
        let params: KeywordSearchParams = serde_json::from_value(node.strategy.params.clone())
            .map_err(|e| StrategyError::InvalidParams {
                method: self.method(),
                reason: e.to_string(),
            })?;

        if params.keywords.is_empty() {
            return Err(StrategyError::InvalidParams {
                method: self.method(),
                reason: "keywords must be non-empty".to_string(),
            });
        }

        let limit = params.limit.unwrap_or(self.default_limit);
        let query = params.keywords.join(" ");
        let hits = self.mail.search(&query, limit).await?;

        let matched: Vec<&MailItem> = hits
            .iter()
            .filter(|item| Self::matches(item, &params.keywords))
            .collect();
        let matched_count = matched.len();
        debug!(
            node = %node.id,
            searched = hits.len(),
            matched = matched_count,
            "keyword search"
        );

        Ok(NodeResult::success(
            &node.id,
            json!({
                "items": matched,
                "searched": hits.len(),
                "matched": matched_count,
            }),
            0,
        ))
    }
}
