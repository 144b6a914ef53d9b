//! Execution value objects - immutable results of running graph nodes.
//!
//! - [`NodeResult`] - outcome of one information node
//! - [`ExecutionResults`] - the request-scoped `node_id -> NodeResult` map
//! - [`PipelineStage`] - the three layers of the pipeline, for progress and metrics

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::hash_map;
use std::collections::HashMap;

/// The three layers a request flows through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Decompose,
    Execute,
    Synthesize,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Decompose => "decompose",
            PipelineStage::Execute => "execute",
            PipelineStage::Synthesize => "synthesize",
        }
    }
}

/// Outcome of executing one information node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResult {
    pub node_id: String,
    pub success: bool,
    /// Strategy-specific payload. Empty object for failed nodes.
    pub data: Value,
    pub tokens_used: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeResult {
    /// A successful result carrying a strategy payload.
    pub fn success(node_id: impl Into<String>, data: Value, tokens_used: u64) -> Self {
        Self {
            node_id: node_id.into(),
            success: true,
            data,
            tokens_used,
            error: None,
        }
    }

    /// A failed result. `tokens_used` may be non-zero when the failure
    /// happened after some model calls were already spent.
    pub fn failure(node_id: impl Into<String>, error: impl Into<String>, tokens_used: u64) -> Self {
        Self {
            node_id: node_id.into(),
            success: false,
            data: Value::Object(Default::default()),
            tokens_used,
            error: Some(error.into()),
        }
    }

    /// A node skipped because one of its dependencies failed.
    pub fn skipped(node_id: impl Into<String>, failed_dependency: &str) -> Self {
        Self::failure(
            node_id,
            format!("skipped: dependency {failed_dependency} failed"),
            0,
        )
    }

    /// Whether this result was recorded as skipped-by-dependency.
    pub fn is_skipped(&self) -> bool {
        self.error
            .as_deref()
            .is_some_and(|e| e.starts_with("skipped:"))
    }
}

/// Results of one graph execution, keyed by node id.
///
/// Keys are unique; iteration order carries no meaning beyond completion
/// order. The map lives for one request and is read once by synthesis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionResults {
    results: HashMap<String, NodeResult>,
    /// Number of parallel groups (barriers) the coordinator ran.
    pub groups_executed: u32,
}

impl ExecutionResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, result: NodeResult) {
        self.results.insert(result.node_id.clone(), result);
    }

    pub fn get(&self, node_id: &str) -> Option<&NodeResult> {
        self.results.get(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.results.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, NodeResult> {
        self.results.iter()
    }

    /// Sum of `tokens_used` across all recorded nodes.
    pub fn total_tokens(&self) -> u64 {
        self.results.values().map(|r| r.tokens_used).sum()
    }

    /// Successful results only, in no particular order.
    pub fn successes(&self) -> impl Iterator<Item = &NodeResult> {
        self.results.values().filter(|r| r.success)
    }

    /// Whether the named dependency completed successfully.
    pub fn dependency_succeeded(&self, node_id: &str) -> bool {
        self.get(node_id).map(|r| r.success).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_has_no_error() {
        let r = NodeResult::success("n1", json!({"items": []}), 42);
        assert!(r.success);
        assert!(r.error.is_none());
        assert_eq!(r.tokens_used, 42);
    }

    #[test]
    fn test_skipped_is_failure_with_reason() {
        let r = NodeResult::skipped("n2", "n1");
        assert!(!r.success);
        assert!(r.is_skipped());
        assert_eq!(r.error.as_deref(), Some("skipped: dependency n1 failed"));
    }

    #[test]
    fn test_total_tokens_sums_all_nodes() {
        let mut results = ExecutionResults::new();
        results.insert(NodeResult::success("a", json!({}), 100));
        results.insert(NodeResult::failure("b", "boom", 30));
        assert_eq!(results.total_tokens(), 130);
        assert_eq!(results.len(), 2);
        assert_eq!(results.successes().count(), 1);
    }

    #[test]
    fn test_insert_is_keyed_by_node_id() {
        let mut results = ExecutionResults::new();
        results.insert(NodeResult::success("a", json!({"v": 1}), 1));
        results.insert(NodeResult::success("a", json!({"v": 2}), 2));
        assert_eq!(results.len(), 1);
        assert_eq!(results.get("a").unwrap().data["v"], 2);
    }
}
