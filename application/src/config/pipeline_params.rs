//! Pipeline parameters - resource bounds for one request.
//!
//! [`PipelineParams`] groups the static bounds the use cases enforce:
//! in-flight concurrency, per-strategy batch sizes, per-unit prompt budgets,
//! and the synthesis compression budget. These are application-layer
//! concerns, not domain policy.

use courier_domain::CompressionBudget;
use serde::{Deserialize, Serialize};

/// Static resource bounds applied to every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineParams {
    /// Maximum nodes executing concurrently within a parallel group.
    pub max_in_flight: usize,
    /// Sub-batch size for batch-style strategies (units in flight per batch).
    pub batch_size: usize,
    /// Char budget for one unit's prompt (one thread, one semantic batch).
    /// ~6,000 chars keeps each call near 1,500 tokens.
    pub unit_prompt_chars: usize,
    /// Most recent messages included per analyzed thread.
    pub max_messages_per_thread: usize,
    /// Default result limit for search-backed strategies.
    pub search_limit: usize,
    /// Hard ceiling (estimated tokens) for the synthesis prompt.
    pub max_synthesis_prompt_tokens: u64,
    /// Initial top-N items per finding before ceiling degradation.
    pub top_items_per_finding: usize,
    /// Char budget for every free-text field in the synthesis prompt.
    pub text_budget_chars: usize,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            max_in_flight: 4,
            batch_size: 5,
            unit_prompt_chars: 6_000,
            max_messages_per_thread: 6,
            search_limit: 50,
            max_synthesis_prompt_tokens: 16_000,
            top_items_per_finding: 10,
            text_budget_chars: 120,
        }
    }
}

impl PipelineParams {
    // ==================== Builder Methods ====================

    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max.max(1);
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit.max(1);
        self
    }

    pub fn with_unit_prompt_chars(mut self, chars: usize) -> Self {
        self.unit_prompt_chars = chars.max(1);
        self
    }

    pub fn with_max_messages_per_thread(mut self, max: usize) -> Self {
        self.max_messages_per_thread = max.max(1);
        self
    }

    pub fn with_top_items_per_finding(mut self, top: usize) -> Self {
        self.top_items_per_finding = top.max(1);
        self
    }

    pub fn with_text_budget_chars(mut self, chars: usize) -> Self {
        self.text_budget_chars = chars.max(1);
        self
    }

    pub fn with_max_synthesis_prompt_tokens(mut self, max: u64) -> Self {
        self.max_synthesis_prompt_tokens = max;
        self
    }

    /// The domain-level compression budget derived from these params.
    pub fn compression_budget(&self) -> CompressionBudget {
        CompressionBudget {
            max_prompt_tokens: self.max_synthesis_prompt_tokens,
            top_items_per_finding: self.top_items_per_finding,
            text_budget_chars: self.text_budget_chars,
        }
    }
}
