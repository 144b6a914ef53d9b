//! Strategy method tags
//!
//! Every information node names the retrieval/analysis technique that will
//! execute it. The tag set is closed: an unknown tag fails at decode time,
//! long before dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The retrieval/analysis technique backing an information node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyMethod {
    /// Pure keyword filter over mail search results. No model calls.
    KeywordSearch,
    /// Pure metadata filter (sender, unread, flagged, date range). No model calls.
    MetadataFilter,
    /// Batch thread read: one model call per thread with fixed field extraction.
    ThreadAnalysis,
    /// Bounded-batch clustering/summarization of retrieved items.
    SemanticAnalysis,
    /// Pure join over prior nodes' results (e.g. attendees x senders).
    CrossReference,
}

impl StrategyMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyMethod::KeywordSearch => "keyword_search",
            StrategyMethod::MetadataFilter => "metadata_filter",
            StrategyMethod::ThreadAnalysis => "thread_analysis",
            StrategyMethod::SemanticAnalysis => "semantic_analysis",
            StrategyMethod::CrossReference => "cross_reference",
        }
    }

    /// All known methods, in catalogue order.
    pub fn all() -> [StrategyMethod; 5] {
        [
            StrategyMethod::KeywordSearch,
            StrategyMethod::MetadataFilter,
            StrategyMethod::ThreadAnalysis,
            StrategyMethod::SemanticAnalysis,
            StrategyMethod::CrossReference,
        ]
    }

    /// Whether nodes of this method consume the model client at all.
    pub fn uses_model(&self) -> bool {
        matches!(
            self,
            StrategyMethod::ThreadAnalysis | StrategyMethod::SemanticAnalysis
        )
    }
}

impl fmt::Display for StrategyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keyword_search" => Ok(StrategyMethod::KeywordSearch),
            "metadata_filter" => Ok(StrategyMethod::MetadataFilter),
            "thread_analysis" => Ok(StrategyMethod::ThreadAnalysis),
            "semantic_analysis" => Ok(StrategyMethod::SemanticAnalysis),
            "cross_reference" => Ok(StrategyMethod::CrossReference),
            other => Err(format!("unknown strategy method: {other}")),
        }
    }
}
