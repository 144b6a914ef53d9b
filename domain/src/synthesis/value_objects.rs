//! Final synthesis output.

use serde::{Deserialize, Serialize};

/// Metadata about one synthesis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisMetadata {
    /// Number of distinct result groups actually summarized.
    pub findings_count: usize,
    /// Token usage of the synthesis call itself, not cumulative.
    pub tokens_used: u64,
}

/// The user-facing answer produced by the synthesis stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisOutput {
    pub message: String,
    pub metadata: SynthesisMetadata,
}

impl SynthesisOutput {
    pub fn new(message: impl Into<String>, findings_count: usize, tokens_used: u64) -> Self {
        Self {
            message: message.into(),
            metadata: SynthesisMetadata {
                findings_count,
                tokens_used,
            },
        }
    }
}
