//! Token estimation
//!
//! The pipeline never sees a tokenizer; every budget decision uses the same
//! chars/4 approximation. Over-estimating slightly is fine (budgets shrink),
//! under-estimating is not, so the division rounds up.

use serde_json::Value;

/// Estimate the token count of a text using the chars/4 heuristic.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

/// Estimate the token count of a JSON value as it would be serialized
/// into a prompt.
pub fn estimate_value_tokens(value: &Value) -> u64 {
    match serde_json::to_string(value) {
        Ok(s) => estimate_tokens(&s),
        Err(_) => 0,
    }
}
