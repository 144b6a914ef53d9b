//! Finding compression for the final synthesis prompt.
//!
//! Upstream strategies may touch hundreds of items; the synthesis stage is
//! allowed exactly one model call under a hard input ceiling. This module
//! turns an [`ExecutionResults`] map into a bounded list of
//! [`CompressedFinding`]s:
//!
//! 1. rank each node's items against `synthesis_instructions.ranking_criteria`
//! 2. cap to a top-N per finding
//! 3. truncate every free-text field to a fixed char budget
//! 4. degrade the per-finding cap until the serialized findings fit the
//!    token ceiling
//!
//! Ranking criteria are free text from the decomposition model. They are
//! matched keyword-wise: criteria mentioning urgency boost items whose text
//! carries urgency markers, recency criteria sort by timestamp, unread/flag
//! criteria boost those booleans. Unmatched criteria leave input order
//! untouched, which keeps compression deterministic.

use crate::core::token::estimate_value_tokens;
use crate::execution::value_objects::ExecutionResults;
use crate::graph::entities::ExecutionGraph;
use serde_json::Value;

/// Budgets applied during compression.
#[derive(Debug, Clone, Copy)]
pub struct CompressionBudget {
    /// Hard ceiling for the estimated token size of all serialized findings.
    pub max_prompt_tokens: u64,
    /// Initial per-finding item cap; halved while over the ceiling.
    pub top_items_per_finding: usize,
    /// Char budget applied to every free-text field.
    pub text_budget_chars: usize,
}

impl Default for CompressionBudget {
    fn default() -> Self {
        Self {
            max_prompt_tokens: 16_000,
            top_items_per_finding: 10,
            text_budget_chars: 120,
        }
    }
}

/// One node's contribution to the synthesis prompt, after compression.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CompressedFinding {
    pub node_id: String,
    pub description: String,
    /// Items that survived ranking and capping, truncated field-wise.
    pub items: Vec<Value>,
    /// Item count before capping, so the prompt can say "12 of 87 shown".
    pub items_total: usize,
}

/// Compress all successful node results under the given budget.
///
/// Findings appear in graph declaration order (deterministic). Nodes whose
/// payload carries no items contribute nothing. The returned findings are
/// guaranteed to fit `budget.max_prompt_tokens` unless even one item per
/// finding overflows it, in which case items are dropped wholesale from the
/// tail until the ceiling holds.
pub fn compress_findings(
    graph: &ExecutionGraph,
    results: &ExecutionResults,
    budget: &CompressionBudget,
) -> Vec<CompressedFinding> {
    let criteria = &graph.synthesis_instructions.ranking_criteria;

    // Rank and truncate once; capping happens in the fitting loop.
    let mut ranked: Vec<(String, String, Vec<Value>)> = Vec::new();
    for node in &graph.information_needs {
        let Some(result) = results.get(&node.id) else {
            continue;
        };
        if !result.success {
            continue;
        }
        let mut items = extract_items(&result.data);
        if items.is_empty() {
            continue;
        }
        rank_items(&mut items, criteria);
        for item in &mut items {
            truncate_text_fields(item, budget.text_budget_chars);
        }
        ranked.push((node.id.clone(), node.description.clone(), items));
    }

    let mut cap = budget.top_items_per_finding.max(1);
    loop {
        let findings = build_capped(&ranked, cap, budget.text_budget_chars);
        if findings_tokens(&findings) <= budget.max_prompt_tokens {
            return findings;
        }
        if cap > 1 {
            cap /= 2;
        } else {
            return drop_until_fit(findings, budget.max_prompt_tokens);
        }
    }
}

/// Estimated token size of the serialized findings.
pub fn findings_tokens(findings: &[CompressedFinding]) -> u64 {
    findings
        .iter()
        .map(|f| match serde_json::to_value(f) {
            Ok(v) => estimate_value_tokens(&v),
            Err(_) => 0,
        })
        .sum()
}

fn build_capped(
    ranked: &[(String, String, Vec<Value>)],
    cap: usize,
    text_budget: usize,
) -> Vec<CompressedFinding> {
    ranked
        .iter()
        .map(|(node_id, description, items)| {
            let mut description = description.clone();
            truncate_string(&mut description, text_budget);
            CompressedFinding {
                node_id: node_id.clone(),
                description,
                items: items.iter().take(cap).cloned().collect(),
                items_total: items.len(),
            }
        })
        .collect()
}

/// Last-resort degradation: drop items from the tail finding backwards until
/// the ceiling holds. Findings reduced to zero items are removed entirely.
fn drop_until_fit(mut findings: Vec<CompressedFinding>, ceiling: u64) -> Vec<CompressedFinding> {
    while findings_tokens(&findings) > ceiling {
        let Some(last) = findings.last_mut() else {
            return findings;
        };
        if last.items.pop().is_none() {
            findings.pop();
        } else if last.items.is_empty() {
            findings.pop();
        }
    }
    findings
}

/// Pull the item list out of a strategy payload.
///
/// Strategies emit either `{"items": [...]}` or a bare object; a bare
/// non-empty object counts as a single item.
fn extract_items(data: &Value) -> Vec<Value> {
    match data.get("items") {
        Some(Value::Array(items)) => items.clone(),
        _ => match data {
            Value::Object(map) if !map.is_empty() => vec![data.clone()],
            _ => Vec::new(),
        },
    }
}

const URGENCY_MARKERS: [&str; 5] = ["urgent", "asap", "critical", "deadline", "important"];

/// Stable descending sort by `(criteria score, timestamp)`.
fn rank_items(items: &mut [Value], criteria: &[String]) {
    if criteria.is_empty() {
        return;
    }
    let joined = criteria.join(" ").to_lowercase();
    let by_urgency = joined.contains("urgen") || joined.contains("priorit");
    let by_recency =
        joined.contains("recen") || joined.contains("date") || joined.contains("latest");
    let by_unread = joined.contains("unread");
    let by_flagged = joined.contains("flag");

    if !(by_urgency || by_recency || by_unread || by_flagged) {
        return;
    }

    items.sort_by_cached_key(|item| {
        let mut score = 0i64;
        if by_urgency {
            score += urgency_score(item) * 100;
        }
        if by_unread && item.get("unread").and_then(Value::as_bool) == Some(true) {
            score += 50;
        }
        if by_flagged && item.get("flagged").and_then(Value::as_bool) == Some(true) {
            score += 50;
        }
        let ts = if by_recency { timestamp_of(item) } else { 0 };
        // Sort descending: negate both components.
        (-score, -ts)
    });
}

fn urgency_score(item: &Value) -> i64 {
    let text = serde_json::to_string(item).unwrap_or_default().to_lowercase();
    let mut score = URGENCY_MARKERS
        .iter()
        .filter(|marker| text.contains(**marker))
        .count() as i64;
    // A populated urgency_signals field from thread analysis is a strong signal.
    if let Some(signals) = item.get("urgency_signals") {
        match signals {
            Value::Array(a) if !a.is_empty() => score += 3,
            Value::String(s) if !s.is_empty() => score += 3,
            _ => {}
        }
    }
    score
}

fn timestamp_of(item: &Value) -> i64 {
    for field in ["received_at", "sent_at", "starts_at"] {
        if let Some(raw) = item.get(field).and_then(Value::as_str) {
            if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(raw) {
                return parsed.timestamp();
            }
        }
    }
    0
}

/// Recursively truncate every string in the value to the char budget.
fn truncate_text_fields(value: &mut Value, budget: usize) {
    match value {
        Value::String(s) => truncate_string(s, budget),
        Value::Array(items) => {
            for item in items {
                truncate_text_fields(item, budget);
            }
        }
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                truncate_text_fields(v, budget);
            }
        }
        _ => {}
    }
}

fn truncate_string(s: &mut String, budget: usize) {
    if s.chars().count() <= budget {
        return;
    }
    let mut truncated: String = s.chars().take(budget).collect();
    truncated.push_str("...");
    *s = truncated;
}
