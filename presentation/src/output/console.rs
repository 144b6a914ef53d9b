//! Console output formatter for query responses

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use courier_application::QueryResponse;
use courier_domain::ResourceEstimate;

/// Formats query responses for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the answer with per-layer metrics
    pub fn format(response: &QueryResponse) -> String {
        let mut output = String::new();

        output.push_str(&response.message);
        output.push('\n');

        let layers = &response.metadata.layers;
        output.push_str(&format!(
            "\n{}\n",
            format!(
                "tokens: {} (plan {}, execute {}, answer {})  time: {}ms + {}ms + {}ms",
                response.metadata.tokens_used,
                layers.layer1_tokens,
                layers.layer2_tokens,
                layers.layer3_tokens,
                layers.layer1_time_ms,
                layers.layer2_time_ms,
                layers.layer3_time_ms,
            )
            .dimmed()
        ));

        output
    }

    /// Format as JSON
    pub fn format_json(response: &QueryResponse) -> String {
        serde_json::to_string_pretty(response).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the answer only (concise output)
    pub fn format_answer_only(response: &QueryResponse) -> String {
        let mut output = String::new();
        output.push_str(&response.message);
        output.push('\n');
        output
    }

    /// Format a confirmation prompt for an expensive plan
    pub fn format_estimate(estimate: &ResourceEstimate) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{}\n",
            "This plan looks expensive:".yellow().bold()
        ));
        output.push_str(&format!(
            "  items accessed: ~{}\n  model calls: ~{}\n  tokens: ~{}\n  time: ~{:.0}s  cost: ~${:.3}\n",
            estimate.total_items_accessed,
            estimate.total_llm_calls,
            estimate.estimated_tokens,
            estimate.estimated_time_seconds,
            estimate.estimated_cost_usd,
        ));
        output
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, response: &QueryResponse) -> String {
        Self::format(response)
    }

    fn format_json(&self, response: &QueryResponse) -> String {
        Self::format_json(response)
    }

    fn format_answer_only(&self, response: &QueryResponse) -> String {
        Self::format_answer_only(response)
    }
}
