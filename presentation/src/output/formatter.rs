//! Output formatter trait

use courier_application::QueryResponse;

/// Trait for formatting query responses
pub trait OutputFormatter {
    /// Format the answer with metadata for console display
    fn format(&self, response: &QueryResponse) -> String;

    /// Format as JSON
    fn format_json(&self, response: &QueryResponse) -> String;

    /// Format the answer only (concise output)
    fn format_answer_only(&self, response: &QueryResponse) -> String;
}
