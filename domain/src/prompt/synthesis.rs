//! Synthesis prompt.
//!
//! The one final model call. Its input is always the compressed findings,
//! never raw item bodies; the compression stage guarantees the ceiling.

use crate::graph::entities::SynthesisInstructions;
use crate::synthesis::compression::CompressedFinding;

/// Templates for the final answer call.
pub struct SynthesisPrompt;

impl SynthesisPrompt {
    /// System prompt, with user tone/format preferences injected.
    pub fn system(instructions: &SynthesisInstructions) -> String {
        let mut prompt = String::from(
            r#"You are a personal communication assistant answering a question from
findings gathered over the user's email and calendar.
Answer only from the findings below. If the findings are partial or contain
error placeholders, say so rather than guessing. Be direct and specific:
name senders, subjects, and dates."#,
        );

        if !instructions.presentation_format.is_empty() {
            prompt.push_str(&format!(
                "\nPresent the answer as: {}.",
                instructions.presentation_format
            ));
        }
        if let Some(preferences) = &instructions.user_preferences {
            prompt.push_str(&format!("\nUser preferences: {preferences}."));
        }
        prompt
    }

    /// User prompt carrying the query, the synthesis task, and the findings.
    pub fn user(
        query: &str,
        instructions: &SynthesisInstructions,
        findings: &[CompressedFinding],
    ) -> String {
        let mut prompt = format!("Question: {query}\n");

        if !instructions.task.is_empty() {
            prompt.push_str(&format!("Task: {}\n", instructions.task));
        }
        if let Some(preferences) = &instructions.user_preferences {
            prompt.push_str(&format!("Preferences: {preferences}\n"));
        }

        prompt.push_str("\nFindings:\n");
        for finding in findings {
            prompt.push_str(&format!(
                "\n## {} ({} of {} items shown)\n{}\n",
                finding.description,
                finding.items.len(),
                finding.items_total,
                serde_json::to_string_pretty(&finding.items).unwrap_or_default()
            ));
        }

        prompt.push_str("\nAnswer the question from these findings.");
        prompt
    }
}
