//! Per-thread field extraction prompt and schema.
//!
//! Thread analysis issues one structured call per thread and always requests
//! the same named fields, so every unit comes back in a uniform, typed shape
//! regardless of prompt variance.

use crate::corpus::entities::Thread;
use serde_json::{json, Value};

/// Fields extracted from every analyzed thread unless the node overrides them.
pub const DEFAULT_EXTRACT_FIELDS: [&str; 4] = [
    "last_sender",
    "context",
    "waiting_indicators",
    "urgency_signals",
];

/// Templates for the per-thread extraction call.
pub struct ThreadExtractionPrompt;

impl ThreadExtractionPrompt {
    pub fn system() -> &'static str {
        r#"You extract structured facts from one email thread.
Answer only from the thread content. Use empty strings or empty arrays for
fields the thread does not support. Never invent senders or dates."#
    }

    /// Render one thread into a bounded user prompt.
    ///
    /// Only the most recent `max_messages` messages are included, and each
    /// body is cut to `body_budget_chars`, which keeps every extraction call
    /// within a few thousand tokens no matter how long the thread is.
    pub fn user(thread: &Thread, max_messages: usize, body_budget_chars: usize) -> String {
        let mut prompt = format!("Thread subject: {}\n\n", thread.subject);

        let skipped = thread.messages.len().saturating_sub(max_messages);
        if skipped > 0 {
            prompt.push_str(&format!("({skipped} earlier messages omitted)\n\n"));
        }

        for message in thread.messages.iter().skip(skipped) {
            let body: String = message.body.chars().take(body_budget_chars).collect();
            prompt.push_str(&format!(
                "From: {} at {}\n{}\n\n",
                message.sender.email,
                message.sent_at.to_rfc3339(),
                body
            ));
        }

        prompt.push_str("Extract the requested fields from this thread.");
        prompt
    }

    /// Schema for the requested field set.
    ///
    /// `last_sender` and `context` decode as strings, everything else as
    /// string arrays.
    pub fn schema(extract_fields: &[String]) -> Value {
        let mut properties = serde_json::Map::new();
        for field in extract_fields {
            let spec = match field.as_str() {
                "last_sender" | "context" => json!({"type": "string"}),
                _ => json!({"type": "array", "items": {"type": "string"}}),
            };
            properties.insert(field.clone(), spec);
        }
        json!({
            "type": "object",
            "required": extract_fields,
            "additionalProperties": false,
            "properties": properties
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::entities::{Message, Participant};
    use chrono::{TimeZone, Utc};

    fn thread_with_messages(count: usize, body_len: usize) -> Thread {
        Thread {
            id: "t1".to_string(),
            subject: "budget review".to_string(),
            messages: (0..count)
                .map(|i| Message {
                    id: format!("m{i}"),
                    sender: Participant::new(format!("sender{i}@example.com")),
                    recipients: vec![],
                    sent_at: Utc.with_ymd_and_hms(2025, 6, 2, 9, i as u32 % 60, 0).unwrap(),
                    body: "a".repeat(body_len),
                })
                .collect(),
        }
    }

    #[test]
    fn test_prompt_bounds_messages_and_bodies() {
        let thread = thread_with_messages(30, 10_000);
        let prompt = ThreadExtractionPrompt::user(&thread, 5, 500);
        assert!(prompt.contains("25 earlier messages omitted"));
        // 5 messages x 500 chars plus headers stays small
        assert!(prompt.len() < 4_000);
        assert!(prompt.contains("sender29@example.com"));
        assert!(!prompt.contains("sender0@example.com"));
    }

    #[test]
    fn test_schema_types_follow_field_names() {
        let fields: Vec<String> = DEFAULT_EXTRACT_FIELDS.iter().map(|f| f.to_string()).collect();
        let schema = ThreadExtractionPrompt::schema(&fields);
        assert_eq!(schema["properties"]["last_sender"]["type"], "string");
        assert_eq!(schema["properties"]["urgency_signals"]["type"], "array");
    }
}
