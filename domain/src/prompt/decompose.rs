//! Decomposition prompt and schema.
//!
//! One schema-constrained model call turns the user query (plus recent
//! conversation turns) into an execution graph. The schema below is handed
//! verbatim to the model client's structured-decode endpoint, and the same
//! shape is what `ExecutionGraph` deserializes; anything the model invents
//! outside it fails validation.

use serde_json::{json, Value};

/// Templates for the decomposition call.
pub struct DecomposePrompt;

impl DecomposePrompt {
    pub fn system() -> &'static str {
        r#"You are a query planner for a personal communication assistant.
You turn a natural-language question about the user's email, calendar, and contacts
into a structured execution plan: a DAG of information needs.

Rules:
- Each information need has a unique id, a strategy, and a parallel_group.
- A node may only depend on nodes in strictly earlier parallel_groups.
- Prefer cheap strategies (keyword_search, metadata_filter) before model-backed
  ones (thread_analysis, semantic_analysis).
- cross_reference nodes join results of earlier nodes and must list them in depends_on.
- Estimate costs honestly; set user_should_confirm when the plan would touch
  hundreds of items or cost more than a few cents."#
    }

    /// User prompt carrying the query, recent conversation, and extra context.
    pub fn user(query: &str, history: &[(String, String)], context: Option<&str>) -> String {
        let mut prompt = String::new();

        if !history.is_empty() {
            prompt.push_str("Recent conversation:\n");
            for (role, content) in history {
                prompt.push_str(&format!("{role}: {content}\n"));
            }
            prompt.push('\n');
        }

        if let Some(context) = context {
            prompt.push_str(&format!("Additional context:\n{context}\n\n"));
        }

        prompt.push_str(&format!(
            "Decompose the following question into an execution plan:\n\n{query}"
        ));
        prompt
    }

    /// JSON schema for the execution graph, used for structured decode.
    pub fn schema() -> Value {
        json!({
            "type": "object",
            "required": ["query_classification", "information_needs",
                         "synthesis_instructions", "resource_estimate"],
            "additionalProperties": false,
            "properties": {
                "query_classification": {
                    "type": "object",
                    "required": ["type", "complexity", "domains", "reasoning"],
                    "additionalProperties": false,
                    "properties": {
                        "type": {"enum": ["lookup", "aggregation", "analysis", "cross_domain"]},
                        "complexity": {"enum": ["simple", "moderate", "complex"]},
                        "domains": {
                            "type": "array",
                            "items": {"enum": ["email", "calendar", "contacts"]}
                        },
                        "reasoning": {"type": "string"}
                    }
                },
                "information_needs": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "required": ["id", "description", "type", "strategy",
                                     "depends_on", "parallel_group", "expected_cost"],
                        "additionalProperties": false,
                        "properties": {
                            "id": {"type": "string"},
                            "description": {"type": "string"},
                            "type": {"enum": Self::method_tags()},
                            "strategy": {
                                "type": "object",
                                "required": ["method", "params"],
                                "additionalProperties": false,
                                "properties": {
                                    "method": {"enum": Self::method_tags()},
                                    "params": {"type": "object"}
                                }
                            },
                            "depends_on": {"type": "array", "items": {"type": "string"}},
                            "parallel_group": {"type": "integer", "minimum": 1},
                            "expected_cost": {
                                "type": "object",
                                "required": ["tokens", "llm_calls", "time_seconds"],
                                "additionalProperties": false,
                                "properties": {
                                    "tokens": {"type": "integer"},
                                    "llm_calls": {"type": "integer"},
                                    "time_seconds": {"type": "number"}
                                }
                            }
                        }
                    }
                },
                "synthesis_instructions": {
                    "type": "object",
                    "required": ["task", "ranking_criteria", "presentation_format"],
                    "properties": {
                        "task": {"type": "string"},
                        "ranking_criteria": {"type": "array", "items": {"type": "string"}},
                        "presentation_format": {"type": "string"},
                        "user_preferences": {"type": ["string", "null"]}
                    }
                },
                "resource_estimate": {
                    "type": "object",
                    "required": ["total_items_accessed", "total_llm_calls", "estimated_tokens",
                                 "estimated_time_seconds", "estimated_cost_usd",
                                 "user_should_confirm"],
                    "properties": {
                        "total_items_accessed": {"type": "integer"},
                        "total_llm_calls": {"type": "integer"},
                        "estimated_tokens": {"type": "integer"},
                        "estimated_time_seconds": {"type": "number"},
                        "estimated_cost_usd": {"type": "number"},
                        "user_should_confirm": {"type": "boolean"}
                    }
                }
            }
        })
    }

    fn method_tags() -> Value {
        json!(["keyword_search", "metadata_filter", "thread_analysis",
               "semantic_analysis", "cross_reference"])
    }
}
