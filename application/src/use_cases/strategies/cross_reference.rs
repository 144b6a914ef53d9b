//! Cross-reference strategy - pure join over prior nodes' results.
//!
//! Matches people across two or more dependency payloads, e.g. calendar
//! attendees against mail senders. No service or model calls; everything it
//! needs arrived via `depends_on`.

use super::{Strategy, StrategyContext, StrategyError};
use async_trait::async_trait;
use courier_domain::{InformationNode, NodeResult, StrategyMethod};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
struct CrossReferenceParams {
    /// Field to join on. Only "email" is currently meaningful; unknown
    /// values fall back to email joining.
    #[serde(default)]
    join_on: Option<String>,
}

#[derive(Default)]
struct PersonAppearances {
    name: Option<String>,
    /// node_id -> item references (id/subject/title) where the person appears.
    appearances: BTreeMap<String, Vec<Value>>,
}

/// Joins people appearing in two or more dependency results.
#[derive(Default)]
pub struct CrossReferenceStrategy;

impl CrossReferenceStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Emails found anywhere in one item, with display names when present.
    fn emails_in(item: &Value) -> Vec<(String, Option<String>)> {
        let mut found = Vec::new();
        Self::collect_emails(item, &mut found);
        found
    }

    fn collect_emails(value: &Value, found: &mut Vec<(String, Option<String>)>) {
        match value {
            Value::Object(map) => {
                if let Some(email) = map.get("email").and_then(Value::as_str) {
                    let name = map.get("name").and_then(Value::as_str).map(String::from);
                    found.push((email.to_lowercase(), name));
                }
                // last_sender from thread analysis is a bare address string
                if let Some(sender) = map.get("last_sender").and_then(Value::as_str) {
                    if sender.contains('@') {
                        found.push((sender.to_lowercase(), None));
                    }
                }
                for (_, nested) in map {
                    Self::collect_emails(nested, found);
                }
            }
            Value::Array(items) => {
                for item in items {
                    Self::collect_emails(item, found);
                }
            }
            _ => {}
        }
    }

    /// A short reference to the item a person appeared in.
    fn item_ref(item: &Value) -> Value {
        let mut reference = Map::new();
        for field in ["id", "thread_id", "subject", "title"] {
            if let Some(value) = item.get(field) {
                reference.insert(field.to_string(), value.clone());
            }
        }
        Value::Object(reference)
    }
}

#[async_trait]
impl Strategy for CrossReferenceStrategy {
    fn method(&self) -> StrategyMethod {
        StrategyMethod::CrossReference
    }

    async fn execute(
        &self,
        node: &InformationNode,
        ctx: &StrategyContext,
    ) -> Result<NodeResult, StrategyError> {
        let _params: CrossReferenceParams = serde_json::from_value(node.strategy.params.clone())
            .unwrap_or_default();

        if ctx.dependencies.len() < 2 {
            return Err(StrategyError::InvalidParams {
                method: self.method(),
                reason: format!(
                    "cross_reference needs at least two dependencies, got {}",
                    ctx.dependencies.len()
                ),
            });
        }

        // person email -> appearances per source node
        let mut people: BTreeMap<String, PersonAppearances> = BTreeMap::new();
        for (source_id, result) in &ctx.dependencies {
            let items = match result.data.get("items").and_then(Value::as_array) {
                Some(items) => items.clone(),
                None => vec![result.data.clone()],
            };
            for item in &items {
                for (email, name) in Self::emails_in(item) {
                    let entry = people.entry(email).or_default();
                    if entry.name.is_none() {
                        entry.name = name;
                    }
                    entry
                        .appearances
                        .entry(source_id.clone())
                        .or_default()
                        .push(Self::item_ref(item));
                }
            }
        }

        // Keep people appearing in more than one source node.
        let matches: Vec<Value> = people
            .into_iter()
            .filter(|(_, person)| person.appearances.len() >= 2)
            .map(|(email, person)| {
                json!({
                    "email": email,
                    "name": person.name,
                    "appears_in": person.appearances.keys().collect::<Vec<_>>(),
                    "items": person.appearances.values().flatten().collect::<Vec<_>>(),
                })
            })
            .collect();

        let match_count = matches.len();
        debug!(node = %node.id, matches = match_count, "cross reference");

        Ok(NodeResult::success(
            &node.id,
            json!({
                "items": matches,
                "matched": match_count,
                "sources": ctx.dependencies.keys().collect::<Vec<_>>(),
            }),
            0,
        ))
    }
}
