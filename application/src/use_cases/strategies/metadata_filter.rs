//! Metadata filter strategy - pure filter over mail/calendar metadata,
//! no model calls.
//!
//! Filters by sender, unread/flagged status, and date range. When the node
//! targets the calendar domain (an `events_between` range), events in the
//! range are returned instead of mail.

use super::{Strategy, StrategyContext, StrategyError};
use crate::ports::calendar_reader::CalendarReader;
use crate::ports::mail_reader::MailReader;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_domain::{InformationNode, MailItem, NodeResult, StrategyMethod, TimeRange};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct MetadataFilterParams {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    sender: Option<String>,
    #[serde(default)]
    unread: Option<bool>,
    #[serde(default)]
    flagged: Option<bool>,
    #[serde(default)]
    after: Option<DateTime<Utc>>,
    #[serde(default)]
    before: Option<DateTime<Utc>>,
    /// When set, read calendar events in this range instead of mail.
    #[serde(default)]
    events_between: Option<EventRange>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EventRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Filters mail items (or calendar events) on declared metadata.
pub struct MetadataFilterStrategy {
    mail: Arc<dyn MailReader>,
    calendar: Arc<dyn CalendarReader>,
    default_limit: usize,
}

impl MetadataFilterStrategy {
    pub fn new(
        mail: Arc<dyn MailReader>,
        calendar: Arc<dyn CalendarReader>,
        default_limit: usize,
    ) -> Self {
        Self {
            mail,
            calendar,
            default_limit,
        }
    }

    fn keep(item: &MailItem, params: &MetadataFilterParams) -> bool {
        if let Some(sender) = &params.sender {
            let sender = sender.to_lowercase();
            let named = item
                .sender
                .name
                .as_deref()
                .map(|n| n.to_lowercase().contains(&sender))
                .unwrap_or(false);
            if !item.sender.email.contains(&sender) && !named {
                return false;
            }
        }
        if let Some(unread) = params.unread {
            if item.unread != unread {
                return false;
            }
        }
        if let Some(flagged) = params.flagged {
            if item.flagged != flagged {
                return false;
            }
        }
        if let Some(after) = params.after {
            if item.received_at < after {
                return false;
            }
        }
        if let Some(before) = params.before {
            if item.received_at >= before {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl Strategy for MetadataFilterStrategy {
    fn method(&self) -> StrategyMethod {
        StrategyMethod::MetadataFilter
    }

    async fn execute(
        &self,
        node: &InformationNode,
        _ctx: &StrategyContext,
    ) -> Result<NodeResult, StrategyError> {
        let params: MetadataFilterParams = serde_json::from_value(node.strategy.params.clone())
            .map_err(|e| StrategyError::InvalidParams {
                method: self.method(),
                reason: e.to_string(),
            })?;

        if let Some(range) = &params.events_between {
            let events = self
                .calendar
                .events_in_range(TimeRange::new(range.start, range.end))
                .await?;
            debug!(node = %node.id, events = events.len(), "metadata filter (calendar)");
            let count = events.len();
            return Ok(NodeResult::success(
                &node.id,
                json!({"items": events, "matched": count}),
                0,
            ));
        }

        let limit = params.limit.unwrap_or(self.default_limit);
        let query = params.query.clone().unwrap_or_default();
        let hits = self.mail.search(&query, limit).await?;
        let kept: Vec<&MailItem> = hits.iter().filter(|i| Self::keep(i, &params)).collect();
        let kept_count = kept.len();
        debug!(node = %node.id, searched = hits.len(), matched = kept_count, "metadata filter");

        Ok(NodeResult::success(
            &node.id,
            json!({"items": kept, "searched": hits.len(), "matched": kept_count}),
            0,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{node_with_params, StubCalendarReader, StubMailReader};

    fn strategy(mail: StubMailReader, calendar: StubCalendarReader) -> MetadataFilterStrategy {
        MetadataFilterStrategy::new(Arc::new(mail), Arc::new(calendar), 50)
    }

    #[tokio::test]
    async fn test_filters_unread_from_sender() {
        let mut reader = StubMailReader::with_items(vec![
            ("m1", "t1", "report", "numbers attached"),
            ("m2", "t2", "report v2", "more numbers"),
            ("m3", "t3", "hello", "hi"),
        ]);
        reader.set_sender("m1", "boss@example.com");
        reader.set_sender("m2", "boss@example.com");
        reader.set_unread("m2", true);

        let node = node_with_params(
            "mf",
            StrategyMethod::MetadataFilter,
            json!({"sender": "boss@example.com", "unread": true}),
        );
        let result = strategy(reader, StubCalendarReader::default())
            .execute(&node, &StrategyContext::new("u1"))
            .await
            .unwrap();
        assert_eq!(result.data["matched"], 1);
        assert_eq!(result.data["items"][0]["id"], "m2");
        assert_eq!(result.tokens_used, 0);
    }

    #[tokio::test]
    async fn test_calendar_range_reads_events() {
        let calendar = StubCalendarReader::with_standup_week();
        let node = node_with_params(
            "mf",
            StrategyMethod::MetadataFilter,
            json!({"events_between": {
                "start": "2025-06-02T00:00:00Z",
                "end": "2025-06-04T00:00:00Z"
            }}),
        );
        let result = strategy(StubMailReader::default(), calendar)
            .execute(&node, &StrategyContext::new("u1"))
            .await
            .unwrap();
        assert_eq!(result.data["matched"], 2);
    }
}
