//! Corpus entities - threads, messages, mail items, and calendar events.
//!
//! These mirror the shapes returned by the narrow read services
//! (`get_thread`, `search`, `events_in_range`). They carry no behavior
//! beyond small accessors used by the strategies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A person appearing in mail or calendar data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Email address, lowercase.
    pub email: String,
    /// Display name, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Participant {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into().to_lowercase(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A single message within a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: Participant,
    #[serde(default)]
    pub recipients: Vec<Participant>,
    pub sent_at: DateTime<Utc>,
    pub body: String,
}

/// A conversation thread as returned by `get_thread`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub subject: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Thread {
    /// Sender of the most recent message, if the thread is non-empty.
    pub fn last_sender(&self) -> Option<&Participant> {
        self.messages.last().map(|m| &m.sender)
    }
}

/// A lightweight search hit as returned by `search`.
///
/// Carries a snippet rather than the full body; strategies that need the
/// complete conversation fetch the thread by `thread_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailItem {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub sender: Participant,
    pub received_at: DateTime<Utc>,
    /// Truncated body preview.
    pub snippet: String,
    #[serde(default)]
    pub unread: bool,
    #[serde(default)]
    pub flagged: bool,
}

/// A calendar event as returned by `events_in_range`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub attendees: Vec<Participant>,
}

/// Half-open time range `[start, end)` for calendar queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_participant_email_lowercased() {
        let p = Participant::new("Alice@Example.COM");
        assert_eq!(p.email, "alice@example.com");
    }

    #[test]
    fn test_last_sender_of_empty_thread() {
        let thread = Thread {
            id: "t1".to_string(),
            subject: "hello".to_string(),
            messages: vec![],
        };
        assert!(thread.last_sender().is_none());
    }

    #[test]
    fn test_time_range_is_half_open() {
        let range = TimeRange::new(at(9), at(17));
        assert!(range.contains(at(9)));
        assert!(range.contains(at(16)));
        assert!(!range.contains(at(17)));
    }
}
