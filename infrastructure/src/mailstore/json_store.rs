//! JSON-file mailbox store.
//!
//! Loads a local corpus file holding full threads and calendar events, and
//! serves the application's mail and calendar read ports from memory.
//! Search hits are derived from each thread's most recent message; the
//! snippet is a bounded prefix of its body.

use async_trait::async_trait;
use courier_application::{CalendarReader, MailReader, ServiceError};
use courier_domain::{CalendarEvent, MailItem, Thread, TimeRange};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

const SNIPPET_CHARS: usize = 160;

/// Errors loading the mailbox file.
#[derive(Error, Debug)]
pub enum MailStoreError {
    #[error("could not read mailbox file: {0}")]
    Io(#[from] std::io::Error),

    #[error("mailbox file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One stored thread: the conversation plus mailbox-level flags.
#[derive(Debug, Clone, Deserialize)]
struct StoredThread {
    #[serde(flatten)]
    thread: Thread,
    #[serde(default)]
    unread: bool,
    #[serde(default)]
    flagged: bool,
}

#[derive(Debug, Default, Deserialize)]
struct MailboxFile {
    #[serde(default)]
    threads: Vec<StoredThread>,
    #[serde(default)]
    events: Vec<CalendarEvent>,
}

/// In-memory mailbox backed by a JSON corpus file.
pub struct JsonMailStore {
    threads: HashMap<String, Thread>,
    items: Vec<MailItem>,
    events: Vec<CalendarEvent>,
}

impl JsonMailStore {
    /// Load the corpus from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MailStoreError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let file: MailboxFile = serde_json::from_str(&content)?;
        let store = Self::from_file(file);
        info!(
            threads = store.threads.len(),
            events = store.events.len(),
            path = %path.as_ref().display(),
            "mailbox corpus loaded"
        );
        Ok(store)
    }

    fn from_file(file: MailboxFile) -> Self {
        let mut items = Vec::with_capacity(file.threads.len());
        let mut threads = HashMap::with_capacity(file.threads.len());
        for stored in file.threads {
            if let Some(item) = Self::item_for(&stored) {
                items.push(item);
            }
            threads.insert(stored.thread.id.clone(), stored.thread);
        }
        // Newest first, the order search results are consumed in
        items.sort_by_key(|item| std::cmp::Reverse(item.received_at));
        Self {
            threads,
            items,
            events: file.events,
        }
    }

    /// Derive a search hit from a thread's most recent message.
    fn item_for(stored: &StoredThread) -> Option<MailItem> {
        let last = stored.thread.messages.last()?;
        Some(MailItem {
            id: last.id.clone(),
            thread_id: stored.thread.id.clone(),
            subject: stored.thread.subject.clone(),
            sender: last.sender.clone(),
            received_at: last.sent_at,
            snippet: last.body.chars().take(SNIPPET_CHARS).collect(),
            unread: stored.unread,
            flagged: stored.flagged,
        })
    }

    fn matches(item: &MailItem, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let subject = item.subject.to_lowercase();
        let snippet = item.snippet.to_lowercase();
        query
            .split_whitespace()
            .any(|term| subject.contains(term) || snippet.contains(term))
    }
}

#[async_trait]
impl MailReader for JsonMailStore {
    async fn get_thread(&self, id: &str) -> Result<Thread, ServiceError> {
        self.threads
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("thread {id}")))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<MailItem>, ServiceError> {
        let query = query.to_lowercase();
        let mut hits: Vec<MailItem> = self
            .items
            .iter()
            .filter(|item| Self::matches(item, &query))
            .cloned()
            .collect();
        hits.truncate(limit);
        Ok(hits)
    }
}

#[async_trait]
impl CalendarReader for JsonMailStore {
    async fn events_in_range(&self, range: TimeRange) -> Result<Vec<CalendarEvent>, ServiceError> {
        let mut events: Vec<CalendarEvent> = self
            .events
            .iter()
            .filter(|e| range.contains(e.starts_at))
            .cloned()
            .collect();
        events.sort_by_key(|e| e.starts_at);
        Ok(events)
    }
}
