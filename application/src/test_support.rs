//! Shared test doubles for use-case tests.

use crate::ports::calendar_reader::CalendarReader;
use crate::ports::llm_gateway::{
    ChatMessage, ChatOptions, ChatResponse, GatewayError, LlmGateway, StructuredRequest,
    StructuredResponse,
};
use crate::ports::mail_reader::{MailReader, ServiceError};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use courier_domain::{
    CalendarEvent, ExpectedCost, InformationNode, MailItem, Message, Participant, StrategyMethod,
    StrategySpec, Thread, TimeRange,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Build a node with the given params, group 1, no dependencies.
pub fn node_with_params(id: &str, method: StrategyMethod, params: Value) -> InformationNode {
    InformationNode {
        id: id.to_string(),
        description: format!("test node {id}"),
        node_type: method,
        strategy: StrategySpec { method, params },
        depends_on: vec![],
        parallel_group: 1,
        expected_cost: ExpectedCost::default(),
    }
}

/// Deterministic gateway stub.
///
/// Structured calls pop from a script when one is present, otherwise return
/// a fixed default payload. Chat returns a fixed reply. All calls are
/// counted and the last chat prompt is retained for assertions.
pub struct StubGateway {
    scripted: Mutex<VecDeque<Result<StructuredResponse, GatewayError>>>,
    default_value: Value,
    default_tokens: u64,
    fail_all: Option<GatewayError>,
    chat_reply: String,
    chat_tokens: u64,
    structured_count: AtomicUsize,
    chat_count: AtomicUsize,
    last_chat: Mutex<Option<Vec<ChatMessage>>>,
}

impl Default for StubGateway {
    fn default() -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            default_value: json!({
                "last_sender": "sender@example.com",
                "context": "routine discussion",
                "waiting_indicators": [],
                "urgency_signals": [],
            }),
            default_tokens: 1_500,
            fail_all: None,
            chat_reply: "Here is what I found.".to_string(),
            chat_tokens: 800,
            structured_count: AtomicUsize::new(0),
            chat_count: AtomicUsize::new(0),
            last_chat: Mutex::new(None),
        }
    }
}

impl StubGateway {
    /// Every structured call returns this value.
    pub fn with_structured_value(value: Value, tokens: u64) -> Self {
        Self {
            default_value: value,
            default_tokens: tokens,
            ..Self::default()
        }
    }

    /// Every call fails with (a clone of) this error.
    pub fn failing(error: GatewayError) -> Self {
        Self {
            fail_all: Some(error),
            ..Self::default()
        }
    }

    pub fn with_chat_reply(mut self, reply: impl Into<String>, tokens: u64) -> Self {
        self.chat_reply = reply.into();
        self.chat_tokens = tokens;
        self
    }

    /// Queue one scripted structured response ahead of the default.
    pub fn script_structured(self, response: Result<StructuredResponse, GatewayError>) -> Self {
        self.scripted.lock().unwrap().push_back(response);
        self
    }

    pub fn structured_calls(&self) -> usize {
        self.structured_count.load(Ordering::SeqCst)
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_count.load(Ordering::SeqCst)
    }

    pub fn last_chat_messages(&self) -> Option<Vec<ChatMessage>> {
        self.last_chat.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmGateway for StubGateway {
    async fn generate_structured(
        &self,
        _request: StructuredRequest,
    ) -> Result<StructuredResponse, GatewayError> {
        self.structured_count.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.fail_all {
            return Err(error.clone());
        }
        if let Some(scripted) = self.scripted.lock().unwrap().pop_front() {
            return scripted;
        }
        Ok(StructuredResponse {
            value: self.default_value.clone(),
            tokens_used: self.default_tokens,
        })
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        _options: &ChatOptions,
    ) -> Result<ChatResponse, GatewayError> {
        self.chat_count.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.fail_all {
            return Err(error.clone());
        }
        *self.last_chat.lock().unwrap() = Some(messages.to_vec());
        Ok(ChatResponse {
            content: self.chat_reply.clone(),
            tokens_used: self.chat_tokens,
        })
    }
}

/// In-memory mail reader.
#[derive(Default)]
pub struct StubMailReader {
    threads: HashMap<String, Thread>,
    items: Vec<MailItem>,
    failing_threads: HashSet<String>,
    unavailable: bool,
}

impl StubMailReader {
    /// Items as `(id, thread_id, subject, snippet)`.
    pub fn with_items(specs: Vec<(&str, &str, &str, &str)>) -> Self {
        let items = specs
            .into_iter()
            .enumerate()
            .map(|(i, (id, thread_id, subject, snippet))| MailItem {
                id: id.to_string(),
                thread_id: thread_id.to_string(),
                subject: subject.to_string(),
                sender: Participant::new(format!("sender{i}@example.com")),
                received_at: Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
                    + chrono::Duration::minutes(i as i64),
                snippet: snippet.to_string(),
                unread: false,
                flagged: false,
            })
            .collect();
        Self {
            items,
            ..Self::default()
        }
    }

    /// Threads with `messages` messages of `body_len` chars each.
    pub fn with_threads(ids: &[String], messages: usize, body_len: usize) -> Self {
        let threads = ids
            .iter()
            .map(|id| {
                let thread = Thread {
                    id: id.clone(),
                    subject: format!("subject of {id}"),
                    messages: (0..messages)
                        .map(|m| Message {
                            id: format!("{id}-m{m}"),
                            sender: Participant::new(format!("sender{m}@example.com")),
                            recipients: vec![],
                            sent_at: Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap(),
                            body: "x".repeat(body_len),
                        })
                        .collect(),
                };
                (id.clone(), thread)
            })
            .collect();
        Self {
            threads,
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn add_thread(&mut self, thread: Thread) {
        self.threads.insert(thread.id.clone(), thread);
    }

    pub fn fail_thread(&mut self, id: &str) {
        self.failing_threads.insert(id.to_string());
    }

    pub fn set_sender(&mut self, item_id: &str, email: &str) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id == item_id) {
            item.sender = Participant::new(email);
        }
    }

    pub fn set_unread(&mut self, item_id: &str, unread: bool) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id == item_id) {
            item.unread = unread;
        }
    }

    pub fn set_flagged(&mut self, item_id: &str, flagged: bool) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id == item_id) {
            item.flagged = flagged;
        }
    }
}

#[async_trait]
impl MailReader for StubMailReader {
    async fn get_thread(&self, id: &str) -> Result<Thread, ServiceError> {
        if self.unavailable {
            return Err(ServiceError::Unavailable("mail service down".to_string()));
        }
        if self.failing_threads.contains(id) {
            return Err(ServiceError::NotFound(format!("thread {id}")));
        }
        self.threads
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("thread {id}")))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<MailItem>, ServiceError> {
        if self.unavailable {
            return Err(ServiceError::Unavailable("mail service down".to_string()));
        }
        let query = query.to_lowercase();
        let mut hits: Vec<MailItem> = self
            .items
            .iter()
            .filter(|item| {
                query.is_empty()
                    || query.split_whitespace().any(|term| {
                        item.subject.to_lowercase().contains(term)
                            || item.snippet.to_lowercase().contains(term)
                    })
            })
            .cloned()
            .collect();
        hits.truncate(limit);
        Ok(hits)
    }
}

/// In-memory calendar reader.
#[derive(Default)]
pub struct StubCalendarReader {
    events: Vec<CalendarEvent>,
}

impl StubCalendarReader {
    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        Self { events }
    }

    /// Five daily standups, 2025-06-02 through 2025-06-06, 09:00-09:15 UTC.
    pub fn with_standup_week() -> Self {
        let events = (0..5)
            .map(|day| CalendarEvent {
                id: format!("e{day}"),
                title: "standup".to_string(),
                starts_at: Utc.with_ymd_and_hms(2025, 6, 2 + day, 9, 0, 0).unwrap(),
                ends_at: Utc.with_ymd_and_hms(2025, 6, 2 + day, 9, 15, 0).unwrap(),
                attendees: vec![
                    Participant::new("alice@example.com").with_name("Alice"),
                    Participant::new("bob@example.com"),
                ],
            })
            .collect();
        Self { events }
    }
}

#[async_trait]
impl CalendarReader for StubCalendarReader {
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
