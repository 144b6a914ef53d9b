//! LLM Gateway port
//!
//! Defines the interface for communicating with the language-model service.
//! Two operations: schema-constrained structured decode and plain chat.
//! Retry, backoff, and timeouts belong to the adapter, not to callers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during gateway operations
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Response was not valid for the requested schema: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Options for a chat call.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Response from a chat call.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    /// Total usage of this call (prompt + completion).
    pub tokens_used: u64,
}

/// A structured-decode request: the model must return JSON matching `schema`.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub system: Option<String>,
    pub prompt: String,
    /// Short identifier for the schema, surfaced to the provider.
    pub schema_name: String,
    pub schema: Value,
    pub max_output_tokens: Option<u32>,
}

impl StructuredRequest {
    pub fn new(prompt: impl Into<String>, schema_name: impl Into<String>, schema: Value) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            schema_name: schema_name.into(),
            schema,
            max_output_tokens: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = Some(max);
        self
    }
}

/// Response from a structured-decode call.
#[derive(Debug, Clone)]
pub struct StructuredResponse {
    /// The decoded JSON value. Adapters must have verified it parses; field
    /// and enum validation against the schema belongs to the caller's
    /// deserialization into typed shapes.
    pub value: Value,
    pub tokens_used: u64,
}

/// Gateway for language-model communication
///
/// This port defines how the application layer talks to the model service.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Issue one schema-constrained decode call.
    async fn generate_structured(
        &self,
        request: StructuredRequest,
    ) -> Result<StructuredResponse, GatewayError>;

    /// Issue one plain chat call.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<ChatResponse, GatewayError>;
}
