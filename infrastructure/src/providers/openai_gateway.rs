//! OpenAI-compatible chat-completions adapter for the LLM gateway port.
//!
//! Structured decode uses `response_format: json_schema` so the provider
//! constrains the output; the adapter still re-parses the content and maps
//! unparseable replies to [`GatewayError::InvalidResponse`]. Transient
//! failures (timeout, 429, 5xx) are retried with a short linear backoff.
//! Callers see exactly one logical call.

use async_trait::async_trait;
use courier_application::{
    ChatMessage, ChatOptions, ChatResponse, GatewayError, LlmGateway, StructuredRequest,
    StructuredResponse,
};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::FileModelConfig;

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Gateway adapter for any OpenAI-compatible chat-completions endpoint.
pub struct OpenAiGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
    max_retries: u32,
}

impl OpenAiGateway {
    /// Build a gateway from the model config section.
    ///
    /// The API key is read from the environment variable the config names;
    /// a missing key is a connection error up front rather than a 401 later.
    pub fn from_config(config: &FileModelConfig) -> Result<Self, GatewayError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            GatewayError::ConnectionError(format!(
                "API key environment variable {} is not set",
                config.api_key_env
            ))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.name.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            max_retries: config.max_retries,
        })
    }

    fn chat_messages_json(messages: &[ChatMessage]) -> Value {
        Value::Array(
            messages
                .iter()
                .map(|m| json!({"role": m.role, "content": m.content}))
                .collect(),
        )
    }

    fn structured_body(&self, request: &StructuredRequest) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(request.prompt.clone()));

        json!({
            "model": self.model,
            "messages": Self::chat_messages_json(&messages),
            "temperature": self.temperature,
            "max_tokens": request.max_output_tokens.unwrap_or(self.max_output_tokens),
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": request.schema_name,
                    "strict": true,
                    "schema": request.schema,
                },
            },
        })
    }

    fn chat_body(&self, messages: &[ChatMessage], options: &ChatOptions) -> Value {
        json!({
            "model": self.model,
            "messages": Self::chat_messages_json(messages),
            "temperature": options.temperature.unwrap_or(self.temperature),
            "max_tokens": options.max_output_tokens.unwrap_or(self.max_output_tokens),
        })
    }

    /// Pull `(content, total_tokens)` out of a chat-completions response.
    fn parse_completion(body: &Value) -> Result<(String, u64), GatewayError> {
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                GatewayError::InvalidResponse("response has no message content".to_string())
            })?
            .to_string();
        let tokens_used = body["usage"]["total_tokens"].as_u64().unwrap_or(0);
        Ok((content, tokens_used))
    }

    fn map_transport_error(e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout
        } else if e.is_connect() {
            GatewayError::ConnectionError(e.to_string())
        } else {
            GatewayError::RequestFailed(e.to_string())
        }
    }

    fn is_retryable(error: &GatewayError) -> bool {
        match error {
            GatewayError::Timeout | GatewayError::ConnectionError(_) => true,
            GatewayError::RequestFailed(message) => {
                message.contains("429") || message.contains("HTTP 5")
            }
            _ => false,
        }
    }

    async fn post_once(&self, body: &Value) -> Result<Value, GatewayError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GatewayError::RequestFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                detail.chars().take(300).collect::<String>()
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }

    async fn post_with_retry(&self, body: &Value) -> Result<Value, GatewayError> {
        let mut attempt = 0;
        loop {
            match self.post_once(body).await {
                Ok(value) => return Ok(value),
                Err(error) if Self::is_retryable(&error) && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(attempt, %error, "model request failed, retrying");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn generate_structured(
        &self,
        request: StructuredRequest,
    ) -> Result<StructuredResponse, GatewayError> {
        debug!(schema = %request.schema_name, "structured decode request");
        let body = self.structured_body(&request);
        let response = self.post_with_retry(&body).await?;
        let (content, tokens_used) = Self::parse_completion(&response)?;

        let value: Value = serde_json::from_str(&content).map_err(|e| {
            GatewayError::InvalidResponse(format!(
                "model output is not valid JSON for schema {}: {e}",
                request.schema_name
            ))
        })?;

        Ok(StructuredResponse { value, tokens_used })
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<ChatResponse, GatewayError> {
        debug!(messages = messages.len(), "chat request");
        let body = self.chat_body(messages, options);
        let response = self.post_with_retry(&body).await?;
        let (content, tokens_used) = Self::parse_completion(&response)?;
        Ok(ChatResponse {
            content,
            tokens_used,
        })
    }
}
