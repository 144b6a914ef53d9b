//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They deserialize with serde defaults so a partial file is always valid,
//! and convert into the application layer's `PipelineParams`.

use courier_application::PipelineParams;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors found while validating a loaded configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("model.name must not be empty")]
    EmptyModelName,

    #[error("model.base_url must not be empty")]
    EmptyBaseUrl,

    #[error("{field} must be at least 1")]
    ZeroBound { field: &'static str },
}

/// Model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    /// Base URL of an OpenAI-compatible chat-completions endpoint.
    pub base_url: String,
    /// Environment variable holding the API key. The key itself never
    /// appears in the config file.
    pub api_key_env: String,
    /// Model name sent with every request.
    pub name: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub request_timeout_secs: u64,
    /// Retries for transient failures (timeouts, 429, 5xx).
    pub max_retries: u32,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "COURIER_API_KEY".to_string(),
            name: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_output_tokens: 4_096,
            request_timeout_secs: 60,
            max_retries: 2,
        }
    }
}

/// Pipeline tuning knobs, mirrored into [`PipelineParams`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePipelineConfig {
    pub max_in_flight: usize,
    pub batch_size: usize,
    pub unit_prompt_chars: usize,
    pub max_messages_per_thread: usize,
    pub search_limit: usize,
    pub max_synthesis_prompt_tokens: u64,
    pub top_items_per_finding: usize,
    pub text_budget_chars: usize,
}

impl Default for FilePipelineConfig {
    fn default() -> Self {
        let params = PipelineParams::default();
        Self {
            max_in_flight: params.max_in_flight,
            batch_size: params.batch_size,
            unit_prompt_chars: params.unit_prompt_chars,
            max_messages_per_thread: params.max_messages_per_thread,
            search_limit: params.search_limit,
            max_synthesis_prompt_tokens: params.max_synthesis_prompt_tokens,
            top_items_per_finding: params.top_items_per_finding,
            text_budget_chars: params.text_budget_chars,
        }
    }
}

/// Where the mailbox corpus lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCorpusConfig {
    /// Path to the JSON mailbox file. `None` means the CLI must pass one.
    pub mailbox: Option<String>,
}

/// Pipeline trace output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Path for the JSONL pipeline trace. `None` disables tracing to disk.
    pub trace_file: Option<String>,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub model: FileModelConfig,
    pub pipeline: FilePipelineConfig,
    pub corpus: FileCorpusConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration. Returns the first fatal problem found.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.model.name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        if self.model.base_url.trim().is_empty() {
            return Err(ConfigValidationError::EmptyBaseUrl);
        }
        for (field, value) in [
            ("pipeline.max_in_flight", self.pipeline.max_in_flight),
            ("pipeline.batch_size", self.pipeline.batch_size),
            (
                "pipeline.max_messages_per_thread",
                self.pipeline.max_messages_per_thread,
            ),
            ("pipeline.search_limit", self.pipeline.search_limit),
            (
                "pipeline.top_items_per_finding",
                self.pipeline.top_items_per_finding,
            ),
            ("pipeline.text_budget_chars", self.pipeline.text_budget_chars),
        ] {
            if value == 0 {
                return Err(ConfigValidationError::ZeroBound { field });
            }
        }
        if self.pipeline.max_synthesis_prompt_tokens == 0 {
            return Err(ConfigValidationError::ZeroBound {
                field: "pipeline.max_synthesis_prompt_tokens",
            });
        }
        Ok(())
    }

    /// Convert the pipeline section into application-layer parameters.
    pub fn pipeline_params(&self) -> PipelineParams {
        PipelineParams::default()
            .with_max_in_flight(self.pipeline.max_in_flight)
            .with_batch_size(self.pipeline.batch_size)
            .with_unit_prompt_chars(self.pipeline.unit_prompt_chars)
            .with_max_messages_per_thread(self.pipeline.max_messages_per_thread)
            .with_search_limit(self.pipeline.search_limit)
            .with_max_synthesis_prompt_tokens(self.pipeline.max_synthesis_prompt_tokens)
            .with_top_items_per_finding(self.pipeline.top_items_per_finding)
            .with_text_budget_chars(self.pipeline.text_budget_chars)
    }
}
