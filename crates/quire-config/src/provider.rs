//! Provider identifiers
//!
//! The set of classification backends is closed: every backend the classifier
//! can talk to has a variant here. Configuration carries the id as a string so
//! that an unknown id can be reported as a configuration problem at startup
//! instead of failing later at call time.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Validated provider id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    /// Hosted OpenAI chat completions API (key-based)
    #[serde(rename = "openai")]
    OpenAI,
    /// Hosted Anthropic messages API (key-based)
    Anthropic,
    /// Local Ollama server (no key)
    Ollama,
    /// Local gateway speaking the OpenAI chat completions dialect
    /// (LM Studio, vLLM, llama.cpp server, ...). A key is optional.
    #[serde(rename = "openai-compatible")]
    OpenAICompatible,
}

impl ProviderId {
    /// All known providers
    pub const ALL: [ProviderId; 4] = [
        ProviderId::OpenAI,
        ProviderId::Anthropic,
        ProviderId::Ollama,
        ProviderId::OpenAICompatible,
    ];

    /// Canonical string form, as used in config files and the cache key
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAI => "openai",
            ProviderId::Anthropic => "anthropic",
            ProviderId::Ollama => "ollama",
            ProviderId::OpenAICompatible => "openai-compatible",
        }
    }

    /// Whether a call cannot be made without an API key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::OpenAI | ProviderId::Anthropic)
    }

    /// Environment variable consulted when `llm_api_keys` has no entry
    pub fn default_env_var(&self) -> Option<&'static str> {
        match self {
            ProviderId::OpenAI => Some("OPENAI_API_KEY"),
            ProviderId::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderId::OpenAICompatible => Some("OPENAI_COMPATIBLE_API_KEY"),
            ProviderId::Ollama => None,
        }
    }

    /// Endpoint used when `llm_base_url` is not set
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderId::OpenAI => "https://api.openai.com/v1",
            ProviderId::Anthropic => "https://api.anthropic.com/v1",
            ProviderId::Ollama => "http://localhost:11434",
            ProviderId::OpenAICompatible => "http://localhost:1234/v1",
        }
    }

    /// Model used when `llm_model` is not set
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderId::OpenAI => "gpt-4o-mini",
            ProviderId::Anthropic => "claude-3-5-haiku-latest",
            ProviderId::Ollama => "llama3.2",
            ProviderId::OpenAICompatible => "local-model",
        }
    }

    /// Whether `llm_base_url` is meaningful for this backend
    pub fn is_local(&self) -> bool {
        matches!(self, ProviderId::Ollama | ProviderId::OpenAICompatible)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderId::OpenAI),
            "anthropic" => Ok(ProviderId::Anthropic),
            "ollama" => Ok(ProviderId::Ollama),
            "openai-compatible" | "openai_compatible" | "local" => {
                Ok(ProviderId::OpenAICompatible)
            }
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}
