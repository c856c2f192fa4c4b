//! OpenAI chat completions classifier
//!
//! Also serves OpenAI-compatible local gateways (LM Studio, vLLM, llama.cpp
//! server). Those get the same request minus `response_format`, which many
//! gateways reject, and an optional key.

use super::response::{parse_classification, request_error, status_error};
use async_trait::async_trait;
use quire_config::ProviderId;
use quire_core::{
    ClassificationProvider, ClassificationRequest, ClassificationResult, ClassifyError,
    ClassifyResult,
};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// OpenAI (or OpenAI-compatible) classification provider
pub struct OpenAIClassifier {
    client: reqwest::Client,
    provider: ProviderId,
    api_key: Option<String>,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OpenAIClassifier {
    /// Create a provider for the hosted OpenAI API
    pub fn new(api_key: String, base_url: Option<String>, model: String, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider: ProviderId::OpenAI,
            api_key: Some(api_key),
            base_url: base_url
                .unwrap_or_else(|| ProviderId::OpenAI.default_base_url().to_string()),
            model,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Create a provider for a local OpenAI-compatible gateway
    pub fn compatible(
        api_key: Option<String>,
        base_url: String,
        model: String,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider: ProviderId::OpenAICompatible,
            api_key,
            base_url,
            model,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn build_body(&self, request: &ClassificationRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt },
            ],
            "temperature": 0.0,
        });

        // Hosted API only; local gateways vary in support
        if self.provider == ProviderId::OpenAI {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        body
    }
}

#[async_trait]
impl ClassificationProvider for OpenAIClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> ClassifyResult<ClassificationResult> {
        let provider = self.provider.as_str();
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&self.build_body(request))
            .timeout(self.timeout);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        debug!(provider, model = %self.model, %url, "Sending classification request");
        let response = builder
            .send()
            .await
            .map_err(|e| request_error(provider, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| request_error(provider, &e))?;
        if !status.is_success() {
            return Err(status_error(provider, status.as_u16(), &body));
        }

        let envelope: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| ClassifyError::parse(format!("Failed to parse response: {e}")))?;

        let content = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ClassifyError::parse("No message content in response"))?;

        parse_classification(&content, request)
    }

    fn provider_id(&self) -> ProviderId {
        self.provider
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
