//! Anthropic messages API classifier

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

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 512;

/// Anthropic classification provider
pub struct AnthropicClassifier {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl AnthropicClassifier {
    /// Create a new Anthropic provider
    pub fn new(api_key: String, base_url: Option<String>, model: String, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| ProviderId::Anthropic.default_base_url().to_string()),
            model,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn build_body(&self, request: &ClassificationRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "temperature": 0.0,
            "system": request.system_prompt,
            "messages": [
                { "role": "user", "content": request.user_prompt },
            ],
        })
    }
}

#[async_trait]
impl ClassificationProvider for AnthropicClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> ClassifyResult<ClassificationResult> {
        let provider = ProviderId::Anthropic.as_str();
        let url = format!("{}/messages", self.base_url.trim_end_matches('/'));

        debug!(provider, model = %self.model, %url, "Sending classification request");
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&self.build_body(request))
            .timeout(self.timeout)
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

        let envelope: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| ClassifyError::parse(format!("Failed to parse response: {e}")))?;

        let text: String = envelope
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            return Err(ClassifyError::parse("No text content in response"));
        }

        parse_classification(&text, request)
    }

    fn provider_id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}
