//! Ollama chat classifier

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

/// Ollama classification provider
pub struct OllamaClassifier {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaClassifier {
    /// Create a new Ollama provider
    pub fn new(base_url: String, model: String, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            model,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[async_trait]
impl ClassificationProvider for OllamaClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> ClassifyResult<ClassificationResult> {
        let provider = ProviderId::Ollama.as_str();
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));

        let api_request = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt },
            ],
            "stream": false,
            "format": "json",
            "options": { "temperature": 0.0 },
        });

        debug!(provider, model = %self.model, %url, "Sending classification request");
        let response = self
            .client
            .post(&url)
            .json(&api_request)
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

        let envelope: OllamaChatResponse = serde_json::from_str(&body)
            .map_err(|e| ClassifyError::parse(format!("Failed to parse response: {e}")))?;

        parse_classification(&envelope.message.content, request)
    }

    fn provider_id(&self) -> ProviderId {
        ProviderId::Ollama
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}
