//! Classification provider implementations

pub mod anthropic;
pub mod ollama;
pub mod openai;
pub mod response;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

// Re-export providers
pub use anthropic::AnthropicClassifier;
pub use ollama::OllamaClassifier;
pub use openai::OpenAIClassifier;

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockClassifier;

use quire_config::{api_key_var_name, resolve_api_key, ClassifierConfig, CredentialSource, ProviderId};
use quire_core::{ClassificationProvider, ClassifyError, ClassifyResult};
use std::sync::Arc;
use tracing::info;

/// Create the configured classification provider
///
/// Called once per run; the returned handle is passed explicitly to the
/// classifier, so no provider state outlives the run.
///
/// Fails with [`ClassifyError::Configuration`] before any network call when
/// the provider id is unknown or a key-based provider has no resolvable key.
pub fn create_classification_provider(
    config: &ClassifierConfig,
    credentials: &dyn CredentialSource,
) -> ClassifyResult<Arc<dyn ClassificationProvider>> {
    let provider = config
        .provider_id()
        .map_err(|e| ClassifyError::configuration(e.to_string()))?;
    let model = config
        .model_id()
        .map_err(|e| ClassifyError::configuration(e.to_string()))?;
    let base_url = config
        .base_url()
        .map_err(|e| ClassifyError::configuration(e.to_string()))?;
    let timeout = config.llm_timeout_sec;

    let api_key = resolve_api_key(provider, &config.llm_api_keys, credentials);
    if provider.requires_api_key() && api_key.is_none() {
        let var = api_key_var_name(provider, &config.llm_api_keys)
            .unwrap_or_else(|| "an API key variable".to_string());
        return Err(ClassifyError::configuration(format!(
            "{provider} requires an API key; set {var}"
        )));
    }

    let created: Arc<dyn ClassificationProvider> = match (provider, api_key) {
        (ProviderId::OpenAI, Some(key)) => {
            Arc::new(OpenAIClassifier::new(key, Some(base_url), model, timeout))
        }
        (ProviderId::Anthropic, Some(key)) => {
            Arc::new(AnthropicClassifier::new(key, Some(base_url), model, timeout))
        }
        (ProviderId::Ollama, _) => Arc::new(OllamaClassifier::new(base_url, model, timeout)),
        (ProviderId::OpenAICompatible, key) => {
            Arc::new(OpenAIClassifier::compatible(key, base_url, model, timeout))
        }
        (id, None) => {
            return Err(ClassifyError::configuration(format!(
                "{id} requires an API key"
            )))
        }
    };

    info!(
        provider = %created.provider_id(),
        model = %created.model_id(),
        "Classification provider ready"
    );
    Ok(created)
}
