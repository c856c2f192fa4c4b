//! API key resolution for classification providers
//!
//! Keys are never stored in the config file. `llm_api_keys` maps a provider id
//! to the *name* of an environment variable:
//!
//! ```toml
//! [llm_api_keys]
//! openai = "CUSTOM_OPENAI_KEY"
//! ```
//!
//! # Resolution Priority
//!
//! [`resolve_api_key`] checks, in order:
//! 1. The variable named in `llm_api_keys` for the provider
//! 2. The provider's conventional variable (e.g. `OPENAI_API_KEY`)
//!
//! Empty or whitespace-only values count as missing.

use crate::ProviderId;
use std::collections::HashMap;
use tracing::debug;

/// Source of secret values keyed by variable name
///
/// Production code reads the process environment; tests hand in a map so they
/// never have to mutate global state.
pub trait CredentialSource: Send + Sync {
    /// Look up a variable by name
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads credentials from the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl CredentialSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl CredentialSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Name of the environment variable holding the key for `provider`
pub fn api_key_var_name(
    provider: ProviderId,
    key_map: &HashMap<String, String>,
) -> Option<String> {
    key_map
        .get(provider.as_str())
        .cloned()
        .or_else(|| provider.default_env_var().map(str::to_string))
}

/// Resolve the API key for `provider`
///
/// Returns `None` when no variable is configured or the variable is unset or
/// blank. Whether that is fatal depends on [`ProviderId::requires_api_key`].
pub fn resolve_api_key(
    provider: ProviderId,
    key_map: &HashMap<String, String>,
    source: &dyn CredentialSource,
) -> Option<String> {
    let mapped = key_map.get(provider.as_str());

    if let Some(name) = mapped {
        if let Some(value) = non_blank(source.var(name)) {
            debug!(provider = %provider, var = %name, "Resolved API key from mapped variable");
            return Some(value);
        }
    }

    let fallback = provider.default_env_var()?;
    if mapped.is_some_and(|name| name == fallback) {
        return None;
    }

    let value = non_blank(source.var(fallback));
    if value.is_some() {
        debug!(provider = %provider, var = %fallback, "Resolved API key from default variable");
    }
    value
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_mapped_variable_wins() {
        let keys = env(&[("openai", "CUSTOM_OPENAI_KEY")]);
        let source = env(&[("CUSTOM_OPENAI_KEY", "sk-custom"), ("OPENAI_API_KEY", "sk-default")]);

        let key = resolve_api_key(ProviderId::OpenAI, &keys, &source);
        assert_eq!(key.as_deref(), Some("sk-custom"));
    }

    #[test]
    fn test_falls_back_to_default_variable() {
        let keys = env(&[("openai", "CUSTOM_OPENAI_KEY")]);
        let source = env(&[("OPENAI_API_KEY", "sk-default")]);

        let key = resolve_api_key(ProviderId::OpenAI, &keys, &source);
        assert_eq!(key.as_deref(), Some("sk-default"));
    }

    #[test]
    fn test_blank_value_is_missing() {
        let source = env(&[("ANTHROPIC_API_KEY", "   ")]);
        assert_eq!(
            resolve_api_key(ProviderId::Anthropic, &HashMap::new(), &source),
            None
        );
    }

    #[test]
    fn test_keyless_provider_resolves_nothing() {
        let source = env(&[("OPENAI_API_KEY", "sk-default")]);
        assert_eq!(
            resolve_api_key(ProviderId::Ollama, &HashMap::new(), &source),
            None
        );
    }

    #[test]
    fn test_var_name_reporting() {
        let keys = env(&[("anthropic", "MY_CLAUDE_KEY")]);
        assert_eq!(
            api_key_var_name(ProviderId::Anthropic, &keys).as_deref(),
            Some("MY_CLAUDE_KEY")
        );
        assert_eq!(
            api_key_var_name(ProviderId::OpenAI, &keys).as_deref(),
            Some("OPENAI_API_KEY")
        );
    }

    #[test]
    #[serial]
    fn test_process_env_source() {
        std::env::set_var("QUIRE_TEST_CREDENTIAL", "sk-from-env");
        let keys = env(&[("openai", "QUIRE_TEST_CREDENTIAL")]);

        let key = resolve_api_key(ProviderId::OpenAI, &keys, &ProcessEnv);
        std::env::remove_var("QUIRE_TEST_CREDENTIAL");

        assert_eq!(key.as_deref(), Some("sk-from-env"));
    }
}
