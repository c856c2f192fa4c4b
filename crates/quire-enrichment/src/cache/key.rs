//! Content-addressed cache keys

use quire_config::ProviderId;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Inputs that determine a classification result
#[derive(Debug, Clone)]
pub struct CacheKeyInput<'a> {
    /// Trimmed note text
    pub text: &'a str,
    /// Allowed slugs; sorted before hashing
    pub slugs: &'a [String],
    /// Provider id
    pub provider: ProviderId,
    /// Model id
    pub model: &'a str,
    /// Prompt version
    pub prompt_version: &'a str,
    /// Fingerprint of a custom prompt template
    pub template: Option<&'a str>,
    /// Free-form tags were requested
    pub suggest_tags: bool,
}

// Field order is fixed so the serialized form is stable across runs
#[derive(Serialize)]
struct KeyMaterial<'a> {
    text: &'a str,
    slugs: Vec<&'a str>,
    provider: &'a str,
    model: &'a str,
    prompt_version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<&'a str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    suggest_tags: bool,
}

impl CacheKeyInput<'_> {
    /// SHA-256 of the canonical JSON form, hex encoded
    pub fn compute(&self) -> String {
        let mut slugs: Vec<&str> = self.slugs.iter().map(String::as_str).collect();
        slugs.sort_unstable();
        slugs.dedup();

        let material = KeyMaterial {
            text: self.text,
            slugs,
            provider: self.provider.as_str(),
            model: self.model,
            prompt_version: self.prompt_version,
            template: self.template,
            suggest_tags: self.suggest_tags,
        };

        // Serializing plain strings and bools cannot fail
        let canonical = serde_json::to_vec(&material).unwrap_or_default();
        hex::encode(Sha256::digest(&canonical))
    }
}
