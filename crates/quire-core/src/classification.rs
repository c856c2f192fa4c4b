//! Classification requests and results

use serde::{Deserialize, Serialize};

/// Raw answer from a provider, or the same answer reloaded from cache
///
/// Immutable once produced. Policy decisions (confidence gate, undecided
/// resolution) never modify it; they read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Chosen slug; `None` when the model declined or named an unknown slug
    pub category_slug: Option<String>,
    /// Model confidence in [0, 1]
    pub confidence: f64,
    /// Model's reasoning text
    #[serde(default)]
    pub reasons: String,
    /// Alternative categories, at most `suggestions_count`
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Model marked the note as undecided
    #[serde(default)]
    pub undecided: bool,
    /// Free-form tags, when requested
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl ClassificationResult {
    /// A confident result for `slug`
    pub fn decided(slug: impl Into<String>, confidence: f64) -> Self {
        Self {
            category_slug: Some(slug.into()),
            confidence,
            reasons: String::new(),
            suggestions: Vec::new(),
            undecided: false,
            tags: Vec::new(),
        }
    }

    /// An undecided result carrying suggestions
    pub fn undecided(confidence: f64, suggestions: Vec<String>) -> Self {
        Self {
            category_slug: None,
            confidence,
            reasons: String::new(),
            suggestions,
            undecided: true,
            tags: Vec::new(),
        }
    }

    /// Set the reasoning text
    pub fn with_reasons(mut self, reasons: impl Into<String>) -> Self {
        self.reasons = reasons.into();
        self
    }

    /// Set the suggestions
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// Set the free-form tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Everything a provider needs for one classification call
///
/// Derived per note by the prompt builder and never persisted. Two requests
/// built from the same inputs are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRequest {
    /// Note text after head/tail trimming
    pub trimmed_text: String,
    /// Allowed slugs, sorted, including `other`
    pub allowed_slugs: Vec<String>,
    /// Maximum number of alternative slugs to request
    pub suggestions_count: usize,
    /// Whether free-form tags are requested
    pub suggest_tags: bool,
    /// Maximum number of free-form tags
    pub tags_max_count: usize,
    /// Prompt version in effect
    pub prompt_version: String,
    /// Instructions for the model
    pub system_prompt: String,
    /// Rendered prompt including the note text
    pub user_prompt: String,
}

impl ClassificationRequest {
    /// Whether `slug` may be returned as the category
    pub fn allows(&self, slug: &str) -> bool {
        self.allowed_slugs.iter().any(|s| s == slug)
    }
}
