//! Per-run classification policy

use crate::category::CategoryCatalog;
use quire_config::{ClassifierConfig, UndecidedPolicy};

/// Immutable policy applied to every note in a run
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationPolicy {
    /// Allowed slugs, sorted, including `other`
    pub allowed_slugs: Vec<String>,
    /// Resolution for undecided outcomes
    pub undecided_policy: UndecidedPolicy,
    /// Results below this confidence are undecided
    pub min_confidence: f64,
    /// Maximum suggestions recorded
    pub suggestions_count: usize,
    /// Characters kept from the start of long notes
    pub head_chars: usize,
    /// Characters kept from the end of long notes
    pub tail_chars: usize,
    /// Prompt version; part of the cache key
    pub prompt_version: String,
    /// Request free-form tags
    pub suggest_tags: bool,
    /// Cap on free-form tags
    pub tags_max_count: usize,
    /// Expected minimum of free-form tags
    pub tags_min_count: usize,
}

impl ClassificationPolicy {
    /// Build the policy from configuration and the run's catalog
    ///
    /// `min_confidence` is clamped into [0, 1]; NaN becomes the default 0.6.
    pub fn from_config(config: &ClassifierConfig, catalog: &CategoryCatalog) -> Self {
        let min_confidence = if config.llm_min_confidence.is_nan() {
            ClassifierConfig::default().llm_min_confidence
        } else {
            config.llm_min_confidence.clamp(0.0, 1.0)
        };

        Self {
            allowed_slugs: catalog.sorted_slugs(),
            undecided_policy: config.undecided_policy,
            min_confidence,
            suggestions_count: config.suggestions_count,
            head_chars: config.llm_head_chars,
            tail_chars: config.llm_tail_chars,
            prompt_version: config.llm_prompt_version.clone(),
            suggest_tags: config.llm_suggest_tags,
            tags_max_count: config.llm_tags_max_count,
            tags_min_count: config.llm_tags_min_count,
        }
    }

    /// Whether a confidence value passes the gate
    pub fn passes_confidence(&self, confidence: f64) -> bool {
        confidence >= self.min_confidence
    }
}
