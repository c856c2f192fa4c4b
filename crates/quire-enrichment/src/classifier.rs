//! Classifier Orchestrator
//!
//! Runs the per-note state machine:
//!
//! ```text
//! Pending -> CacheLookup -> CacheHit -> Decided
//!                        -> CacheMiss -> Requesting -> Success -> Decided
//!                                                  -> Retryable -> Requesting
//!                                                  -> Exhausted -> Decided (undecided)
//! ```
//!
//! [`CategoryClassifier::classify`] computes a [`ClassificationDecision`]
//! without touching the note. [`apply_decision`] then writes every
//! classification field in one step, so a note is never observed half
//! classified.
//!
//! Raw provider results are cached before policy is applied. A later run with
//! a different confidence threshold reinterprets the cached answer without a
//! new call.

use crate::cache::{CacheKeyInput, CacheStore};
use crate::prompt::PromptBuilder;
use crate::retry::{call_with_retry, RetryConfig, RetryOutcome};
use quire_core::{
    keys, ClassificationDecision, ClassificationOutcome, ClassificationPolicy,
    ClassificationProvider, ClassificationResult, ClassificationSource, ClassifyError, Note,
    UndecidedPolicy, OTHER_SLUG,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Orchestrates prompt building, caching, provider calls, and policy
pub struct CategoryClassifier {
    provider: Arc<dyn ClassificationProvider>,
    prompt: PromptBuilder,
    cache: Arc<CacheStore>,
    retry: RetryConfig,
}

impl CategoryClassifier {
    /// Create a classifier
    pub fn new(
        provider: Arc<dyn ClassificationProvider>,
        prompt: PromptBuilder,
        cache: Arc<CacheStore>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            provider,
            prompt,
            cache,
            retry,
        }
    }

    /// The run's policy
    pub fn policy(&self) -> &ClassificationPolicy {
        self.prompt.policy()
    }

    /// The cache store
    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Provider id, as recorded in diagnostics
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_id().as_str()
    }

    /// Model id, as recorded in diagnostics
    pub fn model_name(&self) -> &str {
        self.provider.model_id()
    }

    /// Decide the category for a note without modifying it
    pub async fn classify(&self, note: &Note, cancel: &CancellationToken) -> ClassificationDecision {
        let request = self.prompt.build(&note.text);
        let key = CacheKeyInput {
            text: &request.trimmed_text,
            slugs: &request.allowed_slugs,
            provider: self.provider.provider_id(),
            model: self.provider.model_id(),
            prompt_version: &request.prompt_version,
            template: self.prompt.template_fingerprint(),
            suggest_tags: request.suggest_tags,
        }
        .compute();

        if let Some(result) = self.cache.lookup(&key) {
            info!(note_id = %note.id, category = ?result.category_slug, "Classification served from cache");
            return self.decision_from_result(result, ClassificationSource::Cache, 0);
        }

        if cancel.is_cancelled() {
            debug!(note_id = %note.id, "Run cancelled, note left unclassified");
            return ClassificationDecision::cancelled(self.provider_name(), self.model_name(), 0);
        }

        match call_with_retry(self.provider.as_ref(), &request, &self.retry, cancel, &note.id).await {
            RetryOutcome::Success { result, attempts } => {
                info!(
                    note_id = %note.id,
                    category = ?result.category_slug,
                    confidence = result.confidence,
                    attempts,
                    "Classification requested"
                );
                self.cache.insert(&key, &result);
                self.decision_from_result(result, ClassificationSource::Fresh, attempts)
            }
            RetryOutcome::Failed { error, attempts } => {
                error!(note_id = %note.id, attempts, error = %error, "Classification failed, note left undecided");
                self.decision_from_error(error, attempts)
            }
            RetryOutcome::Cancelled { attempts } => {
                ClassificationDecision::cancelled(self.provider_name(), self.model_name(), attempts)
            }
        }
    }

    /// Classify a note and apply the decision to it
    ///
    /// A cancelled note is left untouched.
    pub async fn classify_note(
        &self,
        note: &mut Note,
        cancel: &CancellationToken,
    ) -> ClassificationDecision {
        let decision = self.classify(note, cancel).await;
        if !decision.is_cancelled() {
            apply_decision(note, &decision);
        }
        decision
    }

    fn decision_from_result(
        &self,
        result: ClassificationResult,
        source: ClassificationSource,
        attempts: u32,
    ) -> ClassificationDecision {
        let policy = self.policy();
        let (category, outcome) = decide(&result, policy);
        let suggestions = dedup_truncate(&result.suggestions, policy.suggestions_count);
        let llm_tags = if policy.suggest_tags {
            normalize_tags(&result.tags, policy.tags_max_count)
        } else {
            Vec::new()
        };
        if policy.suggest_tags && llm_tags.len() < policy.tags_min_count {
            debug!(
                got = llm_tags.len(),
                expected = policy.tags_min_count,
                "Fewer model tags than requested"
            );
        }

        ClassificationDecision {
            category,
            outcome,
            source,
            result: Some(result),
            suggestions,
            llm_tags,
            error: None,
            attempts,
            provider: self.provider_name().to_string(),
            model: self.model_name().to_string(),
        }
    }

    fn decision_from_error(&self, error: ClassifyError, attempts: u32) -> ClassificationDecision {
        ClassificationDecision {
            category: undecided_category(self.policy().undecided_policy),
            outcome: ClassificationOutcome::UndecidedError,
            source: ClassificationSource::None,
            result: None,
            suggestions: Vec::new(),
            llm_tags: Vec::new(),
            error: Some(error),
            attempts,
            provider: self.provider_name().to_string(),
            model: self.model_name().to_string(),
        }
    }
}

/// Apply the confidence gate and undecided policy to a raw result
///
/// Returns the category to assign and the decision path. The result itself is
/// never modified.
pub fn decide(
    result: &ClassificationResult,
    policy: &ClassificationPolicy,
) -> (Option<String>, ClassificationOutcome) {
    let confident_slug = result
        .category_slug
        .as_deref()
        .filter(|_| !result.undecided)
        .filter(|_| policy.passes_confidence(result.confidence))
        .filter(|slug| *slug == OTHER_SLUG || policy.allowed_slugs.iter().any(|s| s == slug));

    match confident_slug {
        Some(slug) => (Some(slug.to_string()), ClassificationOutcome::Classified),
        None => (
            undecided_category(policy.undecided_policy),
            ClassificationOutcome::UndecidedPolicy,
        ),
    }
}

fn undecided_category(policy: UndecidedPolicy) -> Option<String> {
    match policy {
        UndecidedPolicy::Other => Some(OTHER_SLUG.to_string()),
        UndecidedPolicy::Suggest => None,
    }
}

/// Write a decision onto a note
///
/// Sets `category` when the decision carries one, records model tags, and
/// stores the diagnostics object. An undecided `suggest` outcome leaves any
/// category the source supplied in place and records suggestions instead.
/// Applying the same decision twice is a no-op.
pub fn apply_decision(note: &mut Note, decision: &ClassificationDecision) {
    if let Some(category) = decision.category.as_deref() {
        note.set_category(Some(category));
    }
    let suggestions: &[String] = if decision.category.is_none() {
        &decision.suggestions
    } else {
        &[]
    };
    note.set_string_list(keys::CATEGORY_SUGGESTIONS, suggestions);
    note.set_string_list(keys::LLM_TAGS, &decision.llm_tags);

    match serde_json::to_value(decision.diagnostics()) {
        Ok(value) => {
            note.metadata.insert(keys::CLASSIFICATION.to_string(), value);
        }
        Err(e) => error!(note_id = %note.id, error = %e, "Could not record classification diagnostics"),
    }
}

/// Lowercase kebab-case form of a free-form tag
///
/// Runs of non-alphanumeric characters become a single `-`; leading and
/// trailing dashes are removed. Returns an empty string when nothing remains.
pub fn normalize_tag(tag: &str) -> String {
    let mut out = String::with_capacity(tag.len());
    let mut pending_dash = false;
    for c in tag.trim().chars() {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

fn normalize_tags(tags: &[String], max: usize) -> Vec<String> {
    let normalized: Vec<String> = tags.iter().map(|t| normalize_tag(t)).collect();
    dedup_truncate(&normalized, max)
}

fn dedup_truncate(values: &[String], max: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(max.min(values.len()));
    for value in values {
        if out.len() >= max {
            break;
        }
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_config::ClassifierConfig;
    use quire_core::{Category, CategoryCatalog};
    use quire_llm::MockClassifier;
    use serde_json::json;

    fn policy(config: &ClassifierConfig) -> ClassificationPolicy {
        let catalog = CategoryCatalog::new(vec![
            Category::new("Cocktails", "cocktails", ""),
            Category::new("Recipes", "recipes", ""),
        ])
        .unwrap();
        ClassificationPolicy::from_config(config, &catalog)
    }

    fn classifier(mock: &MockClassifier, config: &ClassifierConfig) -> CategoryClassifier {
        let catalog = CategoryCatalog::new(vec![
            Category::new("Cocktails", "cocktails", ""),
            Category::new("Recipes", "recipes", ""),
        ])
        .unwrap();
        let policy = ClassificationPolicy::from_config(config, &catalog);
        CategoryClassifier::new(
            Arc::new(mock.clone()),
            PromptBuilder::new(catalog, policy),
            Arc::new(CacheStore::disabled()),
            RetryConfig::immediate(config.llm_max_retries),
        )
    }

    // ============================================================================
    // Policy
    // ============================================================================

    #[test]
    fn test_confidence_gate_boundary() {
        let policy = policy(&ClassifierConfig::default());

        let (category, outcome) = decide(&ClassificationResult::decided("cocktails", 0.59), &policy);
        assert_eq!(category, None);
        assert_eq!(outcome, ClassificationOutcome::UndecidedPolicy);

        let (category, outcome) = decide(&ClassificationResult::decided("cocktails", 0.61), &policy);
        assert_eq!(category.as_deref(), Some("cocktails"));
        assert_eq!(outcome, ClassificationOutcome::Classified);
    }

    #[test]
    fn test_other_policy_assigns_other() {
        let config = ClassifierConfig {
            undecided_policy: UndecidedPolicy::Other,
            ..Default::default()
        };
        let (category, outcome) = decide(&ClassificationResult::undecided(0.2, vec![]), &policy(&config));
        assert_eq!(category.as_deref(), Some("other"));
        assert_eq!(outcome, ClassificationOutcome::UndecidedPolicy);
    }

    #[test]
    fn test_model_undecided_flag_wins_over_slug() {
        let mut result = ClassificationResult::decided("cocktails", 0.95);
        result.undecided = true;
        let (category, _) = decide(&result, &policy(&ClassifierConfig::default()));
        assert_eq!(category, None);
    }

    #[test]
    fn test_unknown_slug_is_undecided() {
        let (category, outcome) = decide(
            &ClassificationResult::decided("astronomy", 0.95),
            &policy(&ClassifierConfig::default()),
        );
        assert_eq!(category, None);
        assert_eq!(outcome, ClassificationOutcome::UndecidedPolicy);
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("  Gin & Tonic "), "gin-tonic");
        assert_eq!(normalize_tag("--Mixology--"), "mixology");
        assert_eq!(normalize_tag("Café_Culture"), "café-culture");
        assert_eq!(normalize_tag("!!!"), "");
    }

    #[test]
    fn test_dedup_truncate_preserves_order() {
        let values: Vec<String> = ["recipes", "recipes", "", "music", "travel"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(dedup_truncate(&values, 2), vec!["recipes", "music"]);
    }

    // ============================================================================
    // Orchestration
    // ============================================================================

    #[tokio::test]
    async fn test_suggest_policy_records_truncated_suggestions() {
        let config = ClassifierConfig {
            suggestions_count: 2,
            ..Default::default()
        };
        let mock = MockClassifier::returning(ClassificationResult::undecided(
            0.2,
            vec!["cocktails".into(), "cocktails".into(), "recipes".into(), "music".into()],
        ));
        let classifier = classifier(&mock, &config);
        let mut note = Note::new("n1", "something vague");

        let decision = classifier.classify_note(&mut note, &CancellationToken::new()).await;

        assert_eq!(decision.outcome, ClassificationOutcome::UndecidedPolicy);
        assert_eq!(note.category(), None);
        assert_eq!(
            note.metadata[keys::CATEGORY_SUGGESTIONS],
            json!(["cocktails", "recipes"])
        );
        assert_eq!(
            note.metadata[keys::CLASSIFICATION]["suggestions"],
            json!(["cocktails", "cocktails", "recipes", "music"])
        );
    }

    #[tokio::test]
    async fn test_suggest_keeps_category_from_source() {
        let mut metadata = serde_json::Map::new();
        metadata.insert(keys::CATEGORY.to_string(), json!("recipes"));
        let mut note = Note::new("n1", "something vague").with_metadata(metadata);

        let undecided = MockClassifier::returning(ClassificationResult::undecided(
            0.2,
            vec!["cocktails".into()],
        ));
        classifier(&undecided, &ClassifierConfig::default())
            .classify_note(&mut note, &CancellationToken::new())
            .await;
        assert_eq!(note.category(), Some("recipes"));
        assert_eq!(note.metadata[keys::CATEGORY_SUGGESTIONS], json!(["cocktails"]));

        let failing = MockClassifier::failing(ClassifyError::configuration("bad key"));
        let decision = classifier(&failing, &ClassifierConfig::default())
            .classify_note(&mut note, &CancellationToken::new())
            .await;
        assert_eq!(decision.outcome, ClassificationOutcome::UndecidedError);
        assert_eq!(note.category(), Some("recipes"));
    }

    #[tokio::test]
    async fn test_error_is_demoted_to_undecided() {
        let config = ClassifierConfig {
            undecided_policy: UndecidedPolicy::Other,
            llm_max_retries: 2,
            ..Default::default()
        };
        let mock = MockClassifier::failing(ClassifyError::timeout("deadline"));
        let classifier = classifier(&mock, &config);
        let mut note = Note::new("n1", "text");

        let decision = classifier.classify_note(&mut note, &CancellationToken::new()).await;

        assert_eq!(mock.call_count(), 3);
        assert_eq!(decision.attempts, 3);
        assert_eq!(decision.outcome, ClassificationOutcome::UndecidedError);
        assert_eq!(note.category(), Some("other"));
        assert_eq!(note.metadata[keys::CLASSIFICATION]["outcome"], "undecided_error");
        assert_eq!(note.metadata[keys::CLASSIFICATION]["source"], "none");
        assert!(note.metadata[keys::CLASSIFICATION]["error"].is_string());
    }

    #[tokio::test]
    async fn test_llm_tags_normalized_and_capped() {
        let config = ClassifierConfig {
            llm_suggest_tags: true,
            llm_tags_max_count: 2,
            ..Default::default()
        };
        let mock = MockClassifier::returning(
            ClassificationResult::decided("cocktails", 0.9)
                .with_tags(vec!["Gin".into(), "gin".into(), "Campari Bitter".into(), "bar".into()]),
        );
        let classifier = classifier(&mock, &config);
        let mut note = Note::new("n1", "Negroni");

        classifier.classify_note(&mut note, &CancellationToken::new()).await;

        assert_eq!(note.metadata[keys::LLM_TAGS], json!(["gin", "campari-bitter"]));
    }

    #[tokio::test]
    async fn test_cancelled_note_is_untouched() {
        let mock = MockClassifier::returning(ClassificationResult::decided("cocktails", 0.9));
        let classifier = classifier(&mock, &ClassifierConfig::default());
        let mut note = Note::new("n1", "Negroni");
        let before = note.clone();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let decision = classifier.classify_note(&mut note, &cancel).await;

        assert!(decision.is_cancelled());
        assert_eq!(note, before);
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_apply_decision_twice_is_stable() {
        let decision = ClassificationDecision {
            category: Some("cocktails".into()),
            outcome: ClassificationOutcome::Classified,
            source: ClassificationSource::Fresh,
            result: Some(ClassificationResult::decided("cocktails", 0.9)),
            suggestions: Vec::new(),
            llm_tags: vec!["gin".into()],
            error: None,
            attempts: 1,
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
        };
        let mut once = Note::new("n1", "text");
        apply_decision(&mut once, &decision);
        let mut twice = once.clone();
        apply_decision(&mut twice, &decision);
        assert_eq!(once, twice);
    }
}
