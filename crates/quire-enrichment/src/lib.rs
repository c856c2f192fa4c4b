//! # Quire Enrichment
//!
//! Turns a note into a classification decision and applies it.
//!
//! ## Components
//!
//! - [`prompt`]: deterministic request construction (trimming, catalog
//!   rendering, optional template)
//! - [`cache`]: content-addressed, append-only result store with a single
//!   writer task
//! - [`retry`]: bounded exponential backoff around provider calls
//! - [`classifier`]: the per-note state machine, confidence gate, and
//!   undecided policy
//! - [`appliers`]: tag propagation and folder assignment
//! - [`report`]: aggregate Markdown report over the cache log
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quire_enrichment::create_category_classifier;
//! use tokio_util::sync::CancellationToken;
//!
//! let classifier = create_category_classifier(&config, provider).await?;
//! let decision = classifier.classify_note(&mut note, &CancellationToken::new()).await;
//! classifier.cache().flush().await?;
//! ```

#![warn(missing_docs)]

pub mod appliers;
pub mod cache;
pub mod classifier;
pub mod prompt;
pub mod report;
pub mod retry;

pub use appliers::{FolderResolver, TagFolderHeuristic, TagPropagator};
pub use cache::{CacheEntry, CacheKeyInput, CacheStore, LoadStats};
pub use classifier::{apply_decision, decide, normalize_tag, CategoryClassifier};
pub use prompt::{build_request, trim_text, PromptBuilder, PromptTemplate, TRIM_SEPARATOR};
pub use report::{CategoryReport, ReportError, ReportResult};
pub use retry::{call_with_retry, CallOutcome, RetryConfig, RetryOutcome};

use quire_config::ClassifierConfig;
use quire_core::{
    CategoryCatalog, ClassificationPolicy, ClassificationProvider, ClassifyError, ClassifyResult,
};
use std::sync::Arc;
use tracing::info;

/// Build a classifier for one run
///
/// Builds the catalog and policy, loads the prompt template if one is
/// configured, and opens the cache file when caching is enabled. An invalid
/// catalog is a configuration error; an unreadable template or cache only
/// logs a warning.
pub async fn create_category_classifier(
    config: &ClassifierConfig,
    provider: Arc<dyn ClassificationProvider>,
) -> ClassifyResult<CategoryClassifier> {
    let catalog = CategoryCatalog::from_config(&config.categories)
        .map_err(|e| ClassifyError::configuration(e.to_string()))?;
    let policy = ClassificationPolicy::from_config(config, &catalog);

    let template = PromptTemplate::load_optional(config.llm_prompt_template_path.as_deref()).await;
    let prompt = PromptBuilder::new(catalog, policy).with_template(template);

    let cache = if config.llm_cache_enabled {
        CacheStore::open(&config.llm_cache_path).await
    } else {
        CacheStore::disabled()
    };

    info!(
        provider = provider.provider_id().as_str(),
        model = provider.model_id(),
        categories = prompt.catalog().len(),
        cache_entries = cache.len(),
        "Category classifier ready"
    );

    Ok(CategoryClassifier::new(
        provider,
        prompt,
        Arc::new(cache),
        RetryConfig::with_max_retries(config.llm_max_retries),
    ))
}
