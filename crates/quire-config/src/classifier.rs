//! Classifier policy and provider configuration
//!
//! Every field has a default so a partial file (or no file at all) yields a
//! usable configuration. Field names match the keys users write in their
//! config files.

use crate::{ConfigError, ProviderId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

/// What to do with a note whose classification ended undecided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndecidedPolicy {
    /// Assign the reserved `other` slug
    Other,
    /// Leave the category unset and record the model's suggestions
    #[default]
    Suggest,
}

impl fmt::Display for UndecidedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndecidedPolicy::Other => f.write_str("other"),
            UndecidedPolicy::Suggest => f.write_str("suggest"),
        }
    }
}

/// A category as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Human-readable name
    pub name: String,
    /// Machine identifier, unique within a run
    pub slug: String,
    /// Description shown to the model
    #[serde(default)]
    pub description: String,
}

impl CategoryConfig {
    /// Create a category entry
    pub fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            description: description.into(),
        }
    }
}

/// Configuration for LLM-backed note classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Master switch; when off no provider is constructed
    pub enable_llm_categorization: bool,
    /// Category catalog offered to the model
    pub categories: Vec<CategoryConfig>,

    /// Provider id (`openai`, `anthropic`, `ollama`, `openai-compatible`)
    pub llm_provider: String,
    /// Model id; the provider default when unset
    pub llm_model: Option<String>,
    /// Provider id to environment variable name holding its key
    pub llm_api_keys: HashMap<String, String>,
    /// Endpoint override for local HTTP backends
    pub llm_base_url: Option<String>,
    /// Per-request timeout in seconds
    pub llm_timeout_sec: u64,
    /// Retries after the first attempt for retryable failures
    pub llm_max_retries: u32,
    /// Number of notes classified in parallel (1 = sequential)
    pub llm_concurrency: usize,

    /// Whether results are cached on disk
    pub llm_cache_enabled: bool,
    /// Append-only JSONL cache file
    pub llm_cache_path: PathBuf,

    /// Results below this confidence are treated as undecided
    pub llm_min_confidence: f64,
    /// Characters kept from the start of long notes
    pub llm_head_chars: usize,
    /// Characters kept from the end of long notes
    pub llm_tail_chars: usize,
    /// Resolution for undecided outcomes
    pub undecided_policy: UndecidedPolicy,
    /// Maximum alternative categories requested from the model
    pub suggestions_count: usize,
    /// Bumping this invalidates every cached result
    pub llm_prompt_version: String,
    /// Optional prompt template replacing the built-in prompt
    pub llm_prompt_template_path: Option<PathBuf>,

    /// Ask the model for free-form tags as well
    pub llm_suggest_tags: bool,
    /// Cap on model-suggested tags
    pub llm_tags_max_count: usize,
    /// Minimum expected model-suggested tags (logged, not enforced)
    pub llm_tags_min_count: usize,

    /// Add the chosen category slug to the note's tags
    pub propagate_category_tag: bool,
    /// Add suggestions to the tags when the outcome is `other`
    pub propagate_suggested_categories_when_other: bool,
    /// Add model-suggested tags to the note's tags
    pub propagate_llm_tags: bool,

    /// Category slug to folder path
    pub category_folder_rules: BTreeMap<String, String>,
    /// Tag to folder path, used when no category decides the folder
    pub tag_folder_rules: BTreeMap<String, String>,
    /// Folder used by the tag heuristic when no rule matches
    pub default_folder: Option<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enable_llm_categorization: false,
            categories: Vec::new(),
            llm_provider: ProviderId::OpenAI.as_str().to_string(),
            llm_model: None,
            llm_api_keys: HashMap::new(),
            llm_base_url: None,
            llm_timeout_sec: 30,
            llm_max_retries: 2,
            llm_concurrency: 4,
            llm_cache_enabled: true,
            llm_cache_path: PathBuf::from(".cache/llm_category.jsonl"),
            llm_min_confidence: 0.6,
            llm_head_chars: 2500,
            llm_tail_chars: 500,
            undecided_policy: UndecidedPolicy::Suggest,
            suggestions_count: 3,
            llm_prompt_version: "v1".to_string(),
            llm_prompt_template_path: None,
            llm_suggest_tags: false,
            llm_tags_max_count: 5,
            llm_tags_min_count: 0,
            propagate_category_tag: true,
            propagate_suggested_categories_when_other: false,
            propagate_llm_tags: true,
            category_folder_rules: BTreeMap::new(),
            tag_folder_rules: default_tag_folder_rules(),
            default_folder: Some("misc".to_string()),
        }
    }
}

/// Built-in tag to folder table used by the folder heuristic
pub fn default_tag_folder_rules() -> BTreeMap<String, String> {
    [
        ("cocktails", "cocktails"),
        ("drinks", "cocktails"),
        ("recipes", "recipes"),
        ("cooking", "recipes"),
        ("fermentation", "recipes/fermentation"),
        ("gaming", "gaming"),
        ("music", "music"),
        ("drum-and-bass", "music/electronic"),
        ("electronic", "music/electronic"),
        ("mixes", "music/mixes"),
        ("vinyl", "music/vinyl"),
        ("health", "health"),
        ("fitness", "health"),
        ("technology", "tech"),
        ("programming", "tech/programming"),
        ("networking", "tech/networking"),
        ("hardware", "tech/hardware"),
        ("entertainment", "entertainment"),
        ("movies", "entertainment/movies"),
        ("books", "entertainment/books"),
        ("anime", "entertainment/anime"),
        ("board-games", "entertainment/games"),
        ("gardening", "gardening"),
        ("journal", "journal"),
        ("lists", "reference/lists"),
        ("reference", "reference"),
    ]
    .into_iter()
    .map(|(tag, folder)| (tag.to_string(), folder.to_string()))
    .collect()
}

impl ClassifierConfig {
    /// Parse `llm_provider` into a validated id
    pub fn provider_id(&self) -> Result<ProviderId, ConfigError> {
        self.llm_provider.parse()
    }

    /// Model id to use, falling back to the provider default
    pub fn model_id(&self) -> Result<String, ConfigError> {
        let provider = self.provider_id()?;
        Ok(self
            .llm_model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(provider.default_model())
            .to_string())
    }

    /// Endpoint to use, falling back to the provider default
    pub fn base_url(&self) -> Result<String, ConfigError> {
        let provider = self.provider_id()?;
        let url = match (&self.llm_base_url, provider.is_local()) {
            (Some(url), true) if !url.trim().is_empty() => url.trim(),
            _ => provider.default_base_url(),
        };
        Ok(url.trim_end_matches('/').to_string())
    }

    /// Worker count, never below one
    pub fn effective_concurrency(&self) -> usize {
        self.llm_concurrency.max(1)
    }

    /// Human-readable problems with this configuration
    ///
    /// Never fails: values that are out of range are clamped where they are
    /// used, and the warnings explain what will happen.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !(0.0..=1.0).contains(&self.llm_min_confidence) {
            warnings.push(format!(
                "llm_min_confidence must be within [0, 1] (got {}); it will be clamped",
                self.llm_min_confidence
            ));
        }

        if self.llm_concurrency == 0 {
            warnings.push("llm_concurrency must be >= 1; running sequentially".to_string());
        }

        match self.provider_id() {
            Err(e) => warnings.push(format!("llm_provider: {e}")),
            Ok(provider) if self.llm_base_url.is_some() && !provider.is_local() => {
                warnings.push(format!(
                    "llm_base_url is ignored for hosted provider '{provider}'"
                ));
            }
            Ok(_) => {}
        }

        if self.llm_tags_min_count > self.llm_tags_max_count {
            warnings.push(format!(
                "llm_tags_min_count must be <= llm_tags_max_count ({} > {})",
                self.llm_tags_min_count, self.llm_tags_max_count
            ));
        }

        if let Some(path) = &self.llm_prompt_template_path {
            if !path.is_file() {
                warnings.push(format!(
                    "llm_prompt_template_path not found: {}; using built-in prompt",
                    path.display()
                ));
            }
        }

        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.slug.trim().is_empty() {
                warnings.push(format!("category '{}' has an empty slug", category.name));
            } else if !seen.insert(category.slug.as_str()) {
                warnings.push(format!("duplicate category slug: {}", category.slug));
            }
        }

        if self.enable_llm_categorization && self.categories.is_empty() {
            warnings.push(
                "enable_llm_categorization is on but no categories are configured".to_string(),
            );
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClassifierConfig::default();
        assert!(!config.enable_llm_categorization);
        assert_eq!(config.undecided_policy, UndecidedPolicy::Suggest);
        assert_eq!(config.llm_max_retries, 2);
        assert_eq!(config.llm_min_confidence, 0.6);
        assert_eq!(config.llm_prompt_version, "v1");
        assert_eq!(
            config.tag_folder_rules.get("drum-and-bass").map(String::as_str),
            Some("music/electronic")
        );
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_model_and_url_fall_back_to_provider_defaults() {
        let mut config = ClassifierConfig {
            llm_provider: "ollama".to_string(),
            ..Default::default()
        };
        assert_eq!(config.model_id().unwrap(), "llama3.2");
        assert_eq!(config.base_url().unwrap(), "http://localhost:11434");

        config.llm_base_url = Some("http://gpu-box:11434/".to_string());
        config.llm_model = Some("qwen2.5".to_string());
        assert_eq!(config.base_url().unwrap(), "http://gpu-box:11434");
        assert_eq!(config.model_id().unwrap(), "qwen2.5");
    }

    #[test]
    fn test_hosted_provider_ignores_base_url() {
        let config = ClassifierConfig {
            llm_base_url: Some("http://localhost:9999".to_string()),
            ..Default::default()
        };
        assert_eq!(config.base_url().unwrap(), "https://api.openai.com/v1");
        assert!(config
            .validate()
            .iter()
            .any(|w| w.contains("llm_base_url is ignored")));
    }

    #[test]
    fn test_validate_reports_problems() {
        let config = ClassifierConfig {
            enable_llm_categorization: true,
            llm_provider: "vertex".to_string(),
            llm_min_confidence: 1.5,
            llm_concurrency: 0,
            llm_tags_min_count: 3,
            llm_tags_max_count: 2,
            llm_prompt_template_path: Some(PathBuf::from("/definitely/missing.txt")),
            categories: vec![
                CategoryConfig::new("Cocktails", "cocktails", ""),
                CategoryConfig::new("Drinks", "cocktails", ""),
            ],
            ..Default::default()
        };

        let warnings = config.validate();
        let has = |needle: &str| warnings.iter().any(|w| w.contains(needle));
        assert!(has("llm_min_confidence"));
        assert!(has("llm_concurrency"));
        assert!(has("Unknown LLM provider: vertex"));
        assert!(has("llm_tags_min_count must be <= llm_tags_max_count"));
        assert!(has("llm_prompt_template_path"));
        assert!(has("duplicate category slug: cocktails"));
    }

    #[test]
    fn test_effective_concurrency_floor() {
        let config = ClassifierConfig {
            llm_concurrency: 0,
            ..Default::default()
        };
        assert_eq!(config.effective_concurrency(), 1);
    }
}
