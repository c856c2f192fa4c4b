//! Prompt construction
//!
//! Building a request is a pure function of the note text, the catalog, the
//! policy, and (optionally) a prompt template. Cache keys are derived from the
//! same inputs, so any change here that alters the prompt must also bump
//! `llm_prompt_version`.

use quire_core::{CategoryCatalog, ClassificationPolicy, ClassificationRequest};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, warn};

/// Inserted between head and tail when a note is trimmed
pub const TRIM_SEPARATOR: &str = "\n\n...\n\n";

const SYSTEM_PROMPT: &str = "Respond ONLY with a JSON object, no prose.";

/// Bound note text to `head_chars` from the start plus `tail_chars` from the end
///
/// Lengths count Unicode scalar values. Text that already fits is returned
/// untouched. With `tail_chars == 0` only the head is kept.
pub fn trim_text(text: &str, head_chars: usize, tail_chars: usize) -> String {
    let total = text.chars().count();
    if total <= head_chars.saturating_add(tail_chars) {
        return text.to_string();
    }

    let head: String = text.chars().take(head_chars).collect();
    if tail_chars == 0 {
        return head;
    }

    let tail: String = text.chars().skip(total - tail_chars).collect();
    format!("{head}{TRIM_SEPARATOR}{tail}")
}

/// User-supplied prompt template
///
/// Placeholders: `{{text}}`, `{{allowed_slugs}}`, `{{descriptions}}`,
/// `{{suggestions_count}}`, `{{llm_prompt_version}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    content: String,
    fingerprint: String,
}

impl PromptTemplate {
    /// Wrap template text
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let fingerprint = hex::encode(Sha256::digest(content.as_bytes()));
        Self {
            content,
            fingerprint,
        }
    }

    /// Read a template file
    pub async fn load(path: &Path) -> std::io::Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        debug!(path = %path.display(), "Loaded prompt template");
        Ok(Self::new(content))
    }

    /// Read a template file, falling back to the built-in prompt on failure
    pub async fn load_optional(path: Option<&Path>) -> Option<Self> {
        let path = path?;
        match Self::load(path).await {
            Ok(template) => Some(template),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Prompt template unreadable, using built-in prompt");
                None
            }
        }
    }

    /// SHA-256 of the template content, hex encoded
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn render(&self, vars: &PromptVars<'_>) -> String {
        // Text last, so placeholders inside the note are left alone
        self.content
            .replace("{{allowed_slugs}}", &vars.allowed_slugs)
            .replace("{{descriptions}}", &vars.descriptions)
            .replace("{{suggestions_count}}", &vars.suggestions_count.to_string())
            .replace("{{llm_prompt_version}}", vars.prompt_version)
            .replace("{{text}}", vars.text)
    }
}

struct PromptVars<'a> {
    text: &'a str,
    allowed_slugs: String,
    descriptions: String,
    suggestions_count: usize,
    prompt_version: &'a str,
}

/// Builds classification requests for a run
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    catalog: CategoryCatalog,
    policy: ClassificationPolicy,
    template: Option<PromptTemplate>,
}

impl PromptBuilder {
    /// Create a builder using the built-in prompt
    pub fn new(catalog: CategoryCatalog, policy: ClassificationPolicy) -> Self {
        Self {
            catalog,
            policy,
            template: None,
        }
    }

    /// Use a custom template
    pub fn with_template(mut self, template: Option<PromptTemplate>) -> Self {
        self.template = template;
        self
    }

    /// The run's catalog
    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    /// The run's policy
    pub fn policy(&self) -> &ClassificationPolicy {
        &self.policy
    }

    /// Fingerprint of the active template, if any
    pub fn template_fingerprint(&self) -> Option<&str> {
        self.template.as_ref().map(PromptTemplate::fingerprint)
    }

    /// Build the request for one note
    pub fn build(&self, note_text: &str) -> ClassificationRequest {
        build_request(note_text, &self.catalog, &self.policy, self.template.as_ref())
    }
}

/// Build a classification request
pub fn build_request(
    note_text: &str,
    catalog: &CategoryCatalog,
    policy: &ClassificationPolicy,
    template: Option<&PromptTemplate>,
) -> ClassificationRequest {
    let trimmed_text = trim_text(note_text, policy.head_chars, policy.tail_chars);

    let vars = PromptVars {
        text: &trimmed_text,
        allowed_slugs: policy.allowed_slugs.join(", "),
        descriptions: catalog
            .categories()
            .iter()
            .map(|c| {
                if c.description.is_empty() {
                    format!("- {}: {}", c.slug, c.name)
                } else {
                    format!("- {}: {}", c.slug, c.description)
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
        suggestions_count: policy.suggestions_count,
        prompt_version: &policy.prompt_version,
    };

    let user_prompt = match template {
        Some(template) => template.render(&vars),
        None => default_prompt(&vars, policy),
    };

    ClassificationRequest {
        trimmed_text: trimmed_text.clone(),
        allowed_slugs: policy.allowed_slugs.clone(),
        suggestions_count: policy.suggestions_count,
        suggest_tags: policy.suggest_tags,
        tags_max_count: policy.tags_max_count,
        prompt_version: policy.prompt_version.clone(),
        system_prompt: SYSTEM_PROMPT.to_string(),
        user_prompt,
    }
}

fn default_prompt(vars: &PromptVars<'_>, policy: &ClassificationPolicy) -> String {
    let mut fields = format!(
        "category_slug, confidence (0..1), reasons (short), suggestions (array of up to {} alternative slugs), undecided (true if no category fits)",
        vars.suggestions_count
    );
    if policy.suggest_tags {
        fields.push_str(&format!(
            ", tags (array of up to {} short topical tags)",
            policy.tags_max_count
        ));
    }

    format!(
        "You are a strict JSON generator. Given the note text, classify it into exactly one of the allowed category slugs or 'other'.\n\
         Return ONLY a JSON object with fields: {fields}.\n\
         If no category fits, set category_slug to null.\n\n\
         Allowed slugs: {allowed}\n\
         Descriptions:\n{descriptions}\n\n\
         Text:\n{text}\n",
        allowed = vars.allowed_slugs,
        descriptions = vars.descriptions,
        text = vars.text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_config::ClassifierConfig;
    use quire_core::Category;

    fn builder(config: &ClassifierConfig) -> PromptBuilder {
        let catalog = CategoryCatalog::new(vec![
            Category::new("Cocktails", "cocktails", "Mixed drinks"),
            Category::new("Recipes", "recipes", ""),
        ])
        .unwrap();
        let policy = ClassificationPolicy::from_config(config, &catalog);
        PromptBuilder::new(catalog, policy)
    }

    #[test]
    fn test_short_text_is_untouched() {
        assert_eq!(trim_text("hello", 3, 2), "hello");
        assert_eq!(trim_text("hello", 10, 0), "hello");
    }

    #[test]
    fn test_long_text_keeps_head_and_tail() {
        assert_eq!(trim_text("abcdefghij", 3, 2), "abc\n\n...\n\nij");
    }

    #[test]
    fn test_zero_tail_keeps_only_head() {
        assert_eq!(trim_text("abcdefghij", 4, 0), "abcd");
    }

    #[test]
    fn test_trim_counts_chars_not_bytes() {
        let text = "ééééé日本語テキスト";
        let trimmed = trim_text(text, 2, 2);
        assert_eq!(trimmed, "éé\n\n...\n\nスト");
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = ClassifierConfig::default();
        let builder = builder(&config);
        let a = builder.build("Negroni: equal parts gin, Campari, vermouth.");
        let b = builder.build("Negroni: equal parts gin, Campari, vermouth.");
        assert_eq!(a, b);
        assert_eq!(a.allowed_slugs, vec!["cocktails", "other", "recipes"]);
        assert!(a.user_prompt.contains("- cocktails: Mixed drinks"));
        assert!(a.user_prompt.contains("- recipes: Recipes"));
        assert!(a.user_prompt.contains("Allowed slugs: cocktails, other, recipes"));
        assert!(!a.user_prompt.contains("tags (array"));
    }

    #[test]
    fn test_tags_requested_when_enabled() {
        let config = ClassifierConfig {
            llm_suggest_tags: true,
            llm_tags_max_count: 4,
            ..Default::default()
        };
        let request = builder(&config).build("text");
        assert!(request.suggest_tags);
        assert!(request.user_prompt.contains("tags (array of up to 4"));
    }

    #[test]
    fn test_template_substitution() {
        let template = PromptTemplate::new(
            "v={{llm_prompt_version}} n={{suggestions_count}} slugs=[{{allowed_slugs}}]\n{{text}}",
        );
        let request = builder(&ClassifierConfig::default())
            .with_template(Some(template))
            .build("note mentions {{allowed_slugs}} literally");

        assert_eq!(
            request.user_prompt,
            "v=v1 n=3 slugs=[cocktails, other, recipes]\nnote mentions {{allowed_slugs}} literally"
        );
    }

    #[test]
    fn test_template_fingerprint_tracks_content() {
        let a = PromptTemplate::new("{{text}}");
        let b = PromptTemplate::new("{{text}} ");
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), PromptTemplate::new("{{text}}").fingerprint());
    }
}
