//! Tag propagation from classification decisions

use quire_config::ClassifierConfig;
use quire_core::{ClassificationDecision, Note, OTHER_SLUG};
use tracing::debug;

/// Merges classification signals into a note's tag set
///
/// Every operation is an idempotent set insert, so applying the same decision
/// twice leaves the tags unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagPropagator {
    /// Add the assigned category slug
    pub propagate_category_tag: bool,
    /// Add suggestions when the category is `other`
    pub propagate_suggested_when_other: bool,
    /// Add normalized model tags
    pub propagate_llm_tags: bool,
}

impl TagPropagator {
    /// Build from configuration
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self {
            propagate_category_tag: config.propagate_category_tag,
            propagate_suggested_when_other: config.propagate_suggested_categories_when_other,
            propagate_llm_tags: config.propagate_llm_tags,
        }
    }

    /// Merge the decision's tags into `note`; returns how many were added
    ///
    /// Cache hits and fresh results are treated the same. Cancelled decisions
    /// add nothing.
    pub fn apply(&self, note: &mut Note, decision: &ClassificationDecision) -> usize {
        if decision.is_cancelled() {
            return 0;
        }

        let mut added = 0;
        if let Some(category) = decision.category.as_deref() {
            if self.propagate_category_tag && note.add_tag(category) {
                added += 1;
            }

            if category == OTHER_SLUG && self.propagate_suggested_when_other {
                for suggestion in &decision.suggestions {
                    if note.add_tag(suggestion.as_str()) {
                        added += 1;
                    }
                }
            }
        }

        if self.propagate_llm_tags {
            for tag in &decision.llm_tags {
                if note.add_tag(tag.as_str()) {
                    added += 1;
                }
            }
        }

        if added > 0 {
            debug!(note_id = %note.id, added, "Propagated classification tags");
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::{ClassificationOutcome, ClassificationResult, ClassificationSource};

    fn decision(category: Option<&str>, suggestions: &[&str], llm_tags: &[&str]) -> ClassificationDecision {
        ClassificationDecision {
            category: category.map(str::to_string),
            outcome: ClassificationOutcome::Classified,
            source: ClassificationSource::Cache,
            result: Some(ClassificationResult::decided("x", 0.9)),
            suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
            llm_tags: llm_tags.iter().map(|s| s.to_string()).collect(),
            error: None,
            attempts: 0,
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }

    fn all_on() -> TagPropagator {
        TagPropagator {
            propagate_category_tag: true,
            propagate_suggested_when_other: true,
            propagate_llm_tags: true,
        }
    }

    #[test]
    fn test_category_tag_added_once() {
        let mut note = Note::new("n1", "Negroni");
        let decision = decision(Some("cocktails"), &[], &[]);

        assert_eq!(all_on().apply(&mut note, &decision), 1);
        let once = note.tags.clone();
        assert_eq!(all_on().apply(&mut note, &decision), 0);

        assert_eq!(note.tags, once);
        assert!(note.has_tag("cocktails"));
    }

    #[test]
    fn test_suggestions_only_merged_for_other() {
        let mut note = Note::new("n1", "text");
        all_on().apply(&mut note, &decision(Some("cocktails"), &["recipes"], &[]));
        assert!(!note.has_tag("recipes"));

        let mut note = Note::new("n2", "text");
        all_on().apply(&mut note, &decision(Some("other"), &["recipes", "music"], &[]));
        assert!(note.has_tag("other"));
        assert!(note.has_tag("recipes"));
        assert!(note.has_tag("music"));
    }

    #[test]
    fn test_no_category_no_category_tags() {
        let mut note = Note::new("n1", "text").with_tags(["existing"]);
        all_on().apply(&mut note, &decision(None, &["cocktails", "recipes"], &[]));
        assert_eq!(note.tags.len(), 1);
    }

    #[test]
    fn test_switches_are_respected() {
        let propagator = TagPropagator {
            propagate_category_tag: false,
            propagate_suggested_when_other: false,
            propagate_llm_tags: false,
        };
        let mut note = Note::new("n1", "text");
        propagator.apply(&mut note, &decision(Some("other"), &["recipes"], &["gin"]));
        assert!(note.tags.is_empty());
    }

    #[test]
    fn test_llm_tags_merged() {
        let mut note = Note::new("n1", "text");
        all_on().apply(&mut note, &decision(None, &[], &["gin", "campari"]));
        assert!(note.has_tag("gin"));
        assert!(note.has_tag("campari"));
    }

    #[test]
    fn test_cancelled_decision_adds_nothing() {
        let mut note = Note::new("n1", "text");
        let cancelled = ClassificationDecision::cancelled("openai", "gpt-4o-mini", 0);
        assert_eq!(all_on().apply(&mut note, &cancelled), 0);
    }
}
