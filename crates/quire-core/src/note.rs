//! Notes flowing through the classification pipeline

use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Metadata keys written by the pipeline
pub mod keys {
    /// Chosen category slug
    pub const CATEGORY: &str = "category";
    /// Final tag set, sorted
    pub const TAGS: &str = "tags";
    /// Normalized model-suggested tags
    pub const LLM_TAGS: &str = "llm_tags";
    /// Suggestions recorded under the `suggest` policy
    pub const CATEGORY_SUGGESTIONS: &str = "_category_suggestions";
    /// Folder chosen by the heuristic or the folder resolver
    pub const FOLDER_PATH: &str = "_folder_path";
    /// Private classification diagnostics
    pub const CLASSIFICATION: &str = "_classification";
}

/// A note owned by the pipeline driver while it is processed
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Note {
    /// Stable identifier supplied by the source
    pub id: String,
    /// Raw note text, opaque UTF-8
    pub text: String,
    /// Tag set; rendered into `metadata.tags` on finalize
    pub tags: BTreeSet<String>,
    /// Metadata handed to the sink
    pub metadata: Map<String, Value>,
}

impl Note {
    /// Create a note with no tags or metadata
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    /// Add existing tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Replace metadata
    ///
    /// String entries of an existing `tags` array are merged into the tag set.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        if let Some(Value::Array(tags)) = metadata.get(keys::TAGS) {
            self.tags
                .extend(tags.iter().filter_map(Value::as_str).map(str::to_string));
        }
        self.metadata = metadata;
        self
    }

    /// Category slug, if one has been assigned
    pub fn category(&self) -> Option<&str> {
        self.metadata.get(keys::CATEGORY).and_then(Value::as_str)
    }

    /// Assign or clear the category
    pub fn set_category(&mut self, slug: Option<&str>) {
        match slug {
            Some(slug) => {
                self.metadata
                    .insert(keys::CATEGORY.to_string(), Value::String(slug.to_string()));
            }
            None => {
                self.metadata.remove(keys::CATEGORY);
            }
        }
    }

    /// Folder path, if one has been chosen
    pub fn folder_path(&self) -> Option<&str> {
        self.metadata.get(keys::FOLDER_PATH).and_then(Value::as_str)
    }

    /// Set the folder path
    pub fn set_folder_path(&mut self, path: impl Into<String>) {
        self.metadata
            .insert(keys::FOLDER_PATH.to_string(), Value::String(path.into()));
    }

    /// Add a tag; returns whether it was new
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    /// Whether the tag set contains `tag`
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Store a list of strings under `key`, or remove the key when empty
    pub fn set_string_list(&mut self, key: &str, values: &[String]) {
        if values.is_empty() {
            self.metadata.remove(key);
        } else {
            self.metadata.insert(
                key.to_string(),
                Value::Array(values.iter().cloned().map(Value::String).collect()),
            );
        }
    }

    /// Read a list of strings stored under `key`
    pub fn string_list(&self, key: &str) -> Vec<String> {
        match self.metadata.get(key) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Render the tag set into `metadata.tags` before sink handoff
    pub fn finalize_metadata(&mut self) {
        let tags = self.tags.iter().cloned().map(Value::String).collect();
        self.metadata
            .insert(keys::TAGS.to_string(), Value::Array(tags));
    }
}
