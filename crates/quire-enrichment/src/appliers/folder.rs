//! Folder assignment
//!
//! Two stages write `_folder_path`. [`TagFolderHeuristic`] guesses a folder
//! from tags and only fills an empty slot. [`FolderResolver`] runs later and
//! overrides it whenever a category is present. `other` is an ordinary
//! category here and can be mapped like any other slug.

use quire_config::ClassifierConfig;
use quire_core::{Note, NoteStage};
use std::collections::BTreeMap;
use tracing::debug;

/// Maps the assigned category to a folder path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderResolver {
    rules: BTreeMap<String, String>,
}

impl FolderResolver {
    /// Create with an explicit slug to folder table
    pub fn new(rules: BTreeMap<String, String>) -> Self {
        Self { rules }
    }

    /// Build from configuration
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.category_folder_rules.clone())
    }

    /// Folder for a slug: the rule if one exists, else the slug itself
    pub fn resolve(&self, slug: &str) -> String {
        self.rules
            .get(slug)
            .map(|path| path.trim_matches('/').to_string())
            .unwrap_or_else(|| slug.to_string())
    }
}

impl NoteStage for FolderResolver {
    fn name(&self) -> &'static str {
        "folder_resolver"
    }

    fn apply(&self, note: &mut Note) {
        let Some(slug) = note.category() else {
            return;
        };
        let folder = self.resolve(slug);
        debug!(note_id = %note.id, folder = %folder, "Folder set from category");
        note.set_folder_path(folder);
    }
}

/// Tag-driven folder heuristic
///
/// Picks the folder of the first tag (in sorted order) that has a rule. When
/// no tag matches, falls back to the default folder if one is configured.
/// Never replaces a folder that is already set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFolderHeuristic {
    rules: BTreeMap<String, String>,
    default_folder: Option<String>,
}

impl TagFolderHeuristic {
    /// Create with a tag to folder table
    pub fn new(rules: BTreeMap<String, String>, default_folder: Option<String>) -> Self {
        Self {
            rules,
            default_folder,
        }
    }

    /// Build from configuration
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.tag_folder_rules.clone(), config.default_folder.clone())
    }
}

impl NoteStage for TagFolderHeuristic {
    fn name(&self) -> &'static str {
        "tag_folder_heuristic"
    }

    fn apply(&self, note: &mut Note) {
        if note.folder_path().is_some() {
            return;
        }

        let matched = note
            .tags
            .iter()
            .find_map(|tag| self.rules.get(&tag.to_lowercase()))
            .or(self.default_folder.as_ref())
            .cloned();

        if let Some(folder) = matched {
            note.set_folder_path(folder);
        }
    }
}
