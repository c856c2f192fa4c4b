//! Category catalog
//!
//! The catalog is fixed for a run. It always contains the reserved
//! [`OTHER_SLUG`] category, even when the configuration does not list it.

use quire_config::CategoryConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Reserved fallback category slug
pub const OTHER_SLUG: &str = "other";

/// A single classification target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    /// Human-readable name
    pub name: String,
    /// Machine identifier
    pub slug: String,
    /// Description offered to the model
    pub description: String,
}

impl Category {
    /// Create a category
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

    fn other() -> Self {
        Self::new("Other", OTHER_SLUG, "Anything that fits no other category")
    }
}

impl From<&CategoryConfig> for Category {
    fn from(config: &CategoryConfig) -> Self {
        Self::new(
            config.name.trim(),
            config.slug.trim(),
            config.description.trim(),
        )
    }
}

/// Catalog construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Two categories share a slug
    #[error("Duplicate category slug: {0}")]
    DuplicateSlug(String),

    /// A category has no slug
    #[error("Category '{0}' has an empty slug")]
    EmptySlug(String),
}

/// Ordered set of categories with unique slugs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCatalog {
    categories: Vec<Category>,
}

impl CategoryCatalog {
    /// Build a catalog, appending `other` if it is missing
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut list = Vec::new();

        for category in categories {
            if category.slug.is_empty() {
                return Err(CatalogError::EmptySlug(category.name));
            }
            if !seen.insert(category.slug.clone()) {
                return Err(CatalogError::DuplicateSlug(category.slug));
            }
            list.push(category);
        }

        if !seen.contains(OTHER_SLUG) {
            list.push(Category::other());
        }

        Ok(Self { categories: list })
    }

    /// Build a catalog from configuration entries
    pub fn from_config(configs: &[CategoryConfig]) -> Result<Self, CatalogError> {
        Self::new(configs.iter().map(Category::from))
    }

    /// Categories in declaration order (`other` last unless declared)
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Slugs in declaration order
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.slug.as_str())
    }

    /// Slugs sorted lexicographically, as used for cache keys
    pub fn sorted_slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = self.slugs().map(str::to_string).collect();
        slugs.sort();
        slugs
    }

    /// Whether `slug` names a category in this catalog
    pub fn contains(&self, slug: &str) -> bool {
        self.categories.iter().any(|c| c.slug == slug)
    }

    /// Look up a category by slug
    pub fn get(&self, slug: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.slug == slug)
    }

    /// Number of categories, including `other`
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Always false; `other` is always present
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_is_always_present() {
        let catalog = CategoryCatalog::new(vec![Category::new("Cocktails", "cocktails", "")]).unwrap();
        assert!(catalog.contains(OTHER_SLUG));
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.categories().last().unwrap().slug, OTHER_SLUG);
    }

    #[test]
    fn test_declared_other_is_kept_in_place() {
        let catalog = CategoryCatalog::new(vec![
            Category::new("Misc", "other", "Custom fallback"),
            Category::new("Music", "music", ""),
        ])
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("other").unwrap().description, "Custom fallback");
    }

    #[test]
    fn test_duplicate_slug_rejected() {
        let err = CategoryCatalog::new(vec![
            Category::new("Cocktails", "cocktails", ""),
            Category::new("Drinks", "cocktails", ""),
        ])
        .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateSlug("cocktails".to_string()));
    }

    #[test]
    fn test_sorted_slugs() {
        let catalog = CategoryCatalog::new(vec![
            Category::new("Recipes", "recipes", ""),
            Category::new("Cocktails", "cocktails", ""),
        ])
        .unwrap();
        assert_eq!(catalog.sorted_slugs(), vec!["cocktails", "other", "recipes"]);
    }
}
