//! Category report over the cache log
//!
//! Aggregates every cached result into three views:
//!
//! 1. category distribution
//! 2. tags observed per category
//! 3. categories observed per tag
//!
//! Records are read leniently: a missing or blank `category_slug` counts as
//! `other`, non-string tags are dropped, and malformed lines are skipped.
//! Tags are lowercased and counted at most once per record.

use chrono::{Local, SecondsFormat};
use quire_core::OTHER_SLUG;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Report generation errors
#[derive(Debug, Error)]
pub enum ReportError {
    /// Cache file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// No parseable record was found
    #[error("No valid records parsed from {0}")]
    Empty(PathBuf),
}

/// Result type for report generation
pub type ReportResult<T> = Result<T, ReportError>;

/// Aggregated counts from a cache log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryReport {
    input: PathBuf,
    total: usize,
    categories: HashMap<String, usize>,
    tags_by_category: HashMap<String, HashMap<String, usize>>,
    categories_by_tag: HashMap<String, HashMap<String, usize>>,
}

impl CategoryReport {
    /// Read and aggregate a cache file
    pub async fn from_cache_file(path: &Path) -> ReportResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ReportError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let report = Self::from_lines(path, &content);
        if report.total == 0 {
            return Err(ReportError::Empty(path.to_path_buf()));
        }
        Ok(report)
    }

    /// Aggregate cache lines already in memory
    pub fn from_lines(input: &Path, content: &str) -> Self {
        let mut report = Self {
            input: input.to_path_buf(),
            ..Self::default()
        };

        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match serde_json::from_str::<Value>(line) {
                Ok(record) => report.add_record(&record),
                Err(e) => debug!(error = %e, "Skipping malformed cache line"),
            }
        }
        report
    }

    fn add_record(&mut self, record: &Value) {
        let result = record.get("result");
        let category = result
            .and_then(|r| r.get("category_slug"))
            .and_then(Value::as_str)
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| OTHER_SLUG.to_string());

        self.total += 1;
        *self.categories.entry(category.clone()).or_default() += 1;

        let tags: BTreeSet<String> = result
            .and_then(|r| r.get("tags"))
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        for tag in tags {
            *self
                .tags_by_category
                .entry(category.clone())
                .or_default()
                .entry(tag.clone())
                .or_default() += 1;
            *self
                .categories_by_tag
                .entry(tag)
                .or_default()
                .entry(category.clone())
                .or_default() += 1;
        }
    }

    /// Records aggregated
    pub fn total(&self) -> usize {
        self.total
    }

    /// Categories with counts, most frequent first
    pub fn category_counts(&self) -> Vec<(&str, usize)> {
        sorted_counts(&self.categories)
    }

    /// Tags seen under `category`, most frequent first
    pub fn tags_for(&self, category: &str) -> Vec<(&str, usize)> {
        self.tags_by_category
            .get(category)
            .map(sorted_counts)
            .unwrap_or_default()
    }

    /// Categories seen with `tag`, most frequent first
    pub fn categories_for_tag(&self, tag: &str) -> Vec<(&str, usize)> {
        self.categories_by_tag
            .get(tag)
            .map(sorted_counts)
            .unwrap_or_default()
    }

    /// Render the report as Markdown, stamped with the current local time
    pub fn to_markdown(&self) -> String {
        let generated = Local::now().to_rfc3339_opts(SecondsFormat::Secs, false);
        self.render(&generated)
    }

    fn render(&self, generated: &str) -> String {
        let mut md = String::new();
        let _ = writeln!(md, "# LLM Category Report\n");
        let _ = writeln!(md, "Generated: {generated}");
        let _ = writeln!(md, "Input: {}", self.input.display());
        let _ = writeln!(md, "Total classified items: {}\n", self.total);

        let _ = writeln!(md, "## 1) Suggested categories (distribution)\n");
        let _ = writeln!(md, "| Category | Count | Percent |");
        let _ = writeln!(md, "|---|---:|---:|");
        for (category, count) in self.category_counts() {
            let _ = writeln!(md, "| {category} | {count} | {} |", percent(count, self.total));
        }
        md.push('\n');

        let _ = writeln!(md, "## 2) Tags by suggested category\n");
        for (category, count) in self.category_counts() {
            let _ = writeln!(md, "### Category: {category} (n={count})\n");
            let tags = self.tags_for(category);
            if tags.is_empty() {
                let _ = writeln!(md, "_No tags observed for this category._\n");
                continue;
            }
            let _ = writeln!(md, "| Tag | Count | Percent within category |");
            let _ = writeln!(md, "|---|---:|---:|");
            for (tag, tag_count) in tags {
                let _ = writeln!(md, "| {tag} | {tag_count} | {} |", percent(tag_count, count));
            }
            md.push('\n');
        }

        let _ = writeln!(md, "## 3) Suggested tags with their category distribution\n");
        if self.categories_by_tag.is_empty() {
            md.push_str("_No tags found across records._");
            return md;
        }

        let tag_totals: HashMap<String, usize> = self
            .categories_by_tag
            .iter()
            .map(|(tag, cats)| (tag.clone(), cats.values().sum()))
            .collect();
        for (tag, total) in sorted_counts(&tag_totals) {
            let _ = writeln!(md, "### Tag: {tag} (n={total})\n");
            let _ = writeln!(md, "| Category | Count | Percent of tag |");
            let _ = writeln!(md, "|---|---:|---:|");
            for (category, count) in self.categories_for_tag(tag) {
                let _ = writeln!(md, "| {category} | {count} | {} |", percent(count, total));
            }
            md.push('\n');
        }
        md.truncate(md.trim_end_matches('\n').len());
        md
    }
}

fn sorted_counts(counts: &HashMap<String, usize>) -> Vec<(&str, usize)> {
    let mut items: Vec<(&str, usize)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    items
}

fn percent(part: usize, whole: usize) -> String {
    if whole == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", part as f64 / whole as f64 * 100.0)
}
