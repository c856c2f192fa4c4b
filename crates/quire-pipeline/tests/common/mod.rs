//! Common test utilities for pipeline tests.

#![allow(dead_code)]

use async_trait::async_trait;
use quire_config::{CategoryConfig, ClassifierConfig, ProviderId};
use quire_core::{
    ClassificationProvider, ClassificationRequest, ClassificationResult, ClassifyResult, Note,
    NoteSource, SourceError, SourceResult,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Classification config with three categories and a cache under `dir`
pub fn test_config(dir: &TempDir) -> ClassifierConfig {
    ClassifierConfig {
        enable_llm_categorization: true,
        categories: vec![
            CategoryConfig::new("Cocktails", "cocktails", "Mixed drinks"),
            CategoryConfig::new("Recipes", "recipes", "Food and cooking"),
            CategoryConfig::new("Other", "other", ""),
        ],
        llm_cache_path: dir.path().join("llm_category.jsonl"),
        ..Default::default()
    }
}

/// Notes `note-000`, `note-001`, ... with distinct text
pub fn numbered_notes(count: usize) -> Vec<Note> {
    (0..count)
        .map(|i| Note::new(format!("note-{i:03}"), format!("Note body number {i}")))
        .collect()
}

/// Provider whose latency varies per note, so completion order differs from
/// input order
#[derive(Clone, Default)]
pub struct JitterClassifier {
    calls: Arc<AtomicUsize>,
}

impl JitterClassifier {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClassificationProvider for JitterClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> ClassifyResult<ClassificationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let spread: u64 = request.trimmed_text.bytes().map(u64::from).sum::<u64>() * 7919 % 23;
        tokio::time::sleep(Duration::from_millis(spread)).await;
        Ok(ClassificationResult::decided("recipes", 0.9))
    }

    fn provider_id(&self) -> ProviderId {
        ProviderId::Ollama
    }

    fn model_id(&self) -> &str {
        "jitter"
    }
}

/// Source that yields an unreadable record at the given positions
pub struct FlakySource {
    items: VecDeque<SourceResult<Option<Note>>>,
}

impl FlakySource {
    pub fn new(notes: Vec<Note>, broken_at: &[usize]) -> Self {
        let mut items = VecDeque::new();
        for (i, note) in notes.into_iter().enumerate() {
            if broken_at.contains(&i) {
                items.push_back(Err(SourceError::invalid_note(format!("broken-{i}"), "bad front matter")));
            }
            items.push_back(Ok(Some(note)));
        }
        Self { items }
    }
}

#[async_trait]
impl NoteSource for FlakySource {
    async fn next_note(&mut self) -> SourceResult<Option<Note>> {
        self.items.pop_front().unwrap_or(Ok(None))
    }
}
