//! In-memory source and sink

use super::error::{SinkError, SinkResult, SourceResult};
use super::traits::{NoteSink, NoteSource};
use crate::note::Note;
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Source backed by a list of notes
#[derive(Debug, Default)]
pub struct VecSource {
    notes: VecDeque<Note>,
}

impl VecSource {
    /// Create a source yielding `notes` in order
    pub fn new(notes: impl IntoIterator<Item = Note>) -> Self {
        Self {
            notes: notes.into_iter().collect(),
        }
    }
}

#[async_trait]
impl NoteSource for VecSource {
    async fn next_note(&mut self) -> SourceResult<Option<Note>> {
        Ok(self.notes.pop_front())
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.notes.len())
    }
}

/// Sink that collects notes in memory
///
/// Clones share storage, so a test can keep one handle and give another to
/// the pipeline.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    notes: Arc<Mutex<Vec<Note>>>,
    reject: Arc<HashSet<String>>,
    flushes: Arc<Mutex<usize>>,
    closed: Arc<AtomicBool>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that fails writes for the given note ids
    pub fn rejecting<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reject: Arc::new(ids.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Refuse every later write and flush with [`SinkError::Closed`]
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Notes written so far, in write order
    pub async fn notes(&self) -> Vec<Note> {
        self.notes.lock().await.clone()
    }

    /// Ids written so far, in write order
    pub async fn ids(&self) -> Vec<String> {
        self.notes.lock().await.iter().map(|n| n.id.clone()).collect()
    }

    /// Number of flush calls
    pub async fn flush_count(&self) -> usize {
        *self.flushes.lock().await
    }
}

#[async_trait]
impl NoteSink for MemorySink {
    async fn write(&self, note: Note) -> SinkResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SinkError::Closed);
        }
        if self.reject.contains(&note.id) {
            return Err(SinkError::write_failed(format!("rejected note {}", note.id)));
        }
        self.notes.lock().await.push(note);
        Ok(())
    }

    async fn flush(&self) -> SinkResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SinkError::Closed);
        }
        *self.flushes.lock().await += 1;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
