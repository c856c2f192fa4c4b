//! Traits for the pipeline's collaborators

use super::error::{SinkResult, SourceResult};
use crate::note::Note;
use async_trait::async_trait;

/// Trait for enriched note destinations
///
/// The sink receives each note after every mutation has been applied. It must
/// not assume classification succeeded: `metadata.category` may be absent.
///
/// # Ordering
///
/// The pipeline driver hands notes over in source order, one at a time.
///
/// # Error Handling
///
/// A failed write is counted and logged by the driver; it never aborts the
/// run or affects other notes.
#[async_trait]
pub trait NoteSink: Send + Sync {
    /// Write one enriched note
    async fn write(&self, note: Note) -> SinkResult<()>;

    /// Flush buffered writes to the destination
    ///
    /// Called once after the last note.
    async fn flush(&self) -> SinkResult<()> {
        Ok(())
    }

    /// Sink name for logs
    fn name(&self) -> &'static str;
}

/// Trait for note providers
///
/// Supplies a stable id and raw text per note before classification begins.
#[async_trait]
pub trait NoteSource: Send {
    /// Next note, or `None` when exhausted
    async fn next_note(&mut self) -> SourceResult<Option<Note>>;

    /// Number of notes remaining, when known
    fn size_hint(&self) -> Option<usize> {
        None
    }
}
