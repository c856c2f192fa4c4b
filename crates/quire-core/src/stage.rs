//! Heuristic note stages run after classification

use crate::note::Note;

/// A synchronous transformation applied to each note after classification
///
/// Stages see the category the classifier assigned (if any) and may add tags
/// or choose a folder. They run before the folder resolver, so a category
/// mapping always wins over a stage's folder choice.
pub trait NoteStage: Send + Sync {
    /// Stage name for logs
    fn name(&self) -> &'static str;

    /// Apply the stage to a note
    fn apply(&self, note: &mut Note);
}
