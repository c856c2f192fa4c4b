//! Downstream appliers run after a classification decision

mod folder;
mod tags;

pub use folder::{FolderResolver, TagFolderHeuristic};
pub use tags::TagPropagator;
