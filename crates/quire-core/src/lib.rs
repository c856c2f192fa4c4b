//! # Quire Core
//!
//! Domain types and abstraction seams for note classification.
//!
//! ## Architecture
//!
//! Core defines the types every other crate shares and the traits at the
//! boundaries of the system:
//!
//! - [`ClassificationProvider`]: one classification call against a backend
//!   (implemented in `quire-llm`)
//! - [`NoteSource`] / [`NoteSink`]: external collaborators that supply notes
//!   and consume enriched ones
//! - [`NoteStage`]: heuristic stages that run after classification
//!
//! Concrete orchestration lives in `quire-enrichment` and `quire-pipeline`.

#![warn(missing_docs)]

pub mod category;
pub mod classification;
pub mod error;
pub mod note;
pub mod policy;
pub mod processing;
pub mod provider;
pub mod sink;
pub mod stage;

pub use category::{CatalogError, Category, CategoryCatalog, OTHER_SLUG};
pub use classification::{ClassificationRequest, ClassificationResult};
pub use error::{ClassifyError, ClassifyResult, TransportKind};
pub use note::{keys, Note};
pub use policy::ClassificationPolicy;
pub use processing::{
    ClassificationDecision, ClassificationDiagnostics, ClassificationOutcome,
    ClassificationSource, NoteOutcome, RunSummary,
};
pub use provider::ClassificationProvider;
pub use sink::{
    MemorySink, NoteSink, NoteSource, SinkError, SinkResult, SourceError, SourceResult, VecSource,
};
pub use stage::NoteStage;

// Configuration types that appear in core signatures
pub use quire_config::{ProviderId, UndecidedPolicy};
