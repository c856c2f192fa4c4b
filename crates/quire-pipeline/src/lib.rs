//! Pipeline Orchestration Layer
//!
//! This crate drives notes from a [`NoteSource`](quire_core::NoteSource)
//! through classification into a [`NoteSink`](quire_core::NoteSink).
//!
//! ## Clear Separation of Concerns
//!
//! Infrastructure crates (do not orchestrate):
//! - `quire-llm`: provider clients, one call at a time
//! - `quire-enrichment`: prompt, cache, retry, policy, appliers for one note
//!
//! This crate:
//! - runs a bounded worker pool over the note set
//! - hands notes to the sink in source order
//! - honours run-level cancellation
//! - reports per-note outcomes and a run summary
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quire_config::{ConfigLoader, ProcessEnv};
//! use quire_pipeline::{init_logging, NotePipeline};
//! use tokio_util::sync::CancellationToken;
//!
//! init_logging("quire=info");
//! let config = ConfigLoader::load_from_file("quire.toml").await?;
//! let pipeline = NotePipeline::from_config(&config, &ProcessEnv).await?;
//! let report = pipeline.run(&mut source, &sink, &CancellationToken::new()).await?;
//! println!("{} classified, {} from cache", report.summary.classified, report.summary.served_from_cache);
//! ```

#![warn(missing_docs)]

pub mod logging;
pub mod note_pipeline;
pub mod resequence;

pub use logging::init_logging;
pub use note_pipeline::{NotePipeline, RunReport};
pub use resequence::Resequencer;
