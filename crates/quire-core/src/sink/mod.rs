//! Note source and sink contracts
//!
//! Reading notes and rendering output are external concerns. The pipeline
//! only talks to them through [`NoteSource`] and [`NoteSink`].

mod error;
mod memory;
mod traits;

pub use error::{SinkError, SinkResult, SourceError, SourceResult};
pub use memory::{MemorySink, VecSource};
pub use traits::{NoteSink, NoteSource};
