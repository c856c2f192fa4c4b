//! # Quire Configuration Library
//!
//! Configuration for the note classification stage. This is the foundation
//! crate of the workspace and does not depend on any other Quire crate.
//!
//! ## Features
//!
//! - Multi-format loading (TOML, YAML, JSON) selected by file extension
//! - A closed, validated set of classification providers
//! - Credential resolution through environment variable indirection
//! - Non-fatal validation that reports human-readable warnings
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quire_config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::load_from_file("quire.toml").await?;
//!     for warning in config.validate() {
//!         eprintln!("config warning: {warning}");
//!     }
//!     let provider = config.provider_id()?;
//!     println!("classifying with {provider}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod classifier;
mod credentials;
mod loader;
mod provider;

pub use classifier::*;
pub use credentials::*;
pub use loader::*;
pub use provider::*;
