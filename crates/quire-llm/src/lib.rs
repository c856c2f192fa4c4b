//! # Quire LLM
//!
//! Classification provider clients for Quire.
//!
//! ## Features
//!
//! - **Multi-provider**: OpenAI, Anthropic, Ollama, and OpenAI-compatible gateways
//! - **Strict parsing**: model answers are reduced to a validated result shape
//! - **Error taxonomy**: every HTTP and client failure maps to a retryable or
//!   fatal [`ClassifyError`](quire_core::ClassifyError)
//!
//! ## Example
//!
//! ```rust,no_run
//! use quire_config::{ClassifierConfig, ProcessEnv};
//! use quire_llm::create_classification_provider;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClassifierConfig {
//!     llm_provider: "ollama".to_string(),
//!     ..Default::default()
//! };
//! let provider = create_classification_provider(&config, &ProcessEnv)?;
//! println!("using {}", provider.model_id());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classify;

pub use classify::{
    create_classification_provider, AnthropicClassifier, OllamaClassifier, OpenAIClassifier,
};

#[cfg(any(test, feature = "test-utils"))]
pub use classify::MockClassifier;
