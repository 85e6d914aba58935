//! Pluggable generation backend abstraction
//!
//! A backend turns a prompt into the raw JSON text of a sketch payload.
//! Parsing and sanitizing that text is the engine's job, so every backend
//! shares one validation path.

pub mod gemini;
pub mod replay;

use async_trait::async_trait;

pub use gemini::GeminiBackend;
pub use replay::ReplayBackend;

/// Error types for backend operations
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// The core trait that all generation backends implement
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Human-readable name for logs
    fn name(&self) -> &'static str;

    /// Produce the JSON text of a `{workflow, explanation}` payload
    async fn generate(&self, prompt: &str) -> Result<String, BackendError>;
}
