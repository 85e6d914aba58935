//! Replay backend
//!
//! Answers every prompt with a recorded payload. Used for offline runs
//! (`sketchbook generate --replay FILE`) and in tests.

use async_trait::async_trait;

use super::{BackendError, GenerationBackend};

/// Backend that returns a fixed payload
#[derive(Debug, Clone)]
pub struct ReplayBackend {
    payload: String,
}

impl ReplayBackend {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Load the payload from a file
    pub async fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, BackendError> {
        let path = path.as_ref();
        let payload = tokio::fs::read_to_string(path).await.map_err(|e| {
            BackendError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(Self::new(payload))
    }
}

#[async_trait]
impl GenerationBackend for ReplayBackend {
    fn name(&self) -> &'static str {
        "Replay"
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        log::debug!("Replaying recorded sketch for prompt '{}'", prompt);
        Ok(self.payload.clone())
    }
}
