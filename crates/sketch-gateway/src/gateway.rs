//! Sketch Gateway - Single entry point for sketch generation
//!
//! The gateway wraps a [`GenerationBackend`], enforces that at most one
//! request is in flight, and runs every response through the engine's
//! strict parse + sanitize step. [`SketchGateway::generate_into`] drives a
//! shared session: it takes a generation ticket, releases the session while
//! the request is outstanding, and applies (or discards) the result.

use std::sync::Arc;

use sketch_engine::generation::validate_prompt;
use sketch_engine::{GeneratedSketch, SketchError, SketchSession, ValidationError};
use tokio::sync::Mutex;

use crate::backend::{BackendError, GenerationBackend};

/// Error types for gateway operations
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Invalid sketch: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("A generation request is already in flight")]
    Busy,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(SketchError),
}

impl From<SketchError> for GatewayError {
    fn from(err: SketchError) -> Self {
        match err {
            SketchError::GenerationInFlight => Self::Busy,
            SketchError::Validation(e) => Self::Validation(e),
            other => Self::Session(other),
        }
    }
}

/// A session shared between the UI side and async tasks
pub type SharedSession = Arc<parking_lot::Mutex<SketchSession>>;

/// The single entry point for sketch generation
pub struct SketchGateway {
    backend: Box<dyn GenerationBackend>,
    /// Held for the duration of one request
    in_flight: Mutex<()>,
}

impl SketchGateway {
    pub fn new(backend: Box<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            in_flight: Mutex::new(()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Whether a request is currently outstanding
    pub fn is_busy(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Generate a sketch from a prompt
    ///
    /// Fails with [`GatewayError::Busy`] while another request is running.
    pub async fn generate(&self, prompt: &str) -> Result<GeneratedSketch, GatewayError> {
        let prompt = validate_prompt(prompt)?;
        let _guard = self.in_flight.try_lock().map_err(|_| GatewayError::Busy)?;

        log::info!("Generating sketch via {}", self.backend.name());
        let raw = self.backend.generate(prompt).await.map_err(|e| {
            log::warn!("Generation request failed: {}", e);
            e
        })?;

        let sketch = GeneratedSketch::from_json(raw.trim()).map_err(|e| {
            log::warn!("Generated sketch rejected: {}", e);
            e
        })?;
        log::info!(
            "Generated sketch with {} nodes and {} edges",
            sketch.graph.nodes.len(),
            sketch.graph.edges.len()
        );
        Ok(sketch)
    }

    /// Generate and apply the result to a session
    ///
    /// On failure the session's graph is untouched. If the session was
    /// closed while the request was outstanding the result is discarded.
    /// Returns the generator's explanation.
    pub async fn generate_into(
        &self,
        session: &SharedSession,
        prompt: &str,
    ) -> Result<String, GatewayError> {
        let ticket = session.lock().begin_generation(prompt)?;

        let outcome = self.generate(ticket.prompt()).await;

        let mut session = session.lock();
        match outcome {
            Ok(sketch) => Ok(session.complete_generation(ticket, sketch)?),
            Err(e) => {
                if let Err(stale) = session.fail_generation(ticket) {
                    log::debug!("Failed generation had no live ticket: {}", stale);
                }
                Err(e)
            }
        }
    }
}

/// Shared gateway type for application state
pub type SharedGateway = Arc<SketchGateway>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ReplayBackend;
    use async_trait::async_trait;
    use sketch_engine::SketchGraph;
    use tokio::sync::Notify;

    const PAYLOAD: &str = r##"{
        "workflow": {
            "nodes": [
                {"id": "t", "type": "trigger", "service": "Slack", "label": "Message", "position": {"x": 100, "y": 200}, "accentColor": "#FF9900"},
                {"id": "a", "type": "action", "service": "OpenAI", "label": "Reply", "position": {"x": 400, "y": 200}, "accentColor": "#A259FF"}
            ],
            "edges": [
                {"id": "e1", "source": "t", "target": "a"},
                {"id": "e2", "source": "a", "target": "n99"}
            ]
        },
        "explanation": "Reply to Slack messages."
    }"##;

    /// Backend that blocks until released
    struct GatedBackend {
        release: Arc<Notify>,
        payload: String,
    }

    #[async_trait]
    impl GenerationBackend for GatedBackend {
        fn name(&self) -> &'static str {
            "Gated"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, BackendError> {
            self.release.notified().await;
            Ok(self.payload.clone())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl GenerationBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "Failing"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, BackendError> {
            Err(BackendError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    fn shared_demo() -> SharedSession {
        Arc::new(parking_lot::Mutex::new(SketchSession::with_demo()))
    }

    #[tokio::test]
    async fn test_generate_sanitizes_payload() {
        let gateway = SketchGateway::new(Box::new(ReplayBackend::new(PAYLOAD)));
        assert_eq!(gateway.backend_name(), "Replay");
        let sketch = gateway.generate("reply to slack").await.unwrap();
        assert_eq!(sketch.graph.nodes.len(), 2);
        assert!(sketch.graph.edges.iter().all(|e| !e.touches("n99")));
        assert_eq!(sketch.explanation, "Reply to Slack messages.");
    }

    #[tokio::test]
    async fn test_invalid_payload_is_validation_error() {
        let gateway = SketchGateway::new(Box::new(ReplayBackend::new("not json")));
        assert!(matches!(
            gateway.generate("anything").await,
            Err(GatewayError::Validation(ValidationError::MalformedJson(_)))
        ));
        assert!(matches!(
            gateway.generate("  ").await,
            Err(GatewayError::Validation(ValidationError::EmptyPrompt))
        ));
    }

    #[tokio::test]
    async fn test_generate_into_replaces_session_graph() {
        let gateway = SketchGateway::new(Box::new(ReplayBackend::new(PAYLOAD)));
        let session = shared_demo();

        let explanation = gateway.generate_into(&session, "reply").await.unwrap();
        assert_eq!(explanation, "Reply to Slack messages.");

        let mut guard = session.lock();
        assert!(guard.graph().contains_node("t"));
        assert!(!guard.is_generating());
        assert!(guard.undo());
        assert_eq!(guard.graph(), &SketchGraph::demo());
    }

    #[tokio::test]
    async fn test_failure_leaves_session_untouched() {
        let gateway = SketchGateway::new(Box::new(FailingBackend));
        let session = shared_demo();

        let err = gateway.generate_into(&session, "anything").await.unwrap_err();
        assert!(matches!(err, GatewayError::Backend(BackendError::Status { status: 503, .. })));

        let guard = session.lock();
        assert_eq!(guard.graph(), &SketchGraph::demo());
        assert!(!guard.can_undo());
        assert!(!guard.is_generating());
    }

    #[tokio::test]
    async fn test_second_request_while_in_flight_is_busy() {
        let release = Arc::new(Notify::new());
        let gateway = Arc::new(SketchGateway::new(Box::new(GatedBackend {
            release: release.clone(),
            payload: PAYLOAD.to_string(),
        })));
        let session = shared_demo();

        let first = {
            let gateway = gateway.clone();
            let session = session.clone();
            tokio::spawn(async move { gateway.generate_into(&session, "first").await })
        };
        while !gateway.is_busy() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            gateway.generate_into(&session, "second").await,
            Err(GatewayError::Busy)
        ));
        assert!(matches!(gateway.generate("third").await, Err(GatewayError::Busy)));

        release.notify_one();
        assert!(first.await.unwrap().is_ok());
        assert!(!gateway.is_busy());
    }

    #[tokio::test]
    async fn test_result_after_close_is_discarded() {
        let release = Arc::new(Notify::new());
        let gateway = Arc::new(SketchGateway::new(Box::new(GatedBackend {
            release: release.clone(),
            payload: PAYLOAD.to_string(),
        })));
        let session = shared_demo();

        let pending = {
            let gateway = gateway.clone();
            let session = session.clone();
            tokio::spawn(async move { gateway.generate_into(&session, "late").await })
        };
        while !gateway.is_busy() {
            tokio::task::yield_now().await;
        }

        session.lock().close();
        release.notify_one();

        let result = pending.await.unwrap();
        assert!(matches!(
            result,
            Err(GatewayError::Session(SketchError::StaleGeneration))
        ));
        assert_eq!(session.lock().graph(), &SketchGraph::demo());
    }
}
