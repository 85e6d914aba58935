//! External collaborators for Sketchbook
//!
//! This library connects a sketch session to the outside world:
//! - **Generation**: prompt → sketch via a pluggable backend (Gemini by
//!   default, or a recorded payload for offline runs)
//! - **Deployment**: exported workflow document → n8n REST API
//!
//! # Example
//!
//! ```rust,ignore
//! use sketch_gateway::{GatewayConfig, GeminiBackend, SketchGateway};
//!
//! let config = GatewayConfig::from_env();
//! let gateway = SketchGateway::new(Box::new(GeminiBackend::new(config.generation)?));
//! let sketch = gateway.generate("When a meeting is booked, post a summary to Slack").await?;
//! ```

pub mod backend;
pub mod config;
pub mod constants;
pub mod deploy;
pub mod gateway;

// Re-exports for convenience
pub use backend::{BackendError, GeminiBackend, GenerationBackend, ReplayBackend};
pub use config::{DeployConfig, GatewayConfig, GenerationConfig};
pub use deploy::{DeployClient, DeployStatus};
pub use gateway::{GatewayError, SharedGateway, SharedSession, SketchGateway};
