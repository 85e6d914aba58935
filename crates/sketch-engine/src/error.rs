//! Error types for the sketch engine

use thiserror::Error;

use crate::validation::ValidationError;

/// Result type alias using SketchError
pub type Result<T> = std::result::Result<T, SketchError>;

/// A mutation that would break a structural invariant of the graph
///
/// The lenient graph mutators swallow these (logging at debug level) and
/// return the graph unchanged. The `try_*` variants hand them back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// The id does not resolve to a node in the graph
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// The id does not resolve to an edge in the graph
    #[error("Unknown edge: {0}")]
    UnknownEdge(String),

    /// An edge from a node to itself
    #[error("Edge '{edge_id}' would connect node '{node_id}' to itself")]
    SelfLoop { edge_id: String, node_id: String },

    /// An edge targeting a trigger node
    #[error("Edge '{edge_id}' targets trigger node '{node_id}'")]
    TriggerTarget { edge_id: String, node_id: String },

    /// A node id that is already taken
    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(String),

    /// An edge id that is already taken
    #[error("Duplicate edge id: {0}")]
    DuplicateEdgeId(String),

    /// A node position with a NaN or infinite coordinate
    #[error("Non-finite position for node: {0}")]
    NonFinitePosition(String),
}

/// Errors that can occur in the sketch engine
#[derive(Debug, Error)]
pub enum SketchError {
    /// Structural invariant violation
    #[error("Structural error: {0}")]
    Structural(#[from] StructuralError),

    /// Generation payload failed validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// A generation request is already outstanding for this session
    #[error("A generation request is already in flight")]
    GenerationInFlight,

    /// A generation result arrived for a request the session no longer tracks
    #[error("Generation result is stale and was discarded")]
    StaleGeneration,

    /// The session has been closed
    #[error("Session closed")]
    SessionClosed,
}
