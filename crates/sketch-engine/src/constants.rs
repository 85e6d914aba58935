//! Engine-wide constants
//!
//! Single source of truth for canvas geometry, history limits and export defaults.

/// Node card geometry (canvas units)
pub mod node {
    /// Width of a rendered node card
    pub const WIDTH: f64 = 240.0;
    /// Height of a rendered node card
    pub const HEIGHT: f64 = 72.0;
    /// Pick radius around the output port handle
    pub const PORT_HIT_RADIUS: f64 = 10.0;
}

/// Connector rendering
pub mod connector {
    /// Horizontal position of the control point, as a fraction of the span
    pub const CONTROL_X: f64 = 0.5;
    /// Vertical position of the control point, as a fraction of the span
    pub const CONTROL_Y: f64 = 0.2;
    /// Segments used when measuring distance to a connector curve
    pub const SAMPLES: usize = 32;
    /// Pick tolerance around a connector curve, in screen pixels
    ///
    /// Divide by the transform scale before comparing against canvas distances.
    pub const HIT_TOLERANCE: f64 = 6.0;
}

/// Pan/zoom limits
pub mod zoom {
    pub const MIN_SCALE: f64 = 0.1;
    pub const MAX_SCALE: f64 = 10.0;
}

/// Accent colors
pub mod colors {
    pub const TRIGGER: &str = "#FF9900";
    pub const ACTION: &str = "#A259FF";
}

/// Undo history
pub mod history {
    /// Maximum number of undo snapshots kept
    pub const MAX_SNAPSHOTS: usize = 100;
    /// zstd compression level for snapshots
    pub const COMPRESSION_LEVEL: i32 = 3;
}

/// Workflow export defaults
pub mod export {
    /// Name given to exported workflows
    pub const WORKFLOW_NAME: &str = "WorkflowHub Sketch";
    /// External type used when a service has no mapping
    pub const UNKNOWN_TYPE: &str = "n8n-nodes-base.unknown";
    /// Version stamped on every exported node
    pub const TYPE_VERSION: u32 = 1;
    /// Name of the single output/input port
    pub const MAIN_PORT: &str = "main";
}
