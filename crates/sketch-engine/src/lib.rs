//! Sketch Engine - Interactive workflow canvas core for Sketchbook
//!
//! This crate holds everything a workflow sketch needs while it is being
//! drawn, with no network I/O. It supports:
//!
//! - An immutable-value graph model (trigger and action nodes, directed edges)
//! - Pan/zoom transform with scale-aware drag math
//! - A pure pointer interaction state machine (drag, pan, connect)
//! - Compressed snapshot-based undo/redo
//! - One-way export to n8n workflow documents
//! - Strict parsing and sanitizing of generated sketches
//! - A per-node execution status overlay fed by a channel
//!
//! # Architecture
//!
//! - `SketchSession`: the context object for one open workspace; routes
//!   pointer and keyboard input, owns history and the status overlay
//! - `interaction::step`: transition function, returns effects for the
//!   session to apply
//! - `UndoStack`: compressed immutable snapshots for undo/redo
//! - `WorkflowExporter`: pure graph → document translation
//! - `EventSink`: render notifications (not tied to any UI toolkit)
//!
//! # Example
//!
//! ```
//! use sketch_engine::{Point, SketchSession};
//!
//! let mut session = SketchSession::with_demo();
//! session.move_node("n2", Point::new(700.0, 300.0));
//! session.undo();
//!
//! let doc = sketch_engine::export(session.graph());
//! assert_eq!(doc.targets_of("n1"), vec!["n2"]);
//! ```

pub mod builder;
pub mod constants;
pub mod error;
pub mod events;
pub mod export;
pub mod generation;
pub mod geometry;
pub mod interaction;
pub mod session;
pub mod shortcuts;
pub mod status;
pub mod transform;
pub mod types;
pub mod undo;
pub mod validation;

// Re-export key types
pub use builder::SketchBuilder;
pub use error::{Result, SketchError, StructuralError};
pub use events::{CanvasEvent, EventSink, NullEventSink, VecEventSink};
pub use export::{export, ServiceCatalog, WorkflowDocument, WorkflowExporter};
pub use generation::GeneratedSketch;
pub use interaction::{InteractionState, PointerEvent, PointerTarget, Selection};
pub use session::{GenerationTicket, SketchSession};
pub use shortcuts::{KeyChord, Platform, ShortcutCommand};
pub use status::{status_channel, NodeStatus, StatusFeed, StatusSender, StatusUpdate};
pub use transform::CanvasTransform;
pub use types::{EdgeId, NodeId, NodeKind, Point, SketchEdge, SketchGraph, SketchNode};
pub use undo::UndoStack;
pub use validation::ValidationError;
