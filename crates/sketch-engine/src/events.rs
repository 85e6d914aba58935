//! Canvas events for renderers
//!
//! Events are sent from the session to the view layer (or any consumer)
//! to report changes that need a redraw.

use serde::{Deserialize, Serialize};

use crate::interaction::Selection;
use crate::status::NodeStatus;
use crate::transform::CanvasTransform;
use crate::types::Point;

/// Trait for sending canvas events
///
/// This abstracts over the transport mechanism (UI channel, mpsc, etc.)
/// allowing the session to be used in different contexts.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be sent (e.g., channel closed)
    fn send(&self, event: CanvasEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

/// Events emitted by a sketch session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CanvasEvent {
    /// The whole graph was swapped (generation, undo, redo)
    #[serde(rename_all = "camelCase")]
    GraphReplaced { node_count: usize, edge_count: usize },

    /// Nodes or edges were added or removed
    #[serde(rename_all = "camelCase")]
    GraphEdited { node_count: usize, edge_count: usize },

    /// A node moved during a drag
    #[serde(rename_all = "camelCase")]
    NodeMoved { node_id: String, position: Point },

    /// Selection changed
    SelectionChanged { selection: Selection },

    /// Pan/zoom changed
    TransformChanged { transform: CanvasTransform },

    /// Undo/redo availability changed
    #[serde(rename_all = "camelCase")]
    HistoryChanged { can_undo: bool, can_redo: bool },

    /// A node's execution status changed
    #[serde(rename_all = "camelCase")]
    StatusChanged { node_id: String, status: NodeStatus },

    /// Generation request started or finished
    #[serde(rename_all = "camelCase")]
    GenerationStateChanged { in_flight: bool },
}

/// A no-op event sink that discards all events
///
/// Useful for testing or when events aren't needed.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: CanvasEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: std::sync::Mutex<Vec<CanvasEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<CanvasEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: CanvasEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .map_err(|_| EventError {
                message: "Event buffer poisoned".to_string(),
            })?
            .push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_event_sink() {
        let sink = VecEventSink::new();

        sink.send(CanvasEvent::NodeMoved {
            node_id: "n1".to_string(),
            position: Point::new(1.0, 2.0),
        })
        .unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);

        match &events[0] {
            CanvasEvent::NodeMoved { node_id, position } => {
                assert_eq!(node_id, "n1");
                assert_eq!(*position, Point::new(1.0, 2.0));
            }
            _ => panic!("Expected NodeMoved event"),
        }

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_null_event_sink() {
        let sink = NullEventSink;
        // Should not panic
        sink.send(CanvasEvent::HistoryChanged {
            can_undo: true,
            can_redo: false,
        })
        .unwrap();
    }

    #[test]
    fn test_event_wire_format() {
        let json = serde_json::to_value(CanvasEvent::StatusChanged {
            node_id: "n1".into(),
            status: NodeStatus::Running,
        })
        .unwrap();
        assert_eq!(json["type"], "statusChanged");
        assert_eq!(json["nodeId"], "n1");
        assert_eq!(json["status"], "running");
    }
}
