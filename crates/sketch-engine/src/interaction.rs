//! Pointer interaction state machine
//!
//! The machine is a pure transition function: given the current state, a
//! pointer event and a read-only view of the canvas, [`step`] returns the
//! next state plus the effects the session must apply, in order. Dragging,
//! panning and connecting are distinct states, so at most one of them can
//! be active at a time.
//!
//! ```text
//! Idle ──down(node)──────► DraggingNode ──move──► DraggingNode
//!  │  ──down(canvas)─────► PanningCanvas ─move──► PanningCanvas
//!  │  ──down(port)───────► ConnectingEdge ─move─► ConnectingEdge
//!  │  ──down(edge)───────► Idle (edge selection toggled)
//!  ◄──────── up / leave ── any of the above
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::export::MAIN_PORT;
use crate::transform::CanvasTransform;
use crate::types::{EdgeId, NodeId, Point, SketchGraph};

/// Identifier for a node handle
pub type PortId = String;

/// What the pointer landed on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum PointerTarget {
    /// Empty canvas
    Canvas,
    /// A node's body
    Node(NodeId),
    /// A node's output handle
    OutputPort(NodeId),
    /// A connector
    Edge(EdgeId),
}

/// Pointer events in screen coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerEvent {
    Down { screen: Point, target: PointerTarget },
    Move { screen: Point },
    Up { screen: Point, target: PointerTarget },
    Leave,
}

/// Interaction state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum InteractionState {
    #[default]
    Idle,
    /// A node follows the pointer; `offset` is the grab point relative to
    /// the node's position, in canvas space
    DraggingNode { node_id: NodeId, offset: Point },
    /// The canvas follows the pointer; `anchor` is the pointer position
    /// minus the transform offset at press time, in screen space
    PanningCanvas { anchor: Point },
    /// A connector is being drawn from an output handle
    ConnectingEdge {
        from_node: NodeId,
        from_port: PortId,
        /// Loose end of the rubber band, in canvas space
        cursor: Point,
    },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Exclusive selection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum Selection {
    #[default]
    None,
    Node(NodeId),
    Edge(EdgeId),
}

impl Selection {
    pub fn node(&self) -> Option<&str> {
        match self {
            Self::Node(id) => Some(id),
            _ => None,
        }
    }

    pub fn edge(&self) -> Option<&str> {
        match self {
            Self::Edge(id) => Some(id),
            _ => None,
        }
    }

    /// Drop references to ids that no longer exist in `graph`
    pub fn retain_existing(&self, graph: &SketchGraph) -> Selection {
        match self {
            Self::Node(id) if !graph.contains_node(id) => Self::None,
            Self::Edge(id) if !graph.contains_edge(id) => Self::None,
            other => other.clone(),
        }
    }
}

/// A change the session applies after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Snapshot the current graph before any mutation in this transition
    RecordHistory,
    Select(Selection),
    MoveNode { node_id: NodeId, position: Point },
    SetTransform(CanvasTransform),
    /// Add an edge between two nodes; history is recorded only if accepted
    Connect { source: NodeId, target: NodeId },
}

/// Result of one step
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: InteractionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(state: &InteractionState) -> Self {
        Self {
            next: state.clone(),
            effects: Vec::new(),
        }
    }

    fn to(next: InteractionState, effects: Vec<Effect>) -> Self {
        Self { next, effects }
    }
}

/// Read-only view of the session the machine consults
#[derive(Debug, Clone, Copy)]
pub struct CanvasView<'a> {
    pub graph: &'a SketchGraph,
    pub transform: &'a CanvasTransform,
    pub selection: &'a Selection,
}

/// Advance the machine by one pointer event
pub fn step(state: &InteractionState, event: &PointerEvent, view: CanvasView<'_>) -> Transition {
    match (state, event) {
        (InteractionState::Idle, PointerEvent::Down { screen, target }) => {
            press(state, *screen, target, view)
        }

        (InteractionState::DraggingNode { node_id, offset }, PointerEvent::Move { screen }) => {
            if !view.graph.contains_node(node_id) {
                // Node vanished mid-gesture (e.g. replaced by a generation)
                return Transition::to(InteractionState::Idle, Vec::new());
            }
            let position = view.transform.to_canvas(*screen) - *offset;
            Transition::to(
                state.clone(),
                vec![Effect::MoveNode {
                    node_id: node_id.clone(),
                    position,
                }],
            )
        }

        (InteractionState::PanningCanvas { anchor }, PointerEvent::Move { screen }) => {
            let transform = view.transform.with_offset(*screen - *anchor);
            Transition::to(state.clone(), vec![Effect::SetTransform(transform)])
        }

        (
            InteractionState::ConnectingEdge {
                from_node,
                from_port,
                ..
            },
            PointerEvent::Move { screen },
        ) => Transition::to(
            InteractionState::ConnectingEdge {
                from_node: from_node.clone(),
                from_port: from_port.clone(),
                cursor: view.transform.to_canvas(*screen),
            },
            Vec::new(),
        ),

        (
            InteractionState::ConnectingEdge { from_node, .. },
            PointerEvent::Up {
                target: PointerTarget::Node(target) | PointerTarget::OutputPort(target),
                ..
            },
        ) => Transition::to(
            InteractionState::Idle,
            vec![Effect::Connect {
                source: from_node.clone(),
                target: target.clone(),
            }],
        ),

        (InteractionState::Idle, _) => Transition::stay(state),

        (_, PointerEvent::Up { .. } | PointerEvent::Leave) => {
            Transition::to(InteractionState::Idle, Vec::new())
        }

        // A second press while a gesture is active is ignored
        (_, PointerEvent::Down { .. }) => Transition::stay(state),
    }
}

fn press(
    state: &InteractionState,
    screen: Point,
    target: &PointerTarget,
    view: CanvasView<'_>,
) -> Transition {
    match target {
        PointerTarget::Node(node_id) => match view.graph.find_node(node_id) {
            Some(node) => {
                let offset = view.transform.to_canvas(screen) - node.position;
                Transition::to(
                    InteractionState::DraggingNode {
                        node_id: node_id.clone(),
                        offset,
                    },
                    vec![
                        Effect::Select(Selection::Node(node_id.clone())),
                        Effect::RecordHistory,
                    ],
                )
            }
            None => Transition::stay(state),
        },

        PointerTarget::OutputPort(node_id) => {
            if !view.graph.contains_node(node_id) {
                return Transition::stay(state);
            }
            Transition::to(
                InteractionState::ConnectingEdge {
                    from_node: node_id.clone(),
                    from_port: MAIN_PORT.to_string(),
                    cursor: view.transform.to_canvas(screen),
                },
                Vec::new(),
            )
        }

        PointerTarget::Canvas => Transition::to(
            InteractionState::PanningCanvas {
                anchor: screen - view.transform.offset(),
            },
            vec![Effect::Select(Selection::None)],
        ),

        PointerTarget::Edge(edge_id) => {
            if !view.graph.contains_edge(edge_id) {
                return Transition::stay(state);
            }
            let selection = if view.selection.edge() == Some(edge_id.as_str()) {
                Selection::None
            } else {
                Selection::Edge(edge_id.clone())
            };
            Transition::to(InteractionState::Idle, vec![Effect::Select(selection)])
        }
    }
}
