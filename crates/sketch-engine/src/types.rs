//! Core types for sketch graphs
//!
//! These types define the structure of a sketch: the nodes, the edges
//! between them, and the graph value that owns both. Every mutator takes
//! `&self` and returns a fresh graph so a reference captured before the
//! call stays a valid historical snapshot.

use std::collections::HashSet;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::error::StructuralError;

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// A point in either canvas or screen space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite (not NaN or infinite)
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// The role a node plays in the automation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Event source; never has inbound edges
    Trigger,
    /// Step performed in response to upstream nodes
    Action,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trigger => "trigger",
            Self::Action => "action",
        }
    }

    /// Parse the wire name of a node kind
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "trigger" => Some(Self::Trigger),
            "action" => Some(Self::Action),
            _ => None,
        }
    }
}

/// A placed unit of automation logic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SketchNode {
    /// Unique identifier, assigned by the creator
    pub id: NodeId,
    /// Trigger or action
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Provider name (e.g. "Google Calendar"), used for export type mapping
    pub service: String,
    /// Description of the specific behavior (e.g. "Event Created")
    pub label: String,
    /// Position in canvas space
    pub position: Point,
    /// Display color, e.g. "#FF9900"
    pub accent_color: String,
}

impl SketchNode {
    /// Create a node with the conventional accent color for its kind
    pub fn new(
        id: impl Into<String>,
        kind: NodeKind,
        service: impl Into<String>,
        label: impl Into<String>,
        position: impl Into<Point>,
    ) -> Self {
        let accent_color = match kind {
            NodeKind::Trigger => crate::constants::colors::TRIGGER,
            NodeKind::Action => crate::constants::colors::ACTION,
        };
        Self {
            id: id.into(),
            kind,
            service: service.into(),
            label: label.into(),
            position: position.into(),
            accent_color: accent_color.to_string(),
        }
    }

    /// Override the accent color
    pub fn with_accent_color(mut self, color: impl Into<String>) -> Self {
        self.accent_color = color.into();
        self
    }

    pub fn is_trigger(&self) -> bool {
        self.kind == NodeKind::Trigger
    }
}

/// A directed connection from one node's output to another's input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SketchEdge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Target node ID
    pub target: NodeId,
}

impl SketchEdge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    /// Whether this edge touches the given node
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// A complete sketch graph
///
/// Insertion order is preserved: later nodes are drawn above earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SketchGraph {
    /// Nodes in the graph
    pub nodes: Vec<SketchNode>,
    /// Edges connecting nodes
    pub edges: Vec<SketchEdge>,
}

impl SketchGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// The sketch a fresh workspace opens with
    pub fn demo() -> Self {
        Self {
            nodes: vec![
                SketchNode::new(
                    "n1",
                    NodeKind::Trigger,
                    "Google Calendar",
                    "Event Created",
                    (280.0, 240.0),
                ),
                SketchNode::new(
                    "n2",
                    NodeKind::Action,
                    "OpenAI",
                    "Generate Summary",
                    (620.0, 240.0),
                ),
            ],
            edges: vec![SketchEdge::new("e1", "n1", "n2")],
        }
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&SketchNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find an edge by ID
    pub fn find_edge(&self, id: &str) -> Option<&SketchEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.find_node(id).is_some()
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.find_edge(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Get edges coming into a node
    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a SketchEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// Get edges going out of a node
    pub fn outgoing_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a SketchEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// Get the IDs of nodes that feed into this node (upstream nodes)
    pub fn get_dependencies(&self, node_id: &str) -> Vec<NodeId> {
        self.incoming_edges(node_id)
            .map(|e| e.source.clone())
            .collect()
    }

    /// Get the IDs of nodes this node feeds (downstream nodes)
    pub fn get_dependents(&self, node_id: &str) -> Vec<NodeId> {
        self.outgoing_edges(node_id)
            .map(|e| e.target.clone())
            .collect()
    }

    /// Edges whose endpoints both resolve to nodes in this graph
    pub fn resolved_edges(&self) -> impl Iterator<Item = &SketchEdge> + '_ {
        let node_ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges.iter().filter(move |e| {
            node_ids.contains(e.source.as_str()) && node_ids.contains(e.target.as_str())
        })
    }

    // ========== Mutators (copy-on-write) ==========

    /// Add a node, rejecting a duplicate id or a non-finite position
    pub fn try_add_node(&self, node: SketchNode) -> Result<SketchGraph, StructuralError> {
        if self.contains_node(&node.id) {
            return Err(StructuralError::DuplicateNodeId(node.id));
        }
        if !node.position.is_finite() {
            return Err(StructuralError::NonFinitePosition(node.id));
        }
        let mut next = self.clone();
        next.nodes.push(node);
        Ok(next)
    }

    /// Add a node; a duplicate id leaves the graph unchanged
    pub fn add_node(&self, node: SketchNode) -> SketchGraph {
        self.try_add_node(node).unwrap_or_else(|err| self.rejected(err))
    }

    /// Remove a node together with every edge touching it
    pub fn try_remove_node(&self, id: &str) -> Result<SketchGraph, StructuralError> {
        if !self.contains_node(id) {
            return Err(StructuralError::UnknownNode(id.to_string()));
        }
        Ok(SketchGraph {
            nodes: self.nodes.iter().filter(|n| n.id != id).cloned().collect(),
            edges: self.edges.iter().filter(|e| !e.touches(id)).cloned().collect(),
        })
    }

    /// Remove a node and its edges; an unknown id is a no-op
    pub fn remove_node(&self, id: &str) -> SketchGraph {
        self.try_remove_node(id).unwrap_or_else(|err| self.rejected(err))
    }

    /// Add an edge after checking both endpoints
    ///
    /// Rejects unknown endpoints, self-loops, edges into a trigger node and
    /// duplicate edge ids. Parallel edges with distinct ids are allowed.
    pub fn try_add_edge(&self, edge: SketchEdge) -> Result<SketchGraph, StructuralError> {
        if self.contains_edge(&edge.id) {
            return Err(StructuralError::DuplicateEdgeId(edge.id));
        }
        if !self.contains_node(&edge.source) {
            return Err(StructuralError::UnknownNode(edge.source));
        }
        let target = self
            .find_node(&edge.target)
            .ok_or_else(|| StructuralError::UnknownNode(edge.target.clone()))?;
        if edge.source == edge.target {
            return Err(StructuralError::SelfLoop {
                edge_id: edge.id,
                node_id: edge.source,
            });
        }
        if target.is_trigger() {
            return Err(StructuralError::TriggerTarget {
                edge_id: edge.id,
                node_id: edge.target,
            });
        }

        let mut next = self.clone();
        next.edges.push(edge);
        Ok(next)
    }

    /// Add an edge; an invalid edge leaves the graph unchanged
    pub fn add_edge(&self, edge: SketchEdge) -> SketchGraph {
        self.try_add_edge(edge).unwrap_or_else(|err| self.rejected(err))
    }

    /// Remove an edge by id
    pub fn try_remove_edge(&self, id: &str) -> Result<SketchGraph, StructuralError> {
        if !self.contains_edge(id) {
            return Err(StructuralError::UnknownEdge(id.to_string()));
        }
        let mut next = self.clone();
        next.edges.retain(|e| e.id != id);
        Ok(next)
    }

    /// Remove an edge; an unknown id is a no-op
    pub fn remove_edge(&self, id: &str) -> SketchGraph {
        self.try_remove_edge(id).unwrap_or_else(|err| self.rejected(err))
    }

    /// Replace a node's position, leaving every other field untouched
    pub fn try_move_node(&self, id: &str, position: Point) -> Result<SketchGraph, StructuralError> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| StructuralError::UnknownNode(id.to_string()))?;
        if !position.is_finite() {
            return Err(StructuralError::NonFinitePosition(id.to_string()));
        }
        let mut next = self.clone();
        next.nodes[index].position = position;
        Ok(next)
    }

    /// Move a node; an unknown id is a no-op
    pub fn move_node(&self, id: &str, position: Point) -> SketchGraph {
        self.try_move_node(id, position)
            .unwrap_or_else(|err| self.rejected(err))
    }

    /// Swap in a whole new graph, handing back the previous one
    pub fn replace(&mut self, next: SketchGraph) -> SketchGraph {
        std::mem::replace(self, next)
    }

    fn rejected(&self, err: StructuralError) -> SketchGraph {
        log::debug!("Rejected graph mutation: {}", err);
        self.clone()
    }
}
