//! Fluent builder for sketch graphs
//!
//! Provides a fluent API for constructing graphs programmatically, mostly
//! for tests and seed data. The builder does not enforce structural
//! invariants; run the result through [`crate::validation`] when it matters.

use crate::types::{NodeKind, Point, SketchEdge, SketchGraph, SketchNode};

/// Fluent builder for constructing sketch graphs
///
/// # Example
///
/// ```
/// use sketch_engine::SketchBuilder;
///
/// let graph = SketchBuilder::new()
///     .trigger("n1", "Google Calendar", "Event Created", (280.0, 240.0))
///     .action("n2", "OpenAI", "Generate Summary", (620.0, 240.0))
///     .add_edge("n1", "n2")
///     .build();
/// assert_eq!(graph.edges.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct SketchBuilder {
    nodes: Vec<SketchNode>,
    edges: Vec<SketchEdge>,
    edge_counter: usize,
}

impl SketchBuilder {
    /// Create a new sketch builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node of any kind
    pub fn add_node(
        mut self,
        id: impl Into<String>,
        kind: NodeKind,
        service: impl Into<String>,
        label: impl Into<String>,
        position: impl Into<Point>,
    ) -> Self {
        self.nodes
            .push(SketchNode::new(id, kind, service, label, position));
        self
    }

    /// Add a trigger node
    pub fn trigger(
        self,
        id: impl Into<String>,
        service: impl Into<String>,
        label: impl Into<String>,
        position: impl Into<Point>,
    ) -> Self {
        self.add_node(id, NodeKind::Trigger, service, label, position)
    }

    /// Add an action node
    pub fn action(
        self,
        id: impl Into<String>,
        service: impl Into<String>,
        label: impl Into<String>,
        position: impl Into<Point>,
    ) -> Self {
        self.add_node(id, NodeKind::Action, service, label, position)
    }

    /// Set the accent color on the most recently added node
    ///
    /// Must be called immediately after adding a node.
    pub fn with_accent_color(mut self, color: impl Into<String>) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.accent_color = color.into();
        }
        self
    }

    /// Add an edge between two nodes (auto-generates edge ID)
    pub fn add_edge(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.edge_counter += 1;
        self.edges.push(SketchEdge::new(
            format!("edge-{}", self.edge_counter),
            source,
            target,
        ));
        self
    }

    /// Add an edge with an explicit ID
    pub fn add_edge_with_id(
        mut self,
        edge_id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.edges.push(SketchEdge::new(edge_id, source, target));
        self
    }

    /// Build the graph without validation
    pub fn build(self) -> SketchGraph {
        SketchGraph {
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}
