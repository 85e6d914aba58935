//! Graph validation and sanitization
//!
//! Validates graph structure, repairs externally supplied graphs, and
//! detects cycles. Cycles are reported but never rejected: adjacency-list
//! export does not need acyclicity.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::{EdgeId, NodeId, NodeKind, SketchGraph};

/// Validation error with location context
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Payload is not valid JSON or has the wrong shape
    MalformedJson(String),
    /// A required field is absent or has the wrong type
    MissingField { path: String },
    /// A node declares a type other than trigger/action
    InvalidNodeKind { node_id: String, value: String },
    /// Two nodes share an id
    DuplicateNodeId { node_id: String },
    /// Two edges share an id
    DuplicateEdgeId { edge_id: String },
    /// An edge references a non-existent node
    UnknownNode { edge_id: String, node_id: String },
    /// An edge connects a node to itself
    SelfLoop { edge_id: String },
    /// An edge points into a trigger node
    TriggerTarget { edge_id: String, node_id: String },
    /// A generation prompt with no content
    EmptyPrompt,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedJson(msg) => write!(f, "Malformed payload: {}", msg),
            Self::MissingField { path } => write!(f, "Missing required field '{}'", path),
            Self::InvalidNodeKind { node_id, value } => {
                write!(f, "Node '{}' has invalid type '{}'", node_id, value)
            }
            Self::DuplicateNodeId { node_id } => write!(f, "Duplicate node id '{}'", node_id),
            Self::DuplicateEdgeId { edge_id } => write!(f, "Duplicate edge id '{}'", edge_id),
            Self::UnknownNode { edge_id, node_id } => {
                write!(f, "Edge '{}' references unknown node '{}'", edge_id, node_id)
            }
            Self::SelfLoop { edge_id } => write!(f, "Edge '{}' is a self-loop", edge_id),
            Self::TriggerTarget { edge_id, node_id } => {
                write!(
                    f,
                    "Edge '{}' targets trigger node '{}'",
                    edge_id, node_id
                )
            }
            Self::EmptyPrompt => write!(f, "Prompt is empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a sketch graph
///
/// Returns all structural problems found (not just the first).
pub fn validate_sketch(graph: &SketchGraph) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_unique_ids(graph, &mut errors);
    validate_edge_references(graph, &mut errors);

    errors
}

/// Check node and edge ids are unique
fn validate_unique_ids(graph: &SketchGraph, errors: &mut Vec<ValidationError>) {
    let mut seen_nodes: HashSet<&str> = HashSet::new();
    for node in &graph.nodes {
        if !seen_nodes.insert(&node.id) {
            errors.push(ValidationError::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
    }

    let mut seen_edges: HashSet<&str> = HashSet::new();
    for edge in &graph.edges {
        if !seen_edges.insert(&edge.id) {
            errors.push(ValidationError::DuplicateEdgeId {
                edge_id: edge.id.clone(),
            });
        }
    }
}

/// Check that edge endpoints exist and respect node kinds
fn validate_edge_references(graph: &SketchGraph, errors: &mut Vec<ValidationError>) {
    let kinds: HashMap<&str, NodeKind> = graph
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.kind))
        .collect();

    for edge in &graph.edges {
        if !kinds.contains_key(edge.source.as_str()) {
            errors.push(ValidationError::UnknownNode {
                edge_id: edge.id.clone(),
                node_id: edge.source.clone(),
            });
        }
        match kinds.get(edge.target.as_str()) {
            None => errors.push(ValidationError::UnknownNode {
                edge_id: edge.id.clone(),
                node_id: edge.target.clone(),
            }),
            Some(NodeKind::Trigger) => errors.push(ValidationError::TriggerTarget {
                edge_id: edge.id.clone(),
                node_id: edge.target.clone(),
            }),
            Some(NodeKind::Action) => {}
        }
        if edge.source == edge.target {
            errors.push(ValidationError::SelfLoop {
                edge_id: edge.id.clone(),
            });
        }
    }
}

/// Outcome of [`sanitize`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sanitized {
    /// The repaired graph
    pub graph: SketchGraph,
    /// Node ids dropped as duplicates (later occurrences)
    pub dropped_nodes: Vec<NodeId>,
    /// Edge ids dropped as duplicates or for invalid endpoints
    pub dropped_edges: Vec<EdgeId>,
}

impl Sanitized {
    /// Whether anything had to be dropped
    pub fn is_clean(&self) -> bool {
        self.dropped_nodes.is_empty() && self.dropped_edges.is_empty()
    }
}

/// Repair an externally supplied graph
///
/// Keeps the first occurrence of each node and edge id, then drops every
/// edge that is unresolved, a self-loop, or points into a trigger.
/// Order of the surviving nodes and edges is preserved.
pub fn sanitize(graph: SketchGraph) -> Sanitized {
    let mut report = Sanitized::default();

    let mut seen_nodes: HashSet<NodeId> = HashSet::new();
    for node in graph.nodes {
        if seen_nodes.insert(node.id.clone()) {
            report.graph.nodes.push(node);
        } else {
            report.dropped_nodes.push(node.id);
        }
    }

    let kinds: HashMap<&str, NodeKind> = report
        .graph
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.kind))
        .collect();

    let mut seen_edges: HashSet<EdgeId> = HashSet::new();
    let mut edges = Vec::new();
    for edge in graph.edges {
        let resolved = kinds.contains_key(edge.source.as_str())
            && matches!(kinds.get(edge.target.as_str()), Some(NodeKind::Action))
            && edge.source != edge.target;
        if resolved && seen_edges.insert(edge.id.clone()) {
            edges.push(edge);
        } else {
            report.dropped_edges.push(edge.id);
        }
    }
    report.graph.edges = edges;

    if !report.is_clean() {
        log::debug!(
            "Sanitized graph: dropped {} node(s), {} edge(s)",
            report.dropped_nodes.len(),
            report.dropped_edges.len()
        );
    }

    report
}

/// Detect cycles using Kahn's algorithm (topological sort)
///
/// Edges with unresolved endpoints are ignored.
pub fn has_cycle(graph: &SketchGraph) -> bool {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    for node in &graph.nodes {
        in_degree.insert(&node.id, 0);
    }
    let edges: Vec<_> = graph.resolved_edges().collect();
    for edge in &edges {
        if let Some(deg) = in_degree.get_mut(edge.target.as_str()) {
            *deg += 1;
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut visited = 0;
    while let Some(node_id) = queue.pop_front() {
        visited += 1;
        for edge in &edges {
            if edge.source == node_id {
                if let Some(deg) = in_degree.get_mut(edge.target.as_str()) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(&edge.target);
                    }
                }
            }
        }
    }

    visited < in_degree.len()
}
