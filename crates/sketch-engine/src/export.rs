//! Sketch → n8n workflow export
//!
//! A one-way, pure translation from a [`SketchGraph`] to the document shape
//! the n8n REST API accepts. There is no import path. Exporting the same
//! graph twice yields byte-identical JSON: connections are keyed in a
//! `BTreeMap` and node/edge order follows the graph.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::constants::export as defaults;
use crate::error::Result;
use crate::types::{NodeId, SketchGraph, SketchNode};

/// Explicit service → external node type table
///
/// Keys are normalized service names (see [`ServiceCatalog::normalize`]);
/// lookup is exact on the normalized key.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCatalog {
    entries: BTreeMap<String, String>,
    fallback: String,
}

impl ServiceCatalog {
    /// A catalog with no entries
    pub fn empty(fallback: impl Into<String>) -> Self {
        Self {
            entries: BTreeMap::new(),
            fallback: fallback.into(),
        }
    }

    /// The services the generator is told it may use
    pub fn builtin() -> Self {
        Self::empty(defaults::UNKNOWN_TYPE)
            .with_service("Google Calendar", "n8n-nodes-base.googleCalendarTrigger")
            .with_service("OpenAI", "n8n-nodes-base.openAi")
            .with_service("Slack", "n8n-nodes-base.slack")
    }

    /// Add or overwrite a mapping
    pub fn with_service(mut self, service: &str, external_type: impl Into<String>) -> Self {
        self.entries
            .insert(Self::normalize(service), external_type.into());
        self
    }

    /// Trim, lowercase and collapse inner whitespace
    pub fn normalize(service: &str) -> String {
        service
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// External type for a service, or the fallback type
    pub fn lookup(&self, service: &str) -> &str {
        self.entries
            .get(&Self::normalize(service))
            .map(String::as_str)
            .unwrap_or(self.fallback.as_str())
    }

    pub fn is_known(&self, service: &str) -> bool {
        self.entries.contains_key(&Self::normalize(service))
    }

    /// Iterate over (normalized service, external type) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// A node record in the exported document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub type_version: u32,
    pub position: [f64; 2],
    pub parameters: serde_json::Map<String, serde_json::Value>,
    pub credentials: serde_json::Map<String, serde_json::Value>,
}

/// One downstream connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    pub node: String,
    pub input: String,
}

/// Outputs of a single node; only the `main` output exists
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeOutputs {
    pub main: Vec<Vec<ConnectionTarget>>,
}

/// Adjacency keyed by source node id
///
/// Nodes without outgoing edges have no entry at all.
pub type Connections = BTreeMap<NodeId, NodeOutputs>;

/// The exported workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    pub name: String,
    pub nodes: Vec<ExternalNode>,
    pub connections: Connections,
    /// Always false; export never activates a workflow
    pub active: bool,
    pub settings: serde_json::Map<String, serde_json::Value>,
}

impl WorkflowDocument {
    /// Compact JSON, as sent over the wire
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Target ids connected from `source`, in edge order
    pub fn targets_of(&self, source: &str) -> Vec<&str> {
        self.connections
            .get(source)
            .map(|outputs| {
                outputs
                    .main
                    .iter()
                    .flatten()
                    .map(|t| t.node.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn find_node(&self, id: &str) -> Option<&ExternalNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Translates sketches into workflow documents
#[derive(Debug, Clone)]
pub struct WorkflowExporter {
    catalog: ServiceCatalog,
    name: String,
}

impl Default for WorkflowExporter {
    fn default() -> Self {
        Self {
            catalog: ServiceCatalog::builtin(),
            name: defaults::WORKFLOW_NAME.to_string(),
        }
    }
}

impl WorkflowExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, catalog: ServiceCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    /// Translate a graph snapshot
    ///
    /// Edges whose endpoints do not resolve are skipped.
    pub fn export(&self, graph: &SketchGraph) -> WorkflowDocument {
        let nodes = graph.nodes.iter().map(|n| self.external_node(n)).collect();

        let node_ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        let mut connections = Connections::new();
        for edge in &graph.edges {
            if !node_ids.contains(edge.source.as_str()) || !node_ids.contains(edge.target.as_str()) {
                log::debug!("Skipping unresolved edge '{}' during export", edge.id);
                continue;
            }
            let outputs = connections.entry(edge.source.clone()).or_default();
            if outputs.main.is_empty() {
                outputs.main.push(Vec::new());
            }
            outputs.main[0].push(ConnectionTarget {
                node: edge.target.clone(),
                input: defaults::MAIN_PORT.to_string(),
            });
        }

        WorkflowDocument {
            name: self.name.clone(),
            nodes,
            connections,
            active: false,
            settings: serde_json::Map::new(),
        }
    }

    fn external_node(&self, node: &SketchNode) -> ExternalNode {
        ExternalNode {
            id: node.id.clone(),
            name: node.service.clone(),
            node_type: self.catalog.lookup(&node.service).to_string(),
            type_version: defaults::TYPE_VERSION,
            position: [node.position.x, node.position.y],
            parameters: serde_json::Map::new(),
            credentials: serde_json::Map::new(),
        }
    }
}

/// Export with the builtin catalog and default name
pub fn export(graph: &SketchGraph) -> WorkflowDocument {
    WorkflowExporter::default().export(graph)
}
