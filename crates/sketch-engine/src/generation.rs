//! Generation payload contract
//!
//! An external generator turns a natural-language prompt into
//! `{workflow: {nodes, edges}, explanation}`. This module owns that
//! contract: the instruction and response schema sent to the generator,
//! and the strict parse + sanitize step applied to whatever comes back.
//!
//! Malformed JSON, missing fields and unknown node types are hard
//! failures. Duplicate ids and dangling edges are repaired by
//! [`crate::validation::sanitize`].

use serde_json::{json, Map, Value};

use crate::types::{EdgeId, NodeId, NodeKind, Point, SketchEdge, SketchGraph, SketchNode};
use crate::validation::{sanitize, ValidationError};

/// Instruction given to the generator alongside the user's prompt
pub const SYSTEM_INSTRUCTION: &str = r##"You are a world-class AI Automation Architect.
Your task is to convert a human description of a workflow into a high-fidelity "sketch" JSON object.

RULES:
1. Output a JSON object following the schema provided.
2. Service names must be clear and map to a valid n8n node type.
3. Supported n8n types: 'n8n-nodes-base.googleCalendarTrigger', 'n8n-nodes-base.openAi', 'n8n-nodes-base.slack'.
4. Accent Colors: Use #FF9900 for triggers, #A259FF for actions.
5. Layout: Space nodes logically from left to right.

SCHEMA:
{
  "workflow": {
    "nodes": [
      { "id": "n1", "type": "trigger", "service": "Service Name", "label": "Specific Action", "position": {"x": 100, "y": 200}, "accentColor": "#FF9900" }
    ],
    "edges": [
      { "id": "e1", "source": "n1", "target": "n2" }
    ]
  },
  "explanation": "Human-readable explanation."
}"##;

/// JSON schema the generator's response must follow
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "workflow": {
                "type": "OBJECT",
                "properties": {
                    "nodes": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "id": { "type": "STRING" },
                                "type": { "type": "STRING" },
                                "service": { "type": "STRING" },
                                "label": { "type": "STRING" },
                                "position": {
                                    "type": "OBJECT",
                                    "properties": {
                                        "x": { "type": "NUMBER" },
                                        "y": { "type": "NUMBER" }
                                    }
                                },
                                "accentColor": { "type": "STRING" }
                            },
                            "required": ["id", "type", "service", "label", "position", "accentColor"]
                        }
                    },
                    "edges": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "id": { "type": "STRING" },
                                "source": { "type": "STRING" },
                                "target": { "type": "STRING" }
                            },
                            "required": ["id", "source", "target"]
                        }
                    }
                },
                "required": ["nodes", "edges"]
            },
            "explanation": { "type": "STRING" }
        },
        "required": ["workflow", "explanation"]
    })
}

/// Reject blank prompts before they reach the generator
pub fn validate_prompt(prompt: &str) -> Result<&str, ValidationError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyPrompt)
    } else {
        Ok(trimmed)
    }
}

/// A validated, sanitized generation result
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSketch {
    pub graph: SketchGraph,
    pub explanation: String,
    /// Node ids dropped as duplicates
    pub dropped_nodes: Vec<NodeId>,
    /// Edge ids dropped as duplicates or for invalid endpoints
    pub dropped_edges: Vec<EdgeId>,
}

impl GeneratedSketch {
    /// Parse and sanitize a raw generator response
    pub fn from_json(payload: &str) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Parse and sanitize an already-decoded response
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let (graph, explanation) = parse_payload(value)?;
        let report = sanitize(graph);
        Ok(Self {
            graph: report.graph,
            explanation,
            dropped_nodes: report.dropped_nodes,
            dropped_edges: report.dropped_edges,
        })
    }
}

/// Strict schema check; no repair happens here
pub fn parse_payload(value: &Value) -> Result<(SketchGraph, String), ValidationError> {
    let root = value
        .as_object()
        .ok_or_else(|| ValidationError::MalformedJson("expected a JSON object".to_string()))?;
    let workflow = object_field(root, "workflow", "workflow")?;
    let explanation = string_field(root, "explanation", "explanation")?.to_string();

    let nodes = array_field(workflow, "nodes", "workflow.nodes")?
        .iter()
        .enumerate()
        .map(|(i, node)| parse_node(node, &format!("workflow.nodes[{}]", i)))
        .collect::<Result<Vec<_>, _>>()?;

    let edges = array_field(workflow, "edges", "workflow.edges")?
        .iter()
        .enumerate()
        .map(|(i, edge)| parse_edge(edge, &format!("workflow.edges[{}]", i)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((SketchGraph { nodes, edges }, explanation))
}

fn parse_node(value: &Value, path: &str) -> Result<SketchNode, ValidationError> {
    let obj = value.as_object().ok_or_else(|| missing(path))?;
    let id = string_field(obj, "id", &format!("{}.id", path))?;
    let kind_raw = string_field(obj, "type", &format!("{}.type", path))?;
    let kind = NodeKind::parse(kind_raw).ok_or_else(|| ValidationError::InvalidNodeKind {
        node_id: id.to_string(),
        value: kind_raw.to_string(),
    })?;
    let service = string_field(obj, "service", &format!("{}.service", path))?;
    let label = string_field(obj, "label", &format!("{}.label", path))?;
    let accent = string_field(obj, "accentColor", &format!("{}.accentColor", path))?;

    let position_path = format!("{}.position", path);
    let position = object_field(obj, "position", &position_path)?;
    let x = number_field(position, "x", &format!("{}.x", position_path))?;
    let y = number_field(position, "y", &format!("{}.y", position_path))?;

    Ok(SketchNode {
        id: id.to_string(),
        kind,
        service: service.to_string(),
        label: label.to_string(),
        position: Point::new(x, y),
        accent_color: accent.to_string(),
    })
}

fn parse_edge(value: &Value, path: &str) -> Result<SketchEdge, ValidationError> {
    let obj = value.as_object().ok_or_else(|| missing(path))?;
    Ok(SketchEdge::new(
        string_field(obj, "id", &format!("{}.id", path))?,
        string_field(obj, "source", &format!("{}.source", path))?,
        string_field(obj, "target", &format!("{}.target", path))?,
    ))
}

fn missing(path: &str) -> ValidationError {
    ValidationError::MissingField {
        path: path.to_string(),
    }
}

fn string_field<'a>(obj: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a str, ValidationError> {
    obj.get(key).and_then(Value::as_str).ok_or_else(|| missing(path))
}

fn number_field(obj: &Map<String, Value>, key: &str, path: &str) -> Result<f64, ValidationError> {
    obj.get(key).and_then(Value::as_f64).ok_or_else(|| missing(path))
}

fn object_field<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ValidationError> {
    obj.get(key).and_then(Value::as_object).ok_or_else(|| missing(path))
}

fn array_field<'a>(obj: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a Vec<Value>, ValidationError> {
    obj.get(key).and_then(Value::as_array).ok_or_else(|| missing(path))
}
