//! Canvas-space geometry: node cards, ports, connector curves, hit testing
//!
//! Everything here works in canvas coordinates. Callers convert pointer
//! positions with [`crate::transform::CanvasTransform::to_canvas`] first.

use crate::constants::{connector, node};
use crate::types::{Point, SketchEdge, SketchGraph, SketchNode};

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

/// The card a node occupies
pub fn node_bounds(n: &SketchNode) -> Rect {
    Rect {
        x: n.position.x,
        y: n.position.y,
        width: node::WIDTH,
        height: node::HEIGHT,
    }
}

/// Output handle (right edge, vertically centered)
pub fn output_port(n: &SketchNode) -> Point {
    Point::new(n.position.x + node::WIDTH, n.position.y + node::HEIGHT / 2.0)
}

/// Input handle (left edge, vertically centered)
pub fn input_port(n: &SketchNode) -> Point {
    Point::new(n.position.x, n.position.y + node::HEIGHT / 2.0)
}

/// What part of a node a canvas point lands on
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeHit<'a> {
    OutputPort(&'a SketchNode),
    Body(&'a SketchNode),
}

/// Topmost node under `p`
///
/// Later nodes are drawn above earlier ones, so the search runs back to
/// front. Each node's output handle is checked before its card, and a card
/// drawn above hides the handles of the nodes beneath it.
pub fn hit_test_node(graph: &SketchGraph, p: Point) -> Option<NodeHit<'_>> {
    graph.nodes.iter().rev().find_map(|n| {
        if output_port(n).distance_to(p) <= node::PORT_HIT_RADIUS {
            Some(NodeHit::OutputPort(n))
        } else if node_bounds(n).contains(p) {
            Some(NodeHit::Body(n))
        } else {
            None
        }
    })
}

/// Quadratic Bézier drawn between two connected nodes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorPath {
    pub start: Point,
    pub control: Point,
    pub end: Point,
}

impl ConnectorPath {
    /// Path from `source`'s output handle to `target`'s input handle
    pub fn between(source: &SketchNode, target: &SketchNode) -> Self {
        let start = output_port(source);
        let end = input_port(target);
        let control = Point::new(
            start.x + (end.x - start.x) * connector::CONTROL_X,
            start.y + (end.y - start.y) * connector::CONTROL_Y,
        );
        Self {
            start,
            control,
            end,
        }
    }

    /// SVG path data (`M sx sy Q cx cy, ex ey`)
    pub fn to_svg(&self) -> String {
        format!(
            "M {} {} Q {} {}, {} {}",
            self.start.x, self.start.y, self.control.x, self.control.y, self.end.x, self.end.y
        )
    }

    /// Point on the curve at parameter `t` in `[0, 1]`
    pub fn point_at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        Point::new(
            u * u * self.start.x + 2.0 * u * t * self.control.x + t * t * self.end.x,
            u * u * self.start.y + 2.0 * u * t * self.control.y + t * t * self.end.y,
        )
    }

    /// Approximate distance from `p` to the curve
    pub fn distance_to(&self, p: Point) -> f64 {
        let mut best = f64::INFINITY;
        let mut prev = self.start;
        for i in 1..=connector::SAMPLES {
            let next = self.point_at(i as f64 / connector::SAMPLES as f64);
            best = best.min(distance_to_segment(p, prev, next));
            prev = next;
        }
        best
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let ap = p - a;
    let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);
    p.distance_to(Point::new(a.x + ab.x * t, a.y + ab.y * t))
}

/// Connector path for an edge, if both endpoints resolve
pub fn edge_path(graph: &SketchGraph, edge: &SketchEdge) -> Option<ConnectorPath> {
    let source = graph.find_node(&edge.source)?;
    let target = graph.find_node(&edge.target)?;
    Some(ConnectorPath::between(source, target))
}

/// Topmost edge whose connector passes within `tolerance` of `p`
pub fn hit_test_edge(graph: &SketchGraph, p: Point, tolerance: f64) -> Option<&SketchEdge> {
    graph.edges.iter().rev().find(|edge| {
        edge_path(graph, edge)
            .map(|path| path.distance_to(p) <= tolerance)
            .unwrap_or(false)
    })
}
