//! Sketch session context
//!
//! [`SketchSession`] owns everything one open workspace needs: the live
//! graph, the canvas transform, the interaction state, the selection, the
//! undo history and the status overlay. Nothing here is global; a host
//! creates one session per workspace and routes pointer and keyboard events
//! into it. Render-relevant changes are reported through an [`EventSink`].
//!
//! Generation is gated: [`SketchSession::begin_generation`] hands out a
//! ticket, at most one ticket is outstanding, and a result delivered with a
//! ticket the session no longer tracks (closed session, cancelled request)
//! is discarded.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::constants::{connector, history};
use crate::error::{Result, SketchError};
use crate::events::{CanvasEvent, EventSink, NullEventSink};
use crate::export::{WorkflowDocument, WorkflowExporter};
use crate::generation::{validate_prompt, GeneratedSketch};
use crate::geometry::{self, NodeHit};
use crate::interaction::{
    step, CanvasView, Effect, InteractionState, PointerEvent, PointerTarget, Selection,
};
use crate::shortcuts::{resolve, KeyChord, Platform, ShortcutCommand};
use crate::status::{NodeStatus, StatusFeed, StatusUpdate};
use crate::transform::CanvasTransform;
use crate::types::{EdgeId, NodeId, Point, SketchEdge, SketchGraph, SketchNode};
use crate::undo::UndoStack;
use crate::validation::{has_cycle, validate_sketch, ValidationError};

/// Proof that a generation request was admitted
///
/// Returned by [`SketchSession::begin_generation`] and handed back with the
/// result. Not `Clone`: one ticket, one completion.
#[derive(Debug, PartialEq, Eq)]
pub struct GenerationTicket {
    epoch: u64,
    prompt: String,
}

impl GenerationTicket {
    /// The trimmed prompt that was admitted
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// One open workspace
pub struct SketchSession {
    graph: SketchGraph,
    transform: CanvasTransform,
    interaction: InteractionState,
    selection: Selection,
    history: UndoStack,
    statuses: BTreeMap<NodeId, NodeStatus>,
    /// Ids of nodes deleted from the current sketch
    retired: BTreeSet<NodeId>,
    events: Arc<dyn EventSink>,
    /// Bumped for every admitted generation request
    epoch: u64,
    pending: Option<u64>,
    closed: bool,
}

impl std::fmt::Debug for SketchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SketchSession")
            .field("nodes", &self.graph.nodes.len())
            .field("edges", &self.graph.edges.len())
            .field("transform", &self.transform)
            .field("interaction", &self.interaction)
            .field("selection", &self.selection)
            .field("undo_len", &self.history.undo_len())
            .field("redo_len", &self.history.redo_len())
            .field("generating", &self.pending.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}

impl Default for SketchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SketchSession {
    /// An empty workspace
    pub fn new() -> Self {
        Self::with_graph(SketchGraph::new())
    }

    /// A workspace seeded with the demo sketch
    pub fn with_demo() -> Self {
        Self::with_graph(SketchGraph::demo())
    }

    /// A workspace opened on an existing graph (no history)
    pub fn with_graph(graph: SketchGraph) -> Self {
        Self {
            graph,
            transform: CanvasTransform::default(),
            interaction: InteractionState::Idle,
            selection: Selection::None,
            history: UndoStack::new(history::MAX_SNAPSHOTS),
            statuses: BTreeMap::new(),
            retired: BTreeSet::new(),
            events: Arc::new(NullEventSink),
            epoch: 0,
            pending: None,
            closed: false,
        }
    }

    /// Route events to `sink`
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    /// Limit the number of undo snapshots kept
    pub fn with_history_limit(mut self, max_snapshots: usize) -> Self {
        self.history = UndoStack::new(max_snapshots);
        self
    }

    // ========== Accessors ==========

    pub fn graph(&self) -> &SketchGraph {
        &self.graph
    }

    pub fn transform(&self) -> &CanvasTransform {
        &self.transform
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Status of a node; nodes without an update are idle
    pub fn status(&self, node_id: &str) -> NodeStatus {
        self.statuses.get(node_id).copied().unwrap_or_default()
    }

    /// Every status update currently in the overlay
    pub fn statuses(&self) -> &BTreeMap<NodeId, NodeStatus> {
        &self.statuses
    }

    pub fn is_generating(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // ========== Pointer input ==========

    /// Resolve what sits under a screen-space point
    ///
    /// Nodes are searched topmost first, each node's output port before its
    /// card. Connectors sit below every node.
    pub fn hit_test(&self, screen: Point) -> PointerTarget {
        let p = self.transform.to_canvas(screen);
        match geometry::hit_test_node(&self.graph, p) {
            Some(NodeHit::OutputPort(node)) => return PointerTarget::OutputPort(node.id.clone()),
            Some(NodeHit::Body(node)) => return PointerTarget::Node(node.id.clone()),
            None => {}
        }
        // Keep the pick tolerance constant on screen
        let tolerance = connector::HIT_TOLERANCE / self.transform.scale;
        if let Some(edge) = geometry::hit_test_edge(&self.graph, p, tolerance) {
            return PointerTarget::Edge(edge.id.clone());
        }
        PointerTarget::Canvas
    }

    /// Feed one pointer event through the interaction machine
    pub fn handle_pointer(&mut self, event: &PointerEvent) {
        if self.closed {
            return;
        }
        let transition = step(
            &self.interaction,
            event,
            CanvasView {
                graph: &self.graph,
                transform: &self.transform,
                selection: &self.selection,
            },
        );
        self.interaction = transition.next;
        for effect in transition.effects {
            self.apply_effect(effect);
        }
    }

    pub fn pointer_down(&mut self, screen: Point) {
        let target = self.hit_test(screen);
        self.handle_pointer(&PointerEvent::Down { screen, target });
    }

    pub fn pointer_move(&mut self, screen: Point) {
        self.handle_pointer(&PointerEvent::Move { screen });
    }

    pub fn pointer_up(&mut self, screen: Point) {
        let target = self.hit_test(screen);
        self.handle_pointer(&PointerEvent::Up { screen, target });
    }

    pub fn pointer_leave(&mut self) {
        self.handle_pointer(&PointerEvent::Leave);
    }

    fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::RecordHistory => self.record(),
            Effect::Select(selection) => self.select(selection),
            Effect::MoveNode { node_id, position } => {
                self.graph = self.graph.move_node(&node_id, position);
                self.emit(CanvasEvent::NodeMoved { node_id, position });
            }
            Effect::SetTransform(transform) => self.set_transform(transform),
            Effect::Connect { source, target } => {
                self.add_edge(source, target);
            }
        }
    }

    // ========== View ==========

    /// Replace the view transform; a non-finite or out-of-range one is ignored
    pub fn set_transform(&mut self, transform: CanvasTransform) {
        if !transform.is_valid() {
            log::debug!("Ignoring invalid transform: {:?}", transform);
            return;
        }
        if self.transform == transform {
            return;
        }
        self.transform = transform;
        self.emit(CanvasEvent::TransformChanged { transform });
    }

    /// Zoom around a screen-space point (e.g. the cursor on a wheel event)
    pub fn zoom_about(&mut self, screen: Point, factor: f64) {
        let transform = self.transform.zoom_about(screen, factor);
        self.set_transform(transform);
    }

    pub fn select(&mut self, selection: Selection) {
        let selection = selection.retain_existing(&self.graph);
        if self.selection == selection {
            return;
        }
        self.selection = selection.clone();
        self.emit(CanvasEvent::SelectionChanged { selection });
    }

    // ========== Edits ==========
    //
    // Each accepted edit records exactly one history entry. Rejected edits
    // are logged at debug level and leave history untouched.

    /// Add a node; false if the id is taken
    ///
    /// Ids of nodes deleted from this sketch stay taken, so a late status
    /// update for a deleted node never lands on a new one. A generated
    /// sketch starts a fresh id space.
    pub fn add_node(&mut self, node: SketchNode) -> bool {
        if self.retired.contains(&node.id) {
            log::debug!("add_node rejected: id '{}' belonged to a deleted node", node.id);
            return false;
        }
        match self.graph.try_add_node(node) {
            Ok(next) => {
                self.commit(next);
                true
            }
            Err(e) => {
                log::debug!("add_node rejected: {}", e);
                false
            }
        }
    }

    /// Remove a node and every edge touching it
    pub fn remove_node(&mut self, node_id: &str) -> bool {
        match self.graph.try_remove_node(node_id) {
            Ok(next) => {
                self.commit(next);
                true
            }
            Err(e) => {
                log::debug!("remove_node rejected: {}", e);
                false
            }
        }
    }

    /// Connect two nodes with a freshly generated edge id
    pub fn add_edge(&mut self, source: impl Into<String>, target: impl Into<String>) -> Option<EdgeId> {
        let id = format!("edge-{}", uuid::Uuid::new_v4());
        let edge = SketchEdge::new(id.clone(), source, target);
        match self.graph.try_add_edge(edge) {
            Ok(next) => {
                self.commit(next);
                Some(id)
            }
            Err(e) => {
                log::debug!("add_edge rejected: {}", e);
                None
            }
        }
    }

    pub fn remove_edge(&mut self, edge_id: &str) -> bool {
        match self.graph.try_remove_edge(edge_id) {
            Ok(next) => {
                self.commit(next);
                true
            }
            Err(e) => {
                log::debug!("remove_edge rejected: {}", e);
                false
            }
        }
    }

    /// Move a node programmatically (one history entry)
    pub fn move_node(&mut self, node_id: &str, position: Point) -> bool {
        match self.graph.try_move_node(node_id, position) {
            Ok(next) => {
                self.commit(next);
                self.emit(CanvasEvent::NodeMoved {
                    node_id: node_id.to_string(),
                    position,
                });
                true
            }
            Err(e) => {
                log::debug!("move_node rejected: {}", e);
                false
            }
        }
    }

    /// Delete whatever is selected
    pub fn delete_selected(&mut self) -> bool {
        match self.selection.clone() {
            Selection::Node(id) => self.remove_node(&id),
            Selection::Edge(id) => self.remove_edge(&id),
            Selection::None => false,
        }
    }

    fn commit(&mut self, next: SketchGraph) {
        self.retired.extend(
            self.graph
                .nodes
                .iter()
                .filter(|n| !next.contains_node(&n.id))
                .map(|n| n.id.clone()),
        );
        self.record();
        self.graph = next;
        self.after_graph_change();
        self.emit(CanvasEvent::GraphEdited {
            node_count: self.graph.nodes.len(),
            edge_count: self.graph.edges.len(),
        });
    }

    fn record(&mut self) {
        if let Err(e) = self.history.record(&self.graph) {
            log::error!("Failed to record history snapshot: {}", e);
            return;
        }
        self.emit_history();
    }

    // ========== History ==========

    /// Step back one entry; false when there is nothing to undo
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.graph) {
            Some(Ok(previous)) => {
                self.restore(previous);
                true
            }
            Some(Err(e)) => {
                log::error!("Undo failed: {}", e);
                false
            }
            None => false,
        }
    }

    /// Step forward one entry; false when there is nothing to redo
    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.graph) {
            Some(Ok(next)) => {
                self.restore(next);
                true
            }
            Some(Err(e)) => {
                log::error!("Redo failed: {}", e);
                false
            }
            None => false,
        }
    }

    /// Run the undo/redo chord, if `chord` is one
    pub fn handle_key(&mut self, chord: &KeyChord, platform: Platform) -> Option<ShortcutCommand> {
        if self.closed {
            return None;
        }
        let command = resolve(chord, platform)?;
        match command {
            ShortcutCommand::Undo => self.undo(),
            ShortcutCommand::Redo => self.redo(),
        };
        Some(command)
    }

    fn restore(&mut self, graph: SketchGraph) {
        self.graph = graph;
        // A gesture in progress refers to the graph that was just swapped out
        self.interaction = InteractionState::Idle;
        self.after_graph_change();
        self.emit(CanvasEvent::GraphReplaced {
            node_count: self.graph.nodes.len(),
            edge_count: self.graph.edges.len(),
        });
        self.emit_history();
    }

    /// Drop selection and statuses that point at vanished ids
    fn after_graph_change(&mut self) {
        let graph = &self.graph;
        self.statuses.retain(|id, _| graph.contains_node(id));
        let selection = self.selection.retain_existing(&self.graph);
        self.select(selection);
    }

    // ========== Generation ==========

    /// Admit a generation request
    ///
    /// Fails if the session is closed, a request is already in flight, or
    /// the prompt is blank. The graph is not touched.
    pub fn begin_generation(&mut self, prompt: &str) -> Result<GenerationTicket> {
        if self.closed {
            return Err(SketchError::SessionClosed);
        }
        if self.pending.is_some() {
            return Err(SketchError::GenerationInFlight);
        }
        let prompt = validate_prompt(prompt)?.to_string();

        self.epoch += 1;
        self.pending = Some(self.epoch);
        self.emit(CanvasEvent::GenerationStateChanged { in_flight: true });
        Ok(GenerationTicket {
            epoch: self.epoch,
            prompt,
        })
    }

    /// Apply a successful generation and return its explanation
    ///
    /// The previous graph is recorded as one history entry, statuses are
    /// cleared and any gesture in progress is cancelled.
    pub fn complete_generation(
        &mut self,
        ticket: GenerationTicket,
        generated: GeneratedSketch,
    ) -> Result<String> {
        self.settle(&ticket)?;

        let GeneratedSketch {
            graph,
            explanation,
            dropped_nodes,
            dropped_edges,
        } = generated;
        if !dropped_nodes.is_empty() || !dropped_edges.is_empty() {
            log::warn!(
                "Generated sketch was repaired: dropped nodes {:?}, edges {:?}",
                dropped_nodes,
                dropped_edges
            );
        }

        self.record();
        let previous = self.graph.replace(graph);
        log::info!(
            "Replaced sketch ({} -> {} nodes)",
            previous.nodes.len(),
            self.graph.nodes.len()
        );
        self.statuses.clear();
        self.retired.clear();
        self.interaction = InteractionState::Idle;
        self.after_graph_change();
        self.emit(CanvasEvent::GraphReplaced {
            node_count: self.graph.nodes.len(),
            edge_count: self.graph.edges.len(),
        });
        Ok(explanation)
    }

    /// Release the gate after a failed request; the graph stays as it was
    pub fn fail_generation(&mut self, ticket: GenerationTicket) -> Result<()> {
        self.settle(&ticket)
    }

    fn settle(&mut self, ticket: &GenerationTicket) -> Result<()> {
        if self.closed || self.pending != Some(ticket.epoch) {
            log::debug!("Discarding stale generation result (epoch {})", ticket.epoch);
            return Err(SketchError::StaleGeneration);
        }
        self.pending = None;
        self.emit(CanvasEvent::GenerationStateChanged { in_flight: false });
        Ok(())
    }

    /// Close the workspace; late generation results are discarded
    pub fn close(&mut self) {
        self.closed = true;
        self.pending = None;
        self.interaction = InteractionState::Idle;
    }

    // ========== Status overlay ==========

    /// Apply one status update; updates for unknown nodes are ignored
    pub fn apply_status(&mut self, update: StatusUpdate) -> bool {
        if !self.graph.contains_node(&update.node_id) {
            log::debug!("Ignoring status for unknown node '{}'", update.node_id);
            return false;
        }
        if self.statuses.get(&update.node_id) == Some(&update.status) {
            return false;
        }
        self.statuses.insert(update.node_id.clone(), update.status);
        self.emit(CanvasEvent::StatusChanged {
            node_id: update.node_id,
            status: update.status,
        });
        true
    }

    /// Apply every queued update; returns how many changed the overlay
    pub fn apply_status_updates(&mut self, feed: &mut StatusFeed) -> usize {
        feed.drain()
            .into_iter()
            .filter(|update| self.apply_status(update.clone()))
            .count()
    }

    // ========== Read-only consumers ==========

    pub fn export(&self, exporter: &WorkflowExporter) -> WorkflowDocument {
        exporter.export(&self.graph)
    }

    /// Structural problems in the live graph (normally none)
    pub fn validate(&self) -> Vec<ValidationError> {
        validate_sketch(&self.graph)
    }

    /// Whether the live graph contains a cycle; informational only
    pub fn has_cycle(&self) -> bool {
        has_cycle(&self.graph)
    }

    fn emit_history(&self) {
        self.emit(CanvasEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    fn emit(&self, event: CanvasEvent) {
        if let Err(e) = self.events.send(event) {
            log::warn!("Failed to deliver canvas event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SketchBuilder;
    use crate::events::VecEventSink;
    use crate::status::status_channel;
    use crate::types::NodeKind;

    /// n1 (trigger) and n2 (action) with n2 at (700, 300)
    fn scenario_graph() -> SketchGraph {
        SketchBuilder::new()
            .trigger("n1", "Google Calendar", "Event Created", (280.0, 240.0))
            .action("n2", "OpenAI", "Generate Summary", (700.0, 300.0))
            .add_edge_with_id("e1", "n1", "n2")
            .build()
    }

    fn drag(session: &mut SketchSession, node: &str, from: Point, moves: &[Point]) {
        session.handle_pointer(&PointerEvent::Down {
            screen: from,
            target: PointerTarget::Node(node.into()),
        });
        for p in moves {
            session.pointer_move(*p);
        }
        session.handle_pointer(&PointerEvent::Up {
            screen: moves.last().copied().unwrap_or(from),
            target: PointerTarget::Canvas,
        });
    }

    fn generated(raw: &str) -> GeneratedSketch {
        GeneratedSketch::from_json(raw).unwrap()
    }

    const THREE_NODE_PAYLOAD: &str = r##"{
        "workflow": {
            "nodes": [
                {"id": "a", "type": "trigger", "service": "Slack", "label": "Message", "position": {"x": 0, "y": 0}, "accentColor": "#FF9900"},
                {"id": "b", "type": "action", "service": "OpenAI", "label": "Reply", "position": {"x": 300, "y": 0}, "accentColor": "#A259FF"},
                {"id": "c", "type": "action", "service": "Slack", "label": "Post", "position": {"x": 600, "y": 0}, "accentColor": "#A259FF"}
            ],
            "edges": [
                {"id": "e1", "source": "a", "target": "b"},
                {"id": "e2", "source": "b", "target": "c"},
                {"id": "e3", "source": "b", "target": "n99"}
            ]
        },
        "explanation": "Answer Slack messages with OpenAI."
    }"##;

    #[test]
    fn test_drag_then_undo() {
        let mut session = SketchSession::with_graph(scenario_graph());

        // Grab n2 at its top-left corner and drag it by (200, 150)
        drag(
            &mut session,
            "n2",
            Point::new(700.0, 300.0),
            &[Point::new(800.0, 380.0), Point::new(900.0, 450.0)],
        );

        let n2 = session.graph().find_node("n2").unwrap();
        assert_eq!(n2.position, Point::new(900.0, 450.0));
        let e1 = session.graph().find_edge("e1").unwrap();
        assert_eq!((e1.source.as_str(), e1.target.as_str()), ("n1", "n2"));
        assert!(session.interaction().is_idle());

        assert!(session.undo());
        let n2 = session.graph().find_node("n2").unwrap();
        assert_eq!(n2.position, Point::new(700.0, 300.0));

        assert!(session.redo());
        let n2 = session.graph().find_node("n2").unwrap();
        assert_eq!(n2.position, Point::new(900.0, 450.0));
    }

    #[test]
    fn test_one_history_entry_per_drag_gesture() {
        let mut session = SketchSession::with_graph(scenario_graph());
        drag(
            &mut session,
            "n2",
            Point::new(710.0, 310.0),
            &[Point::new(750.0, 330.0), Point::new(800.0, 360.0)],
        );
        assert_eq!(session.history().undo_len(), 1);

        drag(&mut session, "n1", Point::new(290.0, 250.0), &[Point::new(300.0, 260.0)]);
        assert_eq!(session.history().undo_len(), 2);
    }

    #[test]
    fn test_press_and_release_without_move_still_records_once() {
        let mut session = SketchSession::with_demo();
        drag(&mut session, "n1", Point::new(300.0, 260.0), &[]);
        assert_eq!(session.history().undo_len(), 1);
        assert_eq!(session.graph(), &SketchGraph::demo());
    }

    #[test]
    fn test_hit_test_layers() {
        let session = SketchSession::with_demo();
        // n1 output port sits at (520, 276)
        assert_eq!(
            session.hit_test(Point::new(521.0, 276.0)),
            PointerTarget::OutputPort("n1".into())
        );
        assert_eq!(
            session.hit_test(Point::new(300.0, 260.0)),
            PointerTarget::Node("n1".into())
        );
        assert_eq!(
            session.hit_test(Point::new(570.0, 276.0)),
            PointerTarget::Edge("e1".into())
        );
        assert_eq!(session.hit_test(Point::new(50.0, 50.0)), PointerTarget::Canvas);
    }

    #[test]
    fn test_pointer_down_on_card_covering_a_port_drags_the_card() {
        let mut session = SketchSession::with_demo();
        session.move_node("n2", Point::new(400.0, 240.0));

        // n1's output port is at (520, 276), under n2's card
        assert_eq!(
            session.hit_test(Point::new(520.0, 276.0)),
            PointerTarget::Node("n2".into())
        );
        session.pointer_down(Point::new(520.0, 276.0));
        assert_eq!(session.selection(), &Selection::Node("n2".into()));
        assert!(!matches!(session.interaction(), InteractionState::ConnectingEdge { .. }));
    }

    #[test]
    fn test_edge_tolerance_is_in_screen_pixels() {
        let mut session = SketchSession::with_demo();
        session.set_transform(CanvasTransform::new(0.0, 0.0, 2.0));
        // e1 runs along canvas y = 276, screen y = 552
        assert_eq!(
            session.hit_test(Point::new(1140.0, 557.0)),
            PointerTarget::Edge("e1".into())
        );
        assert_eq!(session.hit_test(Point::new(1140.0, 562.0)), PointerTarget::Canvas);
    }

    #[test]
    fn test_pan_moves_transform_not_graph() {
        let mut session = SketchSession::with_demo();
        session.pointer_down(Point::new(50.0, 50.0));
        session.pointer_move(Point::new(80.0, 70.0));
        session.pointer_leave();

        assert_eq!(*session.transform(), CanvasTransform::new(30.0, 20.0, 1.0));
        assert_eq!(session.graph(), &SketchGraph::demo());
        assert!(!session.can_undo());
    }

    #[test]
    fn test_drag_after_zoom_keeps_grab_point() {
        let mut session = SketchSession::with_demo();
        session.zoom_about(Point::new(400.0, 300.0), 2.0);
        let grab = session.transform().to_screen(Point::new(300.0, 260.0));

        session.pointer_down(grab);
        session.pointer_move(Point::new(grab.x + 100.0, grab.y));
        session.pointer_up(Point::new(grab.x + 100.0, grab.y));

        let n1 = session.graph().find_node("n1").unwrap();
        assert_eq!(n1.position, Point::new(330.0, 240.0));
    }

    #[test]
    fn test_selection_is_exclusive() {
        let mut session = SketchSession::with_demo();
        session.pointer_down(Point::new(570.0, 276.0));
        assert_eq!(session.selection(), &Selection::Edge("e1".into()));

        session.pointer_down(Point::new(300.0, 260.0));
        session.pointer_up(Point::new(300.0, 260.0));
        assert_eq!(session.selection(), &Selection::Node("n1".into()));

        session.pointer_down(Point::new(10.0, 10.0));
        session.pointer_up(Point::new(10.0, 10.0));
        assert_eq!(session.selection(), &Selection::None);
    }

    #[test]
    fn test_connect_ports_records_once_when_accepted() {
        let mut session = SketchSession::with_graph(
            SketchBuilder::new()
                .trigger("n1", "Google Calendar", "Event Created", (280.0, 240.0))
                .action("n2", "OpenAI", "Generate Summary", (620.0, 240.0))
                .action("n3", "Slack", "Post", (620.0, 400.0))
                .build(),
        );

        session.pointer_down(Point::new(520.0, 276.0));
        assert!(matches!(session.interaction(), InteractionState::ConnectingEdge { .. }));
        session.pointer_move(Point::new(600.0, 420.0));
        session.pointer_up(Point::new(650.0, 430.0));

        assert!(session.interaction().is_idle());
        assert_eq!(session.graph().get_dependents("n1"), vec!["n3"]);
        assert_eq!(session.history().undo_len(), 1);

        // Dropping onto the trigger is rejected and leaves history alone
        session.pointer_down(Point::new(860.0, 276.0));
        session.pointer_up(Point::new(300.0, 260.0));
        assert!(session.graph().get_dependencies("n1").is_empty());
        assert_eq!(session.history().undo_len(), 1);
    }

    #[test]
    fn test_rejected_edits_do_not_touch_history() {
        let mut session = SketchSession::with_demo();
        assert!(session.add_edge("n1", "n99").is_none());
        assert!(session.add_edge("n2", "n2").is_none());
        assert!(!session.remove_node("missing"));
        assert!(!session.move_node("missing", Point::ORIGIN));
        assert!(!session.add_node(SketchNode::new("n1", NodeKind::Action, "Slack", "x", (0.0, 0.0))));
        assert!(!session.can_undo());
        assert_eq!(session.graph(), &SketchGraph::demo());
    }

    #[test]
    fn test_delete_selected_node_cascades() {
        let mut session = SketchSession::with_demo();
        session.select(Selection::Node("n2".into()));
        assert!(session.delete_selected());

        assert!(!session.graph().contains_node("n2"));
        assert!(session.graph().edges.is_empty());
        assert_eq!(session.selection(), &Selection::None);

        assert!(session.undo());
        assert_eq!(session.graph(), &SketchGraph::demo());
        assert!(!session.delete_selected());
    }

    #[test]
    fn test_deleted_node_ids_are_not_reused() {
        let mut session = SketchSession::with_demo();
        assert!(session.remove_node("n2"));

        let reuse = SketchNode::new("n2", NodeKind::Action, "Slack", "Post", (900.0, 240.0));
        assert!(!session.add_node(reuse.clone()));
        assert!(!session.graph().contains_node("n2"));

        // A late update for the deleted node has nowhere to land
        session.apply_status(StatusUpdate::new("n2", NodeStatus::Success));
        assert!(session.statuses().is_empty());

        assert!(session.add_node(SketchNode::new("n3", NodeKind::Action, "Slack", "Post", (900.0, 240.0))));

        // Undo brings the original node back under its own id
        assert!(session.undo());
        assert!(session.undo());
        assert_eq!(session.graph(), &SketchGraph::demo());
        assert!(!session.add_node(reuse));
    }

    #[test]
    fn test_edit_after_undo_clears_redo() {
        let mut session = SketchSession::with_demo();
        session.move_node("n2", Point::new(700.0, 240.0));
        session.undo();
        assert!(session.can_redo());

        session.add_node(SketchNode::new("n3", NodeKind::Action, "Slack", "Post", (900.0, 240.0)));
        assert!(!session.can_redo());
    }

    #[test]
    fn test_keyboard_shortcuts() {
        let mut session = SketchSession::with_demo();
        session.move_node("n2", Point::new(700.0, 240.0));

        let undo = KeyChord::new("z").ctrl();
        assert_eq!(session.handle_key(&undo, Platform::Other), Some(ShortcutCommand::Undo));
        assert_eq!(session.graph(), &SketchGraph::demo());

        let redo = KeyChord::new("Z").ctrl().shift();
        assert_eq!(session.handle_key(&redo, Platform::Other), Some(ShortcutCommand::Redo));
        assert_eq!(
            session.graph().find_node("n2").unwrap().position,
            Point::new(700.0, 240.0)
        );

        assert_eq!(session.handle_key(&KeyChord::new("a").ctrl(), Platform::Other), None);
    }

    #[test]
    fn test_non_finite_input_keeps_history_usable() {
        let mut session = SketchSession::with_demo();
        session.zoom_about(Point::ORIGIN, f64::NAN);
        assert_eq!(*session.transform(), CanvasTransform::default());
        session.set_transform(CanvasTransform {
            x: f64::NAN,
            y: 0.0,
            scale: 1.0,
        });
        assert_eq!(*session.transform(), CanvasTransform::default());

        assert!(!session.move_node("n1", Point::new(f64::NAN, 0.0)));
        assert!(session.move_node("n1", Point::new(10.0, 0.0)));
        assert!(session.move_node("n1", Point::new(20.0, 0.0)));

        assert!(session.undo());
        assert!(session.undo());
        assert_eq!(session.graph(), &SketchGraph::demo());
        assert!(!session.can_undo());
    }

    #[test]
    fn test_history_limit_drops_oldest_entries() {
        let mut session = SketchSession::with_demo().with_history_limit(2);
        for x in [10.0, 20.0, 30.0] {
            assert!(session.move_node("n1", Point::new(x, 0.0)));
        }
        assert_eq!(session.history().undo_len(), 2);

        assert!(session.undo());
        assert!(session.undo());
        assert!(!session.undo());
        assert_eq!(
            session.graph().find_node("n1").unwrap().position,
            Point::new(10.0, 0.0)
        );
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let mut session = SketchSession::with_demo();
        assert!(!session.undo());
        assert!(!session.redo());
        assert_eq!(session.graph(), &SketchGraph::demo());
    }

    #[test]
    fn test_generation_replaces_graph_and_sanitizes() {
        let mut session = SketchSession::with_demo();
        let ticket = session.begin_generation("  answer slack messages ").unwrap();
        assert_eq!(ticket.prompt(), "answer slack messages");
        assert!(session.is_generating());

        let explanation = session
            .complete_generation(ticket, generated(THREE_NODE_PAYLOAD))
            .unwrap();
        assert_eq!(explanation, "Answer Slack messages with OpenAI.");
        assert!(!session.is_generating());

        let graph = session.graph();
        assert_eq!(graph.nodes.len(), 3);
        assert!(graph.edges.iter().all(|e| !e.touches("n99")));
        assert_eq!(graph.edges.len(), 2);

        // One entry for the replace
        assert_eq!(session.history().undo_len(), 1);
        assert!(session.undo());
        assert_eq!(session.graph(), &SketchGraph::demo());
    }

    #[test]
    fn test_failed_generation_leaves_graph_untouched() {
        let mut session = SketchSession::with_demo();
        let ticket = session.begin_generation("anything").unwrap();

        assert!(GeneratedSketch::from_json("{\"workflow\": 1}").is_err());
        session.fail_generation(ticket).unwrap();

        assert_eq!(session.graph(), &SketchGraph::demo());
        assert!(!session.can_undo());
        assert!(!session.is_generating());
    }

    #[test]
    fn test_only_one_generation_in_flight() {
        let mut session = SketchSession::with_demo();
        let _ticket = session.begin_generation("first").unwrap();
        assert!(matches!(
            session.begin_generation("second"),
            Err(SketchError::GenerationInFlight)
        ));
    }

    #[test]
    fn test_blank_prompt_rejected() {
        let mut session = SketchSession::with_demo();
        assert!(matches!(
            session.begin_generation("   "),
            Err(SketchError::Validation(ValidationError::EmptyPrompt))
        ));
        assert!(!session.is_generating());
    }

    #[test]
    fn test_result_after_close_is_discarded() {
        let mut session = SketchSession::with_demo();
        let ticket = session.begin_generation("late").unwrap();
        session.close();

        let result = session.complete_generation(ticket, generated(THREE_NODE_PAYLOAD));
        assert!(matches!(result, Err(SketchError::StaleGeneration)));
        assert_eq!(session.graph(), &SketchGraph::demo());
        assert!(matches!(
            session.begin_generation("again"),
            Err(SketchError::SessionClosed)
        ));
    }

    #[test]
    fn test_generation_cancels_gesture_in_progress() {
        let mut session = SketchSession::with_demo();
        let ticket = session.begin_generation("replace").unwrap();
        session.pointer_down(Point::new(300.0, 260.0));
        assert!(matches!(session.interaction(), InteractionState::DraggingNode { .. }));

        session
            .complete_generation(ticket, generated(THREE_NODE_PAYLOAD))
            .unwrap();
        assert!(session.interaction().is_idle());
        assert_eq!(session.selection(), &Selection::None);

        // Late moves from the cancelled gesture do nothing
        session.pointer_move(Point::new(400.0, 400.0));
        assert_eq!(session.graph().find_node("a").unwrap().position, Point::ORIGIN);
    }

    #[test]
    fn test_status_overlay() {
        let mut session = SketchSession::with_demo();
        let (tx, mut feed) = status_channel();
        tx.send(StatusUpdate::new("n1", NodeStatus::Running));
        tx.send(StatusUpdate::new("ghost", NodeStatus::Failure));
        tx.send(StatusUpdate::new("n2", NodeStatus::Success));

        assert_eq!(session.apply_status_updates(&mut feed), 2);
        assert_eq!(session.status("n1"), NodeStatus::Running);
        assert_eq!(session.status("n2"), NodeStatus::Success);
        assert!(!session.statuses().contains_key("ghost"));

        session.remove_node("n2");
        assert!(!session.statuses().contains_key("n2"));

        let ticket = session.begin_generation("new").unwrap();
        session
            .complete_generation(ticket, generated(THREE_NODE_PAYLOAD))
            .unwrap();
        assert!(session.statuses().is_empty());
    }

    #[test]
    fn test_events_reported() {
        let sink = Arc::new(VecEventSink::new());
        let mut session = SketchSession::with_demo().with_event_sink(sink.clone());

        drag(&mut session, "n2", Point::new(630.0, 250.0), &[Point::new(640.0, 250.0)]);
        let events = sink.events();
        assert!(events.contains(&CanvasEvent::SelectionChanged {
            selection: Selection::Node("n2".into())
        }));
        assert!(events.contains(&CanvasEvent::HistoryChanged {
            can_undo: true,
            can_redo: false
        }));
        assert!(events.contains(&CanvasEvent::NodeMoved {
            node_id: "n2".into(),
            position: Point::new(630.0, 240.0)
        }));

        sink.clear();
        session.undo();
        assert!(sink.events().iter().any(|e| matches!(e, CanvasEvent::GraphReplaced { .. })));
    }

    #[test]
    fn test_export_scenario() {
        let session = SketchSession::with_graph(scenario_graph());
        let doc = session.export(&WorkflowExporter::default());
        assert_eq!(doc.targets_of("n1"), vec!["n2"]);
        assert_eq!(doc.find_node("n2").unwrap().node_type, "n8n-nodes-base.openAi");
        assert!(session.validate().is_empty());
        assert!(!session.has_cycle());
    }
}
