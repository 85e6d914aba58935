//! Per-node execution status feed
//!
//! The deployment target pushes `{nodeId, status}` updates; the session
//! drains them into its status overlay. The feed is a plain tokio channel so
//! any producer (websocket, poller, test) can drive it.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::types::NodeId;

/// Execution status of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Idle,
    Running,
    Success,
    Failure,
}

/// One inbound status update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub node_id: NodeId,
    pub status: NodeStatus,
}

impl StatusUpdate {
    pub fn new(node_id: impl Into<String>, status: NodeStatus) -> Self {
        Self {
            node_id: node_id.into(),
            status,
        }
    }
}

/// Producer half of a status feed
#[derive(Debug, Clone)]
pub struct StatusSender {
    tx: mpsc::UnboundedSender<StatusUpdate>,
}

impl StatusSender {
    /// Push an update; returns false once the feed has been dropped
    pub fn send(&self, update: StatusUpdate) -> bool {
        self.tx.send(update).is_ok()
    }
}

/// Consumer half of a status feed
#[derive(Debug)]
pub struct StatusFeed {
    rx: mpsc::UnboundedReceiver<StatusUpdate>,
}

impl StatusFeed {
    /// Wait for the next update; None once every sender is gone
    pub async fn next(&mut self) -> Option<StatusUpdate> {
        self.rx.recv().await
    }

    /// Take every update that is already queued
    pub fn drain(&mut self) -> Vec<StatusUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = self.rx.try_recv() {
            updates.push(update);
        }
        updates
    }
}

/// Create a connected sender/feed pair
pub fn status_channel() -> (StatusSender, StatusFeed) {
    let (tx, rx) = mpsc::unbounded_channel();
    (StatusSender { tx }, StatusFeed { rx })
}
