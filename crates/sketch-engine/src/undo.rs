//! Undo/redo system using compressed snapshots
//!
//! This module provides a linear undo/redo history based on compressed
//! immutable snapshots of the sketch graph. Two stacks are kept: past
//! snapshots (oldest first) and future snapshots (nearest future last).
//!
//! Snapshots are serde_json documents compressed with zstd. A snapshot that
//! fails to decode is dropped and the walk continues with the next one.

use std::collections::VecDeque;

use crate::constants::history;
use crate::error::{Result, SketchError};
use crate::types::SketchGraph;

/// Undo/redo stacks of compressed snapshots
#[derive(Debug)]
pub struct UndoStack {
    /// Past graph states, oldest first (zstd)
    undo: VecDeque<Vec<u8>>,
    /// Future graph states; the top is the nearest future
    redo: Vec<Vec<u8>>,
    /// Maximum number of undo snapshots to keep
    max_snapshots: usize,
}

impl UndoStack {
    /// Create a new undo stack with the specified maximum size
    pub fn new(max_snapshots: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_snapshots: max_snapshots.max(1), // At least 1 snapshot
        }
    }

    /// Record the graph as it was before a mutation
    ///
    /// Clears the redo stack: history is linear.
    pub fn record(&mut self, graph: &SketchGraph) -> Result<()> {
        let compressed = compress(graph)?;

        self.redo.clear();
        self.undo.push_back(compressed);

        // Trim old snapshots if over limit
        while self.undo.len() > self.max_snapshots {
            self.undo.pop_front();
        }

        Ok(())
    }

    /// Undo: swap `current` for the most recent past snapshot
    ///
    /// Returns the restored graph, or None if there is nothing to undo.
    /// Undecodable snapshots are discarded; if none of the remaining past
    /// snapshots decodes, the last decode error is returned.
    pub fn undo(&mut self, current: &SketchGraph) -> Option<Result<SketchGraph>> {
        let current = match compress(current) {
            Ok(bytes) => bytes,
            Err(e) => return Some(Err(e)),
        };
        let mut failure = None;
        while let Some(top) = self.undo.pop_back() {
            match decompress(&top) {
                Ok(restored) => {
                    self.redo.push(current);
                    return Some(Ok(restored));
                }
                Err(e) => {
                    log::warn!("Dropping undecodable undo snapshot: {}", e);
                    failure = Some(e);
                }
            }
        }
        failure.map(Err)
    }

    /// Redo: swap `current` for the nearest future snapshot
    ///
    /// Returns the restored graph, or None if there is nothing to redo.
    /// Undecodable snapshots are discarded the same way as for undo.
    pub fn redo(&mut self, current: &SketchGraph) -> Option<Result<SketchGraph>> {
        let current = match compress(current) {
            Ok(bytes) => bytes,
            Err(e) => return Some(Err(e)),
        };
        let mut failure = None;
        while let Some(top) = self.redo.pop() {
            match decompress(&top) {
                Ok(restored) => {
                    self.undo.push_back(current);
                    while self.undo.len() > self.max_snapshots {
                        self.undo.pop_front();
                    }
                    return Some(Ok(restored));
                }
                Err(e) => {
                    log::warn!("Dropping undecodable redo snapshot: {}", e);
                    failure = Some(e);
                }
            }
        }
        failure.map(Err)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of past snapshots
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of future snapshots
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Check if both stacks are empty
    pub fn is_empty(&self) -> bool {
        self.undo.is_empty() && self.redo.is_empty()
    }

    /// Clear all snapshots
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Get the total compressed size of all snapshots
    pub fn compressed_size(&self) -> usize {
        self.undo.iter().chain(self.redo.iter()).map(|s| s.len()).sum()
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(history::MAX_SNAPSHOTS)
    }
}

fn compress(graph: &SketchGraph) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(graph)?;
    zstd::encode_all(&json[..], history::COMPRESSION_LEVEL)
        .map_err(|e| SketchError::Compression(e.to_string()))
}

fn decompress(compressed: &[u8]) -> Result<SketchGraph> {
    let json = zstd::decode_all(compressed).map_err(|e| SketchError::Compression(e.to_string()))?;
    let graph: SketchGraph = serde_json::from_slice(&json)?;
    Ok(graph)
}
