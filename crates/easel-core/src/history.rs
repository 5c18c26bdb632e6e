//! Bounded undo history of full document snapshots.

use crate::document::Document;
use crate::shapes::Shape;
use std::collections::VecDeque;

/// Maximum retained snapshots; the oldest is evicted first.
pub const HISTORY_CAP: usize = 80;

/// One undo point: a structural clone of the raster bytes and shape list.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub shapes: Vec<Shape>,
}

impl HistoryEntry {
    /// Capture the document as it is right now.
    pub fn capture(doc: &Document) -> Self {
        Self {
            width: doc.width(),
            height: doc.height(),
            pixels: doc.raster().data().to_vec(),
            shapes: doc.shapes().to_vec(),
        }
    }
}

/// FIFO-evicting snapshot stack.
#[derive(Debug)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    cap: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_cap(HISTORY_CAP)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self { entries: VecDeque::with_capacity(cap.min(HISTORY_CAP)), cap }
    }

    /// Push a snapshot, evicting the oldest entry at capacity.
    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() >= self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Pop the most recent snapshot.
    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
