//! Undo/redo history.
//!
//! The stack keeps full `(Document, Selection)` snapshots rather than
//! inverse deltas: documents are small block lists and cloning them is a
//! handful of allocations, which buys an undo implementation that cannot
//! drift out of sync with the mutation code.

use crate::editing::{commands::ChangeLabel, document::Document, selection::Selection};

/// Entries kept before the oldest undo step is dropped.
pub const DEFAULT_CAPACITY: usize = 100;

/// Snapshot of the state a committed change replaced, tagged with that
/// change's label.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub document: Document,
    pub selection: Selection,
    pub label: ChangeLabel,
}

/// Two-sided undo/redo log.
///
/// `record` pushes onto `past` and discards `future`; `undo`/`redo`
/// traverse between them, threading the caller's current state through.
///
/// Coalescing rule: an unbroken run of `insert-characters` records keeps
/// only the run's first entry, so one undo step reverts a typed burst
/// instead of one keystroke. Any other label, an undo/redo traversal, or
/// an explicit [`HistoryStack::break_burst`] (caret movement) ends the run.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    past: Vec<HistoryEntry>,
    future: Vec<HistoryEntry>,
    capacity: usize,
    coalescing: bool,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
            capacity,
            coalescing: false,
        }
    }

    /// Record the state a committed change replaced. Clears the redo
    /// future; consecutive plain insertions coalesce into one step.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.future.clear();
        let coalesce = self.coalescing
            && entry.label == ChangeLabel::InsertCharacters
            && self
                .past
                .last()
                .is_some_and(|last| last.label == ChangeLabel::InsertCharacters);
        self.coalescing = entry.label == ChangeLabel::InsertCharacters;
        if coalesce {
            return;
        }
        self.past.push(entry);
        if self.past.len() > self.capacity {
            self.past.remove(0);
        }
    }

    /// End the current insertion burst so the next insertion starts a new
    /// undo step.
    pub fn break_burst(&mut self) {
        self.coalescing = false;
    }

    /// Pop the most recent past state, stashing `current` for redo.
    /// Returns `None` (no state change) when there is nothing to undo.
    pub fn undo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let entry = self.past.pop()?;
        self.future.push(current);
        self.coalescing = false;
        Some(entry)
    }

    /// Mirror of [`HistoryStack::undo`].
    pub fn redo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let entry = self.future.pop()?;
        self.past.push(current);
        self.coalescing = false;
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of undo steps currently available.
    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }
}
