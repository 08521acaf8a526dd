//! Undo/redo history of whole-canvas snapshots.
//!
//! Every committed change records the block collection as it was
//! *before* the change. Undo swaps the live collection with the newest
//! snapshot; redo swaps it back.
//!
//! Continuous gestures (drag, resize, a burst of typing) run inside a
//! **session**: the state is captured when the session opens, writes in
//! between are applied live but not recorded, and closing the session
//! records one entry if anything actually changed. Sessions nest; only
//! the outermost one records.

use sc_core::Canvas;
use std::collections::VecDeque;

/// One undo step.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub blocks: Canvas,
    /// Human-readable description of the change (`"Move block"`).
    pub label: String,
}

/// Bounded undo/redo stacks with session grouping.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<HistoryEntry>,
    future: Vec<HistoryEntry>,
    max_depth: usize,
    /// Session nesting depth (0 = recording each change).
    session_depth: usize,
    /// State captured when the outermost session opened.
    session_snapshot: Option<HistoryEntry>,
    /// Whether any write happened during the current session.
    session_dirty: bool,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            past: VecDeque::with_capacity(max_depth.min(64)),
            future: Vec::new(),
            max_depth: max_depth.max(1),
            session_depth: 0,
            session_snapshot: None,
            session_dirty: false,
        }
    }

    /// Record `state` (the collection before a change). Drops the oldest
    /// entry past the depth bound and invalidates redo.
    pub fn push(&mut self, state: Canvas, label: &str) {
        self.past.push_back(HistoryEntry {
            blocks: state,
            label: label.to_string(),
        });
        while self.past.len() > self.max_depth {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Step back. Returns the entry that becomes live; `current` moves to
    /// the redo stack. No-op while a session is open.
    pub fn undo(&mut self, current: &Canvas) -> Option<HistoryEntry> {
        if self.in_session() {
            return None;
        }
        let entry = self.past.pop_back()?;
        self.future.push(HistoryEntry {
            blocks: current.clone(),
            label: entry.label.clone(),
        });
        Some(entry)
    }

    /// Step forward again. Symmetric to `undo`.
    pub fn redo(&mut self, current: &Canvas) -> Option<HistoryEntry> {
        if self.in_session() {
            return None;
        }
        let entry = self.future.pop()?;
        self.past.push_back(HistoryEntry {
            blocks: current.clone(),
            label: entry.label.clone(),
        });
        Some(entry)
    }

    // ─── Sessions ────────────────────────────────────────────────────────

    /// Open a session. The outermost call captures `current`.
    pub fn begin_session(&mut self, current: &Canvas, label: &str) {
        if self.session_depth == 0 {
            self.session_snapshot = Some(HistoryEntry {
                blocks: current.clone(),
                label: label.to_string(),
            });
            self.session_dirty = false;
        }
        self.session_depth += 1;
    }

    /// Note that a live write happened inside the open session.
    pub fn mark_dirty(&mut self) {
        if self.session_depth > 0 {
            self.session_dirty = true;
        }
    }

    /// Close a session. When the outermost one closes and the state
    /// differs from the captured one, a single entry is recorded.
    /// Returns `true` if an entry was pushed.
    pub fn end_session(&mut self, current: &Canvas) -> bool {
        if self.session_depth == 0 {
            return false;
        }
        self.session_depth -= 1;
        if self.session_depth > 0 {
            return false;
        }
        let snapshot = self.session_snapshot.take();
        let dirty = std::mem::take(&mut self.session_dirty);
        match snapshot {
            Some(entry) if dirty && entry.blocks != *current => {
                self.push(entry.blocks, &entry.label);
                true
            }
            _ => false,
        }
    }

    pub fn in_session(&self) -> bool {
        self.session_depth > 0
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.past.len()
    }

    pub fn redo_len(&self) -> usize {
        self.future.len()
    }

    /// Label of the step `undo` would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.past.back().map(|e| e.label.as_str())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.future.last().map(|e| e.label.as_str())
    }

    /// Forget everything (new document loaded).
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.session_depth = 0;
        self.session_snapshot = None;
        self.session_dirty = false;
    }
}
