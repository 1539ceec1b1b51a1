//! Snapshot-based undo/redo
//!
//! Every mutating authoring action first hands a deep copy of the editor
//! state to [`HistoryManager::begin_edit`]. Undo swaps the live state with the
//! most recent snapshot; redo swaps it back.
//!
//! Applying a restored snapshot must not itself create history, so
//! [`HistoryManager::undo`] and [`HistoryManager::redo`] raise a restoring flag
//! that suppresses `begin_edit` until [`HistoryManager::finish_restore`].

use crate::keyframe::{CameraKeyframe, ObjectKeyframe, Selection};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of undo steps kept
pub const DEFAULT_CAPACITY: usize = 50;

/// Immutable copy of everything an undo step restores
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub object_keyframes: Vec<ObjectKeyframe>,
    pub camera_keyframes: Vec<CameraKeyframe>,
    pub duration: f64,
    pub selection: Option<Selection>,
    pub current_time: f64,
}

/// Bounded past/future snapshot stacks
#[derive(Clone, Debug)]
pub struct HistoryManager<S = EditorSnapshot> {
    past: VecDeque<S>,
    future: VecDeque<S>,
    capacity: usize,
    restoring: bool,
}

impl<S> Default for HistoryManager<S> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<S> HistoryManager<S> {
    /// Create a manager keeping at most `capacity` undo steps (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            capacity: capacity.max(1),
            restoring: false,
        }
    }

    /// Record the state before an edit.
    ///
    /// Clears the redo stack. Returns `false` (and records nothing) while a
    /// restore is in progress.
    pub fn begin_edit(&mut self, snapshot: S) -> bool {
        if self.restoring {
            tracing::trace!("begin_edit suppressed during restore");
            return false;
        }
        self.past.push_back(snapshot);
        while self.past.len() > self.capacity {
            self.past.pop_front();
        }
        self.future.clear();
        true
    }

    /// Step back: stores `current` for redo and returns the state to restore.
    ///
    /// The caller applies the returned snapshot and then calls
    /// [`finish_restore`](Self::finish_restore).
    pub fn undo(&mut self, current: S) -> Option<S> {
        let previous = self.past.pop_back()?;
        self.future.push_back(current);
        self.restoring = true;
        tracing::debug!(
            "undo ({} left, {} redoable)",
            self.past.len(),
            self.future.len()
        );
        Some(previous)
    }

    /// Step forward: stores `current` for undo and returns the state to restore
    pub fn redo(&mut self, current: S) -> Option<S> {
        let next = self.future.pop_back()?;
        self.past.push_back(current);
        while self.past.len() > self.capacity {
            self.past.pop_front();
        }
        self.restoring = true;
        tracing::debug!(
            "redo ({} undoable, {} left)",
            self.past.len(),
            self.future.len()
        );
        Some(next)
    }

    /// End the restore started by `undo`/`redo`
    pub fn finish_restore(&mut self) {
        self.restoring = false;
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
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

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all history (new document loaded)
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.restoring = false;
    }
}
