//! Undo/redo history as a reducer over document snapshots.
//!
//! Every document mutation goes through [`HistoryStore::dispatch`]; nothing
//! else holds a writable reference to the present document.

use crate::document::{CanvasDocument, DocumentPatch};

/// Past, present and future documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryState {
    /// Older snapshots; the last entry is the next undo target.
    pub past: Vec<CanvasDocument>,
    pub present: CanvasDocument,
    /// Undone snapshots; the last entry is the next redo target.
    pub future: Vec<CanvasDocument>,
    /// Maximum length of `past`, `None` for unbounded.
    pub limit: Option<usize>,
}

/// Actions understood by [`reduce`].
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryAction {
    /// Merge a partial document into the present.
    SetState {
        patch: DocumentPatch,
        /// `false` replaces the present in place without an undo point.
        with_history: bool,
    },
    Undo,
    Redo,
    /// Start over from the given document with empty history.
    Reset(CanvasDocument),
}

impl HistoryState {
    pub fn new(present: CanvasDocument, limit: Option<usize>) -> Self {
        Self {
            past: Vec::new(),
            present,
            future: Vec::new(),
            limit,
        }
    }

    /// Apply an action in place. Returns whether anything changed.
    fn apply(&mut self, action: HistoryAction) -> bool {
        match action {
            HistoryAction::SetState { patch, with_history } => {
                let merged = patch.merged_with(&self.present);
                if merged == self.present {
                    return false;
                }
                if with_history {
                    let previous = std::mem::replace(&mut self.present, merged);
                    self.past.push(previous);
                    self.future.clear();
                    self.enforce_limit();
                } else {
                    self.present = merged;
                }
                true
            }
            HistoryAction::Undo => match self.past.pop() {
                Some(previous) => {
                    let current = std::mem::replace(&mut self.present, previous);
                    self.future.push(current);
                    true
                }
                None => false,
            },
            HistoryAction::Redo => match self.future.pop() {
                Some(next) => {
                    let current = std::mem::replace(&mut self.present, next);
                    self.past.push(current);
                    true
                }
                None => false,
            },
            HistoryAction::Reset(document) => {
                let changed =
                    !self.past.is_empty() || !self.future.is_empty() || self.present != document;
                self.past.clear();
                self.future.clear();
                self.present = document;
                changed
            }
        }
    }

    fn enforce_limit(&mut self) {
        if let Some(limit) = self.limit {
            if self.past.len() > limit {
                let excess = self.past.len() - limit;
                self.past.drain(..excess);
            }
        }
    }
}

/// Pure reducer: produce the next history state for `action`.
pub fn reduce(state: HistoryState, action: HistoryAction) -> HistoryState {
    let mut next = state;
    next.apply(action);
    next
}

/// Sole owner of the [`HistoryState`].
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    state: HistoryState,
}

impl HistoryStore {
    pub fn new(document: CanvasDocument, limit: Option<usize>) -> Self {
        Self {
            state: HistoryState::new(document, limit),
        }
    }

    /// Run an action through the reducer. Returns true if the state changed.
    pub fn dispatch(&mut self, action: HistoryAction) -> bool {
        let label = match &action {
            HistoryAction::SetState { with_history: true, .. } => "set_state",
            HistoryAction::SetState { with_history: false, .. } => "set_state (exempt)",
            HistoryAction::Undo => "undo",
            HistoryAction::Redo => "redo",
            HistoryAction::Reset(_) => "reset",
        };
        let changed = self.state.apply(action);
        log::debug!(
            "history {label}: changed={changed} past={} future={}",
            self.state.past.len(),
            self.state.future.len()
        );
        changed
    }

    pub fn present(&self) -> &CanvasDocument {
        &self.state.present
    }

    pub fn state(&self) -> &HistoryState {
        &self.state
    }

    pub fn can_undo(&self) -> bool {
        !self.state.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.state.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.state.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.state.future.len()
    }
}
