//! Edit History
//!
//! Bounded undo/redo over destructive edits. Each entry keeps the buffer and
//! selection from before and after the edit; buffers are shared, so a
//! snapshot costs one reference count.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use uuid::Uuid;

use crate::engine::{SampleBuffer, SelectionRange};
use crate::error::{Result, WaveditError};

/// Default maximum number of undo levels to keep
pub const DEFAULT_MAX_UNDO_LEVELS: usize = 50;

/// Kinds of edits that can be undone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditAction {
    Cut,
    Paste,
    Delete,
}

impl std::fmt::Display for EditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditAction::Cut => write!(f, "Cut"),
            EditAction::Paste => write!(f, "Paste"),
            EditAction::Delete => write!(f, "Delete"),
        }
    }
}

/// Editable state captured around an edit
#[derive(Debug, Clone, PartialEq)]
pub struct EditSnapshot {
    pub buffer: SampleBuffer,
    pub selection: SelectionRange,
}

/// A single undoable edit
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub action: EditAction,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub before: EditSnapshot,
    pub after: EditSnapshot,
}

impl HistoryEntry {
    pub fn new(
        action: EditAction,
        description: impl Into<String>,
        before: EditSnapshot,
        after: EditSnapshot,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            description: description.into(),
            timestamp: Utc::now(),
            before,
            after,
        }
    }
}

/// Serializable view of a history entry, without its buffers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub id: Uuid,
    pub action: EditAction,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&HistoryEntry> for HistorySummary {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.id,
            action: entry.action,
            description: entry.description.clone(),
            timestamp: entry.timestamp,
        }
    }
}

/// Undo and redo stacks for the editor's live buffer
#[derive(Debug, Clone)]
pub struct EditHistory {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_undo_levels: usize,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO_LEVELS)
    }
}

impl EditHistory {
    pub fn new(max_levels: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_undo_levels: max_levels,
        }
    }

    /// Record a new edit
    ///
    /// Clears the redo stack and drops the oldest entries beyond
    /// `max_undo_levels`. With zero levels nothing is recorded.
    pub fn push(&mut self, entry: HistoryEntry) {
        debug!("[HISTORY] Push {} ({})", entry.action, entry.id);
        self.redo_stack.clear();
        self.undo_stack.push_back(entry);
        self.trim_history();
    }

    /// Pop the most recent edit; the caller restores `entry.before`
    pub fn undo(&mut self) -> Result<HistoryEntry> {
        let entry = self
            .undo_stack
            .pop_back()
            .ok_or(WaveditError::NothingToUndo)?;
        debug!("[HISTORY] Undo {} ({})", entry.action, entry.id);
        self.redo_stack.push(entry.clone());
        Ok(entry)
    }

    /// Re-apply the most recently undone edit; the caller restores `entry.after`
    pub fn redo(&mut self) -> Result<HistoryEntry> {
        let entry = self.redo_stack.pop().ok_or(WaveditError::NothingToRedo)?;
        debug!("[HISTORY] Redo {} ({})", entry.action, entry.id);
        self.undo_stack.push_back(entry.clone());
        self.trim_history();
        Ok(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn peek_undo(&self) -> Option<&HistoryEntry> {
        self.undo_stack.back()
    }

    pub fn peek_redo(&self) -> Option<&HistoryEntry> {
        self.redo_stack.last()
    }

    pub fn max_undo_levels(&self) -> usize {
        self.max_undo_levels
    }

    /// Change the level limit, trimming immediately if needed
    pub fn set_max_undo_levels(&mut self, max_levels: usize) {
        self.max_undo_levels = max_levels;
        self.trim_history();
    }

    /// Drop the oldest entries beyond the level limit
    pub fn trim_history(&mut self) {
        while self.undo_stack.len() > self.max_undo_levels {
            if let Some(dropped) = self.undo_stack.pop_front() {
                debug!("[HISTORY] Discarding {} ({})", dropped.action, dropped.id);
            }
        }
    }

    /// Forget everything, e.g. after a new buffer is loaded
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Descriptions of undoable edits, most recent first
    pub fn undo_summary(&self) -> Vec<HistorySummary> {
        self.undo_stack
            .iter()
            .rev()
            .map(HistorySummary::from)
            .collect()
    }
}
