//! State Management Module
//!
//! Undo/redo history for destructive buffer edits.

pub mod history;

pub use history::{
    EditAction, EditHistory, EditSnapshot, HistoryEntry, HistorySummary, DEFAULT_MAX_UNDO_LEVELS,
};
