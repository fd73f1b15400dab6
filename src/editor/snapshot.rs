//! Editor state and the read-only snapshot published to observers

use serde::Serialize;

use crate::engine::{PlaybackPolicy, SampleBuffer, SelectionRange};

/// Editor-owned state, replaced wholesale on every change
///
/// Playback position and play state live in the scheduler; undo
/// availability lives in the history. [`EditorSnapshot`] joins all three.
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    pub buffer: Option<SampleBuffer>,
    pub file_name: Option<String>,
    pub selection: SelectionRange,
    pub is_recording: bool,
    pub is_loading: bool,
    pub loop_playback: bool,
    pub play_selection_only: bool,
}

impl EditorState {
    pub fn total_duration(&self) -> f64 {
        self.buffer
            .as_ref()
            .map(SampleBuffer::duration_secs)
            .unwrap_or(0.0)
    }

    /// True while a load or recording blocks editing
    pub fn is_busy(&self) -> bool {
        self.is_loading || self.is_recording
    }

    pub fn playback_policy(&self) -> PlaybackPolicy {
        PlaybackPolicy {
            loop_playback: self.loop_playback,
            play_selection_only: self.play_selection_only,
            selection: self.selection,
        }
    }
}

/// What a render collaborator needs to draw the editor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub file_name: Option<String>,
    pub total_duration: f64,
    pub current_position: f64,
    pub is_playing: bool,
    pub is_recording: bool,
    pub is_loading: bool,
    pub selection: SelectionRange,
    pub can_undo: bool,
    pub can_redo: bool,
    pub play_selection_only: bool,
    pub loop_playback: bool,
}
