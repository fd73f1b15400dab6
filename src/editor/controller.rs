//! Editor Controller
//!
//! Sole mutator of editor state. Every command that changes state builds the
//! next [`EditorState`], then commits it in a fixed order:
//!
//! 1. peaks are regenerated if the buffer identity changed (`PeaksChanged`)
//! 2. the playback policy is applied, restarting generation if a loop or
//!    selection-only flag changed while playing
//! 3. observers receive the new snapshot (`StateChanged`)
//!
//! Discrete notifications (`PlayStateChanged`, `SelectionChanged`, ...)
//! follow the snapshot. Rejected commands return `false` and leave state
//! untouched.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};

use crate::config::EditorConfig;
use crate::editor::events::{EditorEvent, EditorObserver, ObserverId, ObserverRegistry};
use crate::editor::snapshot::{EditorSnapshot, EditorState};
use crate::editor::source::{AudioSource, CaptureDevice, Decoder, LoadTicket};
use crate::engine::edit;
use crate::engine::{
    EngineClock, GenerationId, OutputDevice, PeakRefresher, PeakSummary, PlaybackScheduler,
    PlaybackState, SampleBuffer, SelectionRange,
};
use crate::error::{Result, WaveditError};
use crate::state::{EditAction, EditHistory, EditSnapshot, HistoryEntry};

/// File name given to buffers produced by a recording
pub const RECORDING_NAME: &str = "Recording";

/// Observable values compared before and after a command
struct Observed {
    is_playing: bool,
    selection: SelectionRange,
}

pub struct EditorController {
    config: EditorConfig,
    state: EditorState,
    scheduler: PlaybackScheduler,
    history: EditHistory,
    peaks: PeakRefresher,
    clipboard: Option<SampleBuffer>,
    observers: ObserverRegistry,
    pending_load: Option<(LoadTicket, String)>,
    next_ticket: u64,
    last_reported_position: f64,
}

impl EditorController {
    pub fn new(
        config: EditorConfig,
        clock: Box<dyn EngineClock>,
        output: Box<dyn OutputDevice>,
    ) -> Self {
        Self {
            state: EditorState::default(),
            scheduler: PlaybackScheduler::new(clock, output),
            history: EditHistory::new(config.max_undo_levels),
            peaks: PeakRefresher::new(config.display_width, config.peak_debounce()),
            clipboard: None,
            observers: ObserverRegistry::new(),
            pending_load: None,
            next_ticket: 0,
            last_reported_position: 0.0,
            config,
        }
    }

    // ========================================================================
    // Observers & Queries
    // ========================================================================

    pub fn subscribe<O>(&mut self, observer: O) -> ObserverId
    where
        O: EditorObserver + 'static,
    {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Current snapshot, with the position read from the engine clock
    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            file_name: self.state.file_name.clone(),
            total_duration: self.state.total_duration(),
            current_position: self.scheduler.position(),
            is_playing: self.scheduler.is_playing(),
            is_recording: self.state.is_recording,
            is_loading: self.state.is_loading,
            selection: self.state.selection,
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            play_selection_only: self.state.play_selection_only,
            loop_playback: self.state.loop_playback,
        }
    }

    pub fn peaks(&self) -> Option<Arc<PeakSummary>> {
        self.peaks.summary().cloned()
    }

    pub fn clipboard(&self) -> Option<&SampleBuffer> {
        self.clipboard.as_ref()
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // ========================================================================
    // Loading & Recording
    // ========================================================================

    /// Install an already decoded buffer
    pub fn load_buffer(&mut self, name: impl Into<String>, buffer: SampleBuffer) -> bool {
        match self.begin_load(name) {
            Some(ticket) => self.finish_load(ticket, Ok(buffer)),
            None => false,
        }
    }

    /// Load from any [`AudioSource`], awaiting the decoder for encoded data
    pub async fn load_audio<D: Decoder>(&mut self, source: AudioSource, decoder: &D) -> bool {
        debug!("Load requested for {}", source.name());
        match source {
            AudioSource::Decoded { name, buffer } => self.load_buffer(name, buffer),
            AudioSource::Encoded { name, bytes } => {
                let ticket = match self.begin_load(name) {
                    Some(ticket) => ticket,
                    None => return false,
                };
                let result = decoder.decode(&bytes).await;
                self.finish_load(ticket, result)
            }
            AudioSource::Remote { url } => {
                self.report(&WaveditError::UnsupportedSource {
                    description: format!("remote source {}", url),
                });
                false
            }
        }
    }

    /// Mark a load as in flight
    ///
    /// Stops playback and sets the loading flag. A later `begin_load`
    /// supersedes this one; its ticket then goes stale.
    pub fn begin_load(&mut self, name: impl Into<String>) -> Option<LoadTicket> {
        if self.state.is_recording {
            warn!("Load rejected while recording");
            return None;
        }
        let name = name.into();
        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        info!("Loading {}", name);
        self.pending_load = Some((ticket, name));

        let before = self.observe();
        self.scheduler.stop(false);
        let mut next = self.state.clone();
        next.is_loading = true;
        self.commit(next);
        self.emit_changes(before);
        Some(ticket)
    }

    /// Complete a load started with [`EditorController::begin_load`]
    ///
    /// Stale tickets are ignored. On failure the editor reverts to having no
    /// buffer and an `Error` event is emitted.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<SampleBuffer>) -> bool {
        let name = match self.pending_load.take() {
            Some((pending, name)) if pending == ticket => name,
            other => {
                debug!("Ignoring stale load completion {:?}", ticket);
                self.pending_load = other;
                return false;
            }
        };

        let result = result.and_then(|buffer| {
            if buffer.is_finite() {
                Ok(buffer)
            } else {
                Err(WaveditError::Decode {
                    reason: "decoded audio contains non-finite samples".to_string(),
                    source: None,
                })
            }
        });
        match result {
            Ok(buffer) => {
                self.install_buffer(name, buffer);
                true
            }
            Err(err) => {
                let before = self.observe();
                self.history.clear();
                self.scheduler.replace_buffer(None, 0.0);
                let mut next = self.state.clone();
                next.buffer = None;
                next.file_name = None;
                next.selection = SelectionRange::cleared();
                next.is_loading = false;
                self.commit(next);
                self.emit_changes(before);
                self.emit_position_if_changed(0.0);
                self.report(&err);
                false
            }
        }
    }

    /// Start capturing; stops playback and clears selection and position
    pub fn start_recording<C: CaptureDevice>(&mut self, capture: &mut C) -> bool {
        if self.state.is_busy() {
            warn!("Recording rejected while loading or recording");
            return false;
        }
        if let Err(err) = capture.start_capture() {
            self.report(&err);
            return false;
        }

        let before = self.observe();
        self.scheduler.stop(true);
        let mut next = self.state.clone();
        next.is_recording = true;
        next.selection = SelectionRange::cleared();
        self.commit(next);
        info!("Recording started");
        self.emit(EditorEvent::RecordingStateChanged { is_recording: true });
        self.emit_changes(before);
        self.emit_position_if_changed(0.0);
        true
    }

    /// Stop capturing and install the recorded buffer, if any
    pub async fn stop_recording<C: CaptureDevice>(&mut self, capture: &mut C) -> bool {
        if !self.state.is_recording {
            return false;
        }
        let mut next = self.state.clone();
        next.is_loading = true;
        self.commit(next);

        let result = capture.stop_capture().await;
        match result {
            Ok(Some(buffer)) => {
                info!("Recording finished ({:.3}s)", buffer.duration_secs());
                self.install_buffer(RECORDING_NAME.to_string(), buffer);
                self.emit(EditorEvent::RecordingStateChanged {
                    is_recording: false,
                });
            }
            Ok(None) => {
                info!("Recording finished without audio");
                self.end_recording();
            }
            Err(err) => {
                self.end_recording();
                self.report(&err);
            }
        }
        true
    }

    fn end_recording(&mut self) {
        let mut next = self.state.clone();
        next.is_recording = false;
        next.is_loading = false;
        self.commit(next);
        self.emit(EditorEvent::RecordingStateChanged {
            is_recording: false,
        });
    }

    fn install_buffer(&mut self, name: String, buffer: SampleBuffer) {
        let before = self.observe();
        let duration = buffer.duration_secs();
        self.history.clear();
        self.scheduler.replace_buffer(Some(buffer.clone()), 0.0);

        let mut next = self.state.clone();
        next.buffer = Some(buffer);
        next.file_name = Some(name.clone());
        next.selection = SelectionRange::cleared();
        next.is_loading = false;
        next.is_recording = false;
        self.commit(next);

        info!("Loaded {} ({:.3}s)", name, duration);
        self.emit(EditorEvent::AudioLoaded {
            file_name: name,
            duration,
        });
        self.emit_changes(before);
        self.emit_position_if_changed(0.0);
    }

    // ========================================================================
    // Selection & Position
    // ========================================================================

    /// Store a raw selection from gesture handling
    ///
    /// Reversed ends are swapped and both ends are clamped to the buffer.
    pub fn set_selection(&mut self, start: Option<f64>, end: Option<f64>) -> bool {
        if self.state.is_recording || self.state.buffer.is_none() {
            warn!("Selection rejected: no editable audio");
            return false;
        }
        let raw = SelectionRange {
            start: start.filter(|t| t.is_finite()),
            end: end.filter(|t| t.is_finite()),
        };
        let selection = raw.clamped(self.state.total_duration());
        if selection == self.state.selection {
            return false;
        }

        let mut next = self.state.clone();
        next.selection = selection;
        self.commit(next);
        self.emit(EditorEvent::SelectionChanged {
            start: selection.start,
            end: selection.end,
        });
        true
    }

    pub fn clear_selection(&mut self) -> bool {
        self.set_selection(None, None)
    }

    /// Move the playhead; restarts generation if playing
    pub fn seek(&mut self, position: f64) -> bool {
        if self.state.buffer.is_none() || self.state.is_busy() || !position.is_finite() {
            warn!("Seek to {} rejected", position);
            return false;
        }
        let position = self.scheduler.seek(position);
        self.notify_state();
        self.emit_position(position);
        true
    }

    /// Read the current position, reporting changes to observers
    ///
    /// Emits `PositionChanged` when the position moved by at least the
    /// configured epsilon since the last report, and ends playback if a
    /// non-looping generation has run past its end.
    pub fn poll_position(&mut self) -> f64 {
        if let Some(terminal) = self.scheduler.check_natural_end() {
            self.playback_ended(terminal);
            return terminal;
        }
        let position = self.scheduler.position();
        let delta = (position - self.last_reported_position).abs();
        if delta > 0.0 && delta >= self.config.position_epsilon_secs {
            self.emit_position(position);
        }
        position
    }

    // ========================================================================
    // Transport
    // ========================================================================

    pub fn play(&mut self) -> bool {
        if self.state.is_busy() {
            warn!("Play rejected while loading or recording");
            return false;
        }
        if self.scheduler.is_playing() {
            return false;
        }
        if let Err(err) = self.scheduler.play() {
            warn!("Play rejected: {}", err);
            return false;
        }
        self.notify_state();
        self.emit(EditorEvent::PlayStateChanged { is_playing: true });
        let position = self.scheduler.position();
        self.emit_position_if_changed(position);
        true
    }

    pub fn pause(&mut self) -> bool {
        if !self.scheduler.is_playing() {
            return false;
        }
        let position = self.scheduler.pause();
        self.notify_state();
        self.emit(EditorEvent::PlayStateChanged { is_playing: false });
        self.emit_position_if_changed(position);
        true
    }

    pub fn toggle_play_pause(&mut self) -> bool {
        if self.scheduler.is_playing() {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Stop playback, optionally returning the playhead to 0
    pub fn stop(&mut self, reset_position: bool) -> bool {
        let already_stopped = self.scheduler.state() == PlaybackState::Stopped;
        if already_stopped && (!reset_position || self.scheduler.position() == 0.0) {
            return false;
        }
        let before = self.observe();
        let position = self.scheduler.stop(reset_position);
        self.notify_state();
        self.emit_changes(before);
        self.emit_position_if_changed(position);
        true
    }

    /// Completion report from the output device
    ///
    /// Reports for generations that are no longer active are ignored.
    pub fn on_generation_ended(&mut self, id: GenerationId) -> bool {
        match self.scheduler.handle_generation_ended(id) {
            Some(terminal) => {
                self.playback_ended(terminal);
                true
            }
            None => false,
        }
    }

    fn playback_ended(&mut self, terminal: f64) {
        debug!("Playback ended at {:.3}s", terminal);
        self.notify_state();
        self.emit(EditorEvent::PlayStateChanged { is_playing: false });
        self.emit_position(terminal);
    }

    pub fn set_loop_playback(&mut self, enabled: bool) -> bool {
        if self.state.loop_playback == enabled {
            return false;
        }
        let mut next = self.state.clone();
        next.loop_playback = enabled;
        self.commit(next);
        true
    }

    pub fn set_play_selection_only(&mut self, enabled: bool) -> bool {
        if self.state.play_selection_only == enabled {
            return false;
        }
        let mut next = self.state.clone();
        next.play_selection_only = enabled;
        self.commit(next);
        true
    }

    // ========================================================================
    // Editing & History
    // ========================================================================

    /// Copy the selection to the clipboard
    pub fn copy(&mut self) -> bool {
        let buffer = match self.editable_buffer("Copy") {
            Some(buffer) => buffer,
            None => return false,
        };
        match edit::copy(&buffer, &self.state.selection) {
            Ok(clip) => {
                debug!("Copied {:.3}s to clipboard", clip.duration_secs());
                self.clipboard = Some(clip);
                true
            }
            Err(err) => {
                reject("Copy", &err);
                false
            }
        }
    }

    /// Move the selection to the clipboard
    pub fn cut(&mut self) -> bool {
        let buffer = match self.editable_buffer("Cut") {
            Some(buffer) => buffer,
            None => return false,
        };
        match edit::cut(&buffer, &self.state.selection) {
            Ok((remainder, extracted)) => {
                self.clipboard = Some(extracted);
                self.apply_edit(EditAction::Cut, remainder);
                true
            }
            Err(err) => {
                reject("Cut", &err);
                false
            }
        }
    }

    /// Insert the clipboard at the selection start, or at the playhead
    pub fn paste(&mut self) -> bool {
        let buffer = match self.editable_buffer("Paste") {
            Some(buffer) => buffer,
            None => return false,
        };
        let clip = match &self.clipboard {
            Some(clip) => clip.clone(),
            None => {
                warn!("Paste rejected: clipboard is empty");
                return false;
            }
        };
        let position = self
            .state
            .selection
            .start
            .unwrap_or_else(|| self.scheduler.position());
        match edit::paste(&buffer, &clip, position) {
            Ok(result) => {
                self.apply_edit(EditAction::Paste, result);
                true
            }
            Err(err) => {
                reject("Paste", &err);
                false
            }
        }
    }

    /// Remove the selection without touching the clipboard
    pub fn delete_selection(&mut self) -> bool {
        let buffer = match self.editable_buffer("Delete") {
            Some(buffer) => buffer,
            None => return false,
        };
        match edit::delete(&buffer, &self.state.selection) {
            Ok(result) => {
                self.apply_edit(EditAction::Delete, result);
                true
            }
            Err(err) => {
                reject("Delete", &err);
                false
            }
        }
    }

    pub fn undo(&mut self) -> bool {
        if self.state.is_busy() {
            warn!("Undo rejected while loading or recording");
            return false;
        }
        match self.history.undo() {
            Ok(entry) => {
                info!("Undo: {}", entry.description);
                self.restore(entry.before);
                true
            }
            Err(err) => {
                debug!("{}", err);
                false
            }
        }
    }

    pub fn redo(&mut self) -> bool {
        if self.state.is_busy() {
            warn!("Redo rejected while loading or recording");
            return false;
        }
        match self.history.redo() {
            Ok(entry) => {
                info!("Redo: {}", entry.description);
                self.restore(entry.after);
                true
            }
            Err(err) => {
                debug!("{}", err);
                false
            }
        }
    }

    fn editable_buffer(&self, command: &str) -> Option<SampleBuffer> {
        if self.state.is_busy() {
            warn!("{} rejected while loading or recording", command);
            return None;
        }
        if self.state.buffer.is_none() {
            warn!("{} rejected: no audio loaded", command);
        }
        self.state.buffer.clone()
    }

    fn apply_edit(&mut self, action: EditAction, buffer: SampleBuffer) {
        let previous = match &self.state.buffer {
            Some(previous) => previous.clone(),
            None => return,
        };
        let before = EditSnapshot {
            buffer: previous,
            selection: self.state.selection,
        };
        let after = EditSnapshot {
            buffer,
            selection: SelectionRange::cleared(),
        };
        let description = format!(
            "{} ({:.3}s -> {:.3}s)",
            action,
            before.buffer.duration_secs(),
            after.buffer.duration_secs()
        );
        info!("{}", description);
        let entry = HistoryEntry::new(action, description, before, after.clone());
        self.history.push(entry);
        self.restore(after);
    }

    /// Install a buffer and selection, keeping the playhead clamped
    fn restore(&mut self, snapshot: EditSnapshot) {
        let before = self.observe();
        let position = self.scheduler.position();
        self.scheduler
            .replace_buffer(Some(snapshot.buffer.clone()), position);

        let mut next = self.state.clone();
        next.buffer = Some(snapshot.buffer);
        next.selection = snapshot.selection;
        self.commit(next);
        self.emit_changes(before);
        let position = self.scheduler.position();
        self.emit_position_if_changed(position);
    }

    // ========================================================================
    // Peaks & Lifecycle
    // ========================================================================

    /// Request a new peak width; applied after the debounce window
    pub fn set_display_width(&mut self, width: usize) {
        self.set_display_width_at(width, Instant::now());
    }

    pub fn set_display_width_at(&mut self, width: usize, now: Instant) {
        self.peaks.request_width(width, now);
    }

    /// Apply a debounced width change; returns true if peaks were regenerated
    pub fn poll_peaks(&mut self) -> bool {
        self.poll_peaks_at(Instant::now())
    }

    pub fn poll_peaks_at(&mut self, now: Instant) -> bool {
        match self.peaks.poll(self.state.buffer.as_ref(), now) {
            Some(summary) => {
                self.emit(EditorEvent::PeaksChanged(summary));
                true
            }
            None => false,
        }
    }

    /// Stop playback, drop clipboard and history, and detach observers
    pub fn shutdown(&mut self) {
        let before = self.observe();
        self.scheduler.stop(false);
        self.emit_changes(before);
        self.clipboard = None;
        self.history.clear();
        self.pending_load = None;
        self.observers.clear();
        info!("Editor shut down");
    }

    // ========================================================================
    // Commit & Notification
    // ========================================================================

    fn commit(&mut self, next: EditorState) {
        let identity_changed = match (&self.state.buffer, &next.buffer) {
            (Some(old), Some(new)) => !old.same_buffer(new),
            (None, None) => false,
            _ => true,
        };
        self.state = next;

        if identity_changed {
            let summary = self
                .peaks
                .buffer_changed(self.state.buffer.as_ref())
                .unwrap_or_else(|| Arc::new(PeakSummary::empty()));
            self.emit(EditorEvent::PeaksChanged(summary));
        }

        self.scheduler.set_policy(self.state.playback_policy());

        let snapshot = self.snapshot();
        self.emit(EditorEvent::StateChanged(snapshot));
    }

    fn notify_state(&mut self) {
        let state = self.state.clone();
        self.commit(state);
    }

    fn observe(&self) -> Observed {
        Observed {
            is_playing: self.scheduler.is_playing(),
            selection: self.state.selection,
        }
    }

    fn emit_changes(&mut self, before: Observed) {
        let is_playing = self.scheduler.is_playing();
        if is_playing != before.is_playing {
            self.emit(EditorEvent::PlayStateChanged { is_playing });
        }
        let selection = self.state.selection;
        if selection != before.selection {
            self.emit(EditorEvent::SelectionChanged {
                start: selection.start,
                end: selection.end,
            });
        }
    }

    fn emit_position(&mut self, position: f64) {
        self.last_reported_position = position;
        self.emit(EditorEvent::PositionChanged { position });
    }

    fn emit_position_if_changed(&mut self, position: f64) {
        if position != self.last_reported_position {
            self.emit_position(position);
        }
    }

    fn emit(&mut self, event: EditorEvent) {
        self.observers.emit(&event);
    }

    fn report(&mut self, err: &WaveditError) {
        error!("{} [{}]", err, err.error_code());
        self.emit(EditorEvent::Error {
            message: err.to_string(),
        });
    }
}

fn reject(command: &str, err: &WaveditError) {
    if err.is_edit_precondition() {
        warn!("{} rejected: {} [{}]", command, err, err.error_code());
    } else {
        error!("{} failed: {} [{}]", command, err, err.error_code());
    }
}
