//! Playback Scheduler
//!
//! Maps an engine clock to a logical playback position under loop and
//! selection-restricted playback, and drives an [`OutputDevice`].
//!
//! While playing, the position is never stored; it is derived on demand:
//!
//! ```text
//! raw      = start_offset + (clock.now() - origin_engine_time)
//! position = wrap(raw) into the loop region when looping, then clamp to [0, total]
//! ```

use std::fmt;

use log::{debug, warn};

use crate::engine::buffer::SampleBuffer;
use crate::engine::clock::{EngineClock, GenerationId, GenerationRequest, OutputDevice};
use crate::engine::selection::SelectionRange;
use crate::error::{Result, WaveditError};

/// Playback states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Not generating; position is the stored offset (default)
    #[default]
    Stopped,
    /// Generating audio; position follows the engine clock
    Playing,
    /// Generation halted with the position kept for resume
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Stopped => write!(f, "Stopped"),
            PlaybackState::Playing => write!(f, "Playing"),
            PlaybackState::Paused => write!(f, "Paused"),
        }
    }
}

/// Loop and selection settings applied when generation starts
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackPolicy {
    pub loop_playback: bool,
    pub play_selection_only: bool,
    pub selection: SelectionRange,
}

impl PlaybackPolicy {
    /// Selection bounds that restrict playback, if any
    ///
    /// Only applies with `play_selection_only` and a selection that still has
    /// non-zero length after clamping to `[0, total]`.
    pub fn restricted_range(&self, total: f64) -> Option<(f64, f64)> {
        if !self.play_selection_only {
            return None;
        }
        self.selection.clamped(total).effective()
    }
}

/// One running generation as the scheduler sees it
#[derive(Debug, Clone, Copy)]
struct ActiveGeneration {
    id: GenerationId,
    loop_region: Option<(f64, f64)>,
    /// Where a non-looping generation ends
    end: f64,
}

/// Tracks playback position against the engine clock
///
/// The scheduler exclusively owns `start_offset` and `origin_engine_time`.
/// Each start of generation gets a fresh [`GenerationId`]; completion
/// reports for any other id are stale and ignored.
///
/// # Example
/// ```
/// use wavedit::engine::{ManualClock, NullOutput, PlaybackScheduler, SampleBuffer};
///
/// let clock = ManualClock::new();
/// let mut scheduler = PlaybackScheduler::new(Box::new(clock.clone()), Box::new(NullOutput));
/// scheduler.replace_buffer(Some(SampleBuffer::silence(1, 100, 10).unwrap()), 0.0);
///
/// scheduler.seek(4.0);
/// scheduler.play().unwrap();
/// clock.advance(1.5);
/// assert!((scheduler.position() - 5.5).abs() < 1e-9);
/// ```
pub struct PlaybackScheduler {
    clock: Box<dyn EngineClock>,
    output: Box<dyn OutputDevice>,
    state: PlaybackState,
    buffer: Option<SampleBuffer>,
    policy: PlaybackPolicy,
    /// Buffer position generation started (or will start) from
    start_offset: f64,
    /// Engine time at which the current generation started
    origin_engine_time: f64,
    active: Option<ActiveGeneration>,
    next_generation: u64,
}

impl PlaybackScheduler {
    pub fn new(clock: Box<dyn EngineClock>, output: Box<dyn OutputDevice>) -> Self {
        Self {
            clock,
            output,
            state: PlaybackState::Stopped,
            buffer: None,
            policy: PlaybackPolicy::default(),
            start_offset: 0.0,
            origin_engine_time: 0.0,
            active: None,
            next_generation: 1,
        }
    }

    // ========================================================================
    // Buffer & Policy
    // ========================================================================

    /// Reset onto a new buffer (or none), stopped at `position`
    ///
    /// Any running generation is halted and its completion report becomes
    /// stale.
    pub fn replace_buffer(&mut self, buffer: Option<SampleBuffer>, position: f64) {
        self.halt();
        self.state = PlaybackState::Stopped;
        self.buffer = buffer;
        let position = if position.is_finite() { position } else { 0.0 };
        self.start_offset = position.clamp(0.0, self.total_duration());
        debug!(
            "[TRANSPORT] Buffer replaced ({:.3}s), positioned at {:.3}s",
            self.total_duration(),
            self.start_offset
        );
    }

    /// Apply new loop/selection settings
    ///
    /// A change to either flag while playing restarts generation from the
    /// current position under the new policy. A selection change alone takes
    /// effect at the next start of generation.
    pub fn set_policy(&mut self, policy: PlaybackPolicy) {
        if self.policy == policy {
            return;
        }
        let flags_changed = self.policy.loop_playback != policy.loop_playback
            || self.policy.play_selection_only != policy.play_selection_only;
        if flags_changed && self.state == PlaybackState::Playing {
            let position = self.position();
            self.halt();
            self.start_offset = position;
            self.policy = policy;
            self.start_generation();
            debug!("[TRANSPORT] Policy changed, restarted at {:.3}s", position);
        } else {
            self.policy = policy;
        }
    }

    pub fn policy(&self) -> &PlaybackPolicy {
        &self.policy
    }

    pub fn buffer(&self) -> Option<&SampleBuffer> {
        self.buffer.as_ref()
    }

    /// Duration of the loaded buffer, 0 when none
    pub fn total_duration(&self) -> f64 {
        self.buffer
            .as_ref()
            .map(SampleBuffer::duration_secs)
            .unwrap_or(0.0)
    }

    // ========================================================================
    // Transport Controls
    // ========================================================================

    /// Start or resume generation from the stored offset
    ///
    /// State transition: Stopped | Paused -> Playing. A no-op while playing.
    pub fn play(&mut self) -> Result<()> {
        if self.buffer.is_none() {
            return Err(WaveditError::NoBufferLoaded);
        }
        if self.state == PlaybackState::Playing {
            debug!("[TRANSPORT] Already playing");
            return Ok(());
        }
        self.start_generation();
        self.state = PlaybackState::Playing;
        debug!("[TRANSPORT] Play from {:.3}s", self.start_offset);
        Ok(())
    }

    /// Halt generation and keep the position for resume
    ///
    /// State transition: Playing -> Paused. Returns the paused position.
    pub fn pause(&mut self) -> f64 {
        if self.state == PlaybackState::Playing {
            let position = self.position();
            self.halt();
            self.start_offset = position;
            self.state = PlaybackState::Paused;
            debug!("[TRANSPORT] Paused at {:.3}s", position);
        }
        self.position()
    }

    /// Halt generation, resetting the position to 0 or keeping it
    ///
    /// State transition: Any -> Stopped. Returns the resulting position.
    pub fn stop(&mut self, reset_position: bool) -> f64 {
        let position = self.position();
        self.halt();
        self.state = PlaybackState::Stopped;
        self.start_offset = if reset_position { 0.0 } else { position };
        debug!("[TRANSPORT] Stopped at {:.3}s", self.start_offset);
        self.start_offset
    }

    /// Move the playhead, clamped to `[0, total]`
    ///
    /// While playing, generation restarts from the new position; otherwise
    /// only the stored offset changes.
    pub fn seek(&mut self, position: f64) -> f64 {
        if !position.is_finite() {
            warn!("[TRANSPORT] Ignoring seek to non-finite position");
            return self.position();
        }
        let target = position.clamp(0.0, self.total_duration());
        if self.state == PlaybackState::Playing {
            self.halt();
            self.start_offset = target;
            self.start_generation();
        } else {
            self.start_offset = target;
        }
        debug!("[TRANSPORT] Seek to {:.3}s", target);
        self.position()
    }

    // ========================================================================
    // Position & Completion
    // ========================================================================

    /// Current playback position in seconds, within `[0, total]`
    pub fn position(&self) -> f64 {
        let total = self.total_duration();
        let active = match (self.state, self.active) {
            (PlaybackState::Playing, Some(active)) => active,
            _ => return self.start_offset.clamp(0.0, total),
        };

        let raw = self.raw_position();
        let position = match active.loop_region {
            Some((loop_start, loop_end)) if loop_end > loop_start && raw >= loop_end => {
                loop_start + (raw - loop_start) % (loop_end - loop_start)
            }
            Some(_) => raw,
            None => raw.min(active.end),
        };
        position.clamp(0.0, total)
    }

    /// Handle a completion report from the output device
    ///
    /// Returns the terminal position if `id` is the active generation, and
    /// `None` for stale reports.
    pub fn handle_generation_ended(&mut self, id: GenerationId) -> Option<f64> {
        match self.active {
            Some(active) if active.id == id && self.state == PlaybackState::Playing => {
                Some(self.finish())
            }
            _ => {
                debug!("[TRANSPORT] Ignoring stale end of generation {:?}", id);
                None
            }
        }
    }

    /// Detect a non-looping generation that has run past its end
    ///
    /// Returns the terminal position when playback ended naturally.
    pub fn check_natural_end(&mut self) -> Option<f64> {
        let active = self.active?;
        if self.state != PlaybackState::Playing || active.loop_region.is_some() {
            return None;
        }
        if self.raw_position() >= active.end {
            Some(self.finish())
        } else {
            None
        }
    }

    // ========================================================================
    // State Queries
    // ========================================================================

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Offset the next (or current) generation starts from
    pub fn start_offset(&self) -> f64 {
        self.start_offset
    }

    /// Id of the running generation, if any
    pub fn active_generation(&self) -> Option<GenerationId> {
        self.active.map(|a| a.id)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn raw_position(&self) -> f64 {
        self.start_offset + (self.clock.now() - self.origin_engine_time).max(0.0)
    }

    /// Begin a generation from `start_offset` under the current policy
    fn start_generation(&mut self) {
        let buffer = match &self.buffer {
            Some(buffer) => buffer.clone(),
            None => return,
        };
        let total = buffer.duration_secs();
        let mut start = self.start_offset.clamp(0.0, total);

        let (loop_region, end) = match self.policy.restricted_range(total) {
            Some((sel_start, sel_end)) => {
                if start < sel_start || start >= sel_end {
                    start = sel_start;
                }
                if self.policy.loop_playback {
                    (Some((sel_start, sel_end)), sel_end)
                } else {
                    (None, sel_end)
                }
            }
            None if self.policy.loop_playback => (Some((0.0, total)), total),
            None => {
                if start >= total {
                    start = 0.0;
                }
                (None, total)
            }
        };

        let id = GenerationId(self.next_generation);
        self.next_generation += 1;
        self.start_offset = start;
        self.origin_engine_time = self.clock.now();
        self.active = Some(ActiveGeneration {
            id,
            loop_region,
            end,
        });

        let request = GenerationRequest {
            id,
            buffer,
            offset: start,
            duration: loop_region.is_none().then(|| end - start),
            loop_region,
        };
        self.output.start(&request);
    }

    /// Stop the running generation without touching the offset
    fn halt(&mut self) {
        if let Some(active) = self.active.take() {
            self.output.stop(active.id);
        }
    }

    fn finish(&mut self) -> f64 {
        let terminal = match self.active {
            Some(active) if active.loop_region.is_none() => active.end,
            _ => self.position(),
        };
        self.active = None;
        self.state = PlaybackState::Stopped;
        self.start_offset = terminal.clamp(0.0, self.total_duration());
        debug!("[TRANSPORT] Playback ended at {:.3}s", self.start_offset);
        self.start_offset
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
