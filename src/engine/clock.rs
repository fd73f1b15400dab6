//! Engine clock and output device collaborators
//!
//! The playback scheduler never generates audio itself. It asks an
//! [`OutputDevice`] to start or stop generating from a buffer, and reads
//! elapsed time from an [`EngineClock`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::engine::buffer::SampleBuffer;

/// Monotonic clock driving audio generation, in seconds
pub trait EngineClock {
    fn now(&self) -> f64;
}

/// Wall-clock engine time measured from construction
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineClock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Manually driven clock
///
/// Clones share the same time, so a test or simulation can keep one handle
/// and hand another to the scheduler.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the absolute engine time
    pub fn set(&self, secs: f64) {
        self.bits.store(secs.to_bits(), Ordering::SeqCst);
    }

    /// Move the engine time forward by `secs`
    pub fn advance(&self, secs: f64) {
        self.set(self.now() + secs);
    }
}

impl EngineClock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

/// Identity of one start..stop run of audio generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenerationId(pub u64);

/// Everything an output device needs to start generating
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub id: GenerationId,
    pub buffer: SampleBuffer,
    /// Buffer position generation starts from, in seconds
    pub offset: f64,
    /// How long to play before ending naturally; `None` plays to the buffer end
    pub duration: Option<f64>,
    /// Loop interval in seconds; generation never ends on its own when set
    pub loop_region: Option<(f64, f64)>,
}

/// Sink that turns generation requests into sound
///
/// Devices report natural completion back to the controller with the
/// request's [`GenerationId`]; the scheduler discards reports for ids it no
/// longer considers active.
pub trait OutputDevice {
    fn start(&mut self, request: &GenerationRequest);
    fn stop(&mut self, id: GenerationId);
}

/// Output device that produces nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl OutputDevice for NullOutput {
    fn start(&mut self, _request: &GenerationRequest) {}
    fn stop(&mut self, _id: GenerationId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_is_shared() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        assert_eq!(clock.now(), 0.0);

        handle.set(2.5);
        handle.advance(0.5);
        assert_eq!(clock.now(), 3.0);
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
