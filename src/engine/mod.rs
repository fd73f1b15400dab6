//! Audio Engine Module
//!
//! Core of the editor, independent of any UI or device:
//! - Sample buffers and frame/time conversion
//! - Cut/copy/paste/delete editing
//! - Playback scheduling against an engine clock
//! - Min/max peak decimation for waveform display

pub mod buffer;
pub mod clock;
pub mod edit;
pub mod peaks;
pub mod selection;
pub mod tone;
pub mod transport;

pub use buffer::{frame_to_time, time_to_frame, SampleBuffer};
pub use clock::{
    EngineClock, GenerationId, GenerationRequest, ManualClock, NullOutput, OutputDevice,
    SystemClock,
};
pub use peaks::{compute_peaks, PeakRefresher, PeakSummary};
pub use selection::SelectionRange;
pub use tone::{generate_stereo_test_tone, generate_test_tone, generate_tone};
pub use transport::{PlaybackPolicy, PlaybackScheduler, PlaybackState};
