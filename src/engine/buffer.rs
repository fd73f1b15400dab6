//! Sample Buffer
//!
//! Immutable multichannel sample container shared by the live editor state,
//! the clipboard, the undo history and in-flight playback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{Result, WaveditError};

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// Frame / Time Conversion
// ============================================================================

/// Convert a time in seconds to a frame index: `round(time * sample_rate)`
///
/// Negative or non-finite times yield `None`. Every editing operation goes
/// through this function so copy and paste agree on frame boundaries.
#[inline]
pub fn time_to_frame(time_secs: f64, sample_rate: u32) -> Option<usize> {
    let frame = (time_secs * sample_rate as f64).round();
    if !frame.is_finite() || frame < 0.0 {
        return None;
    }
    Some(frame as usize)
}

/// Convert a frame index to a time in seconds
#[inline]
pub fn frame_to_time(frame: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    frame as f64 / sample_rate as f64
}

// ============================================================================
// Sample Buffer
// ============================================================================

#[derive(Debug)]
struct BufferData {
    id: u64,
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

/// Multichannel 32-bit float sample container
///
/// Stores audio as non-interleaved samples, one `Vec<f32>` per channel, all of
/// equal length. The data sits behind an `Arc`: cloning a `SampleBuffer`
/// shares the samples, and there is no way to mutate them once built.
/// Every edit produces a new buffer with a new identity.
///
/// Equality (`==`) compares sample rate and sample values. Identity is
/// compared with [`SampleBuffer::same_buffer`] or [`SampleBuffer::id`].
///
/// # Example
/// ```
/// use wavedit::engine::SampleBuffer;
///
/// let buffer = SampleBuffer::new(10, vec![vec![0.0; 100], vec![0.0; 100]]).unwrap();
/// assert_eq!(buffer.num_channels(), 2);
/// assert_eq!(buffer.frame_count(), 100);
/// assert_eq!(buffer.duration_secs(), 10.0);
/// ```
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    inner: Arc<BufferData>,
}

impl SampleBuffer {
    /// Create a buffer from per-channel sample vectors
    ///
    /// Fails with `InvalidBuffer` if the sample rate is zero, there are no
    /// channels, or the channels differ in length.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(WaveditError::InvalidBuffer {
                reason: "sample rate must be positive".to_string(),
            });
        }
        if channels.is_empty() {
            return Err(WaveditError::InvalidBuffer {
                reason: "buffer must have at least one channel".to_string(),
            });
        }
        let frames = channels[0].len();
        if let Some((index, channel)) = channels
            .iter()
            .enumerate()
            .find(|(_, ch)| ch.len() != frames)
        {
            return Err(WaveditError::InvalidBuffer {
                reason: format!(
                    "channel {} has {} frames, expected {}",
                    index,
                    channel.len(),
                    frames
                ),
            });
        }
        Ok(Self::from_parts(sample_rate, channels))
    }

    /// Create a silent buffer
    pub fn silence(num_channels: usize, frames: usize, sample_rate: u32) -> Result<Self> {
        Self::new(sample_rate, vec![vec![0.0_f32; frames]; num_channels])
    }

    /// Create a buffer from interleaved sample data (L, R, L, R, ... for stereo)
    pub fn from_interleaved(
        interleaved: &[f32],
        num_channels: usize,
        sample_rate: u32,
    ) -> Result<Self> {
        if num_channels == 0 {
            return Err(WaveditError::InvalidBuffer {
                reason: "buffer must have at least one channel".to_string(),
            });
        }

        if interleaved.len() % num_channels != 0 {
            return Err(WaveditError::InvalidBuffer {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
            });
        }

        let frames = interleaved.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(frames); num_channels];

        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                channels[ch].push(sample);
            }
        }

        Self::new(sample_rate, channels)
    }

    // Callers guarantee a positive rate and equal-length, non-empty channel set.
    pub(crate) fn from_parts(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        Self {
            inner: Arc::new(BufferData {
                id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
                sample_rate,
                channels,
            }),
        }
    }

    /// Convert the buffer to interleaved format
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_channels = self.num_channels();
        let frames = self.frame_count();
        let mut interleaved = Vec::with_capacity(num_channels * frames);

        for frame in 0..frames {
            for channel in &self.inner.channels {
                interleaved.push(channel[frame]);
            }
        }

        interleaved
    }

    /// Process-unique identity of this buffer's sample data
    #[inline]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// True if both handles refer to the same sample data
    #[inline]
    pub fn same_buffer(&self, other: &SampleBuffer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    /// Number of channels
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.inner.channels.len()
    }

    /// Number of frames (samples per channel)
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.inner.channels.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer holds no frames
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    /// Duration in seconds, derived from frame count and sample rate
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        frame_to_time(self.frame_count(), self.sample_rate())
    }

    /// Samples of one channel
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.inner.channels[index]
    }

    /// All channels, in order
    #[inline]
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.inner.channels
    }

    /// Get a sample at the specified channel and frame
    #[inline]
    pub fn get_sample(&self, channel: usize, frame: usize) -> Option<f32> {
        self.inner
            .channels
            .get(channel)
            .and_then(|ch| ch.get(frame).copied())
    }

    /// Frame index for a time in seconds, clamped to `[0, frame_count]`
    pub fn clamp_frame(&self, time_secs: f64) -> usize {
        time_to_frame(time_secs, self.sample_rate())
            .unwrap_or(0)
            .min(self.frame_count())
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.inner
            .channels
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }
}

impl PartialEq for SampleBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.same_buffer(other)
            || (self.sample_rate() == other.sample_rate()
                && self.inner.channels == other.inner.channels)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize) -> Vec<f32> {
        (0..frames).map(|i| i as f32 / frames as f32).collect()
    }

    #[test]
    fn test_buffer_new() {
        let buffer = SampleBuffer::new(48000, vec![ramp(1000), ramp(1000)]).unwrap();
        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.frame_count(), 1000);
        assert_eq!(buffer.sample_rate(), 48000);
    }

    #[test]
    fn test_buffer_rejects_unequal_channels() {
        let result = SampleBuffer::new(48000, vec![ramp(10), ramp(11)]);
        assert!(matches!(result, Err(WaveditError::InvalidBuffer { .. })));
    }

    #[test]
    fn test_buffer_rejects_zero_rate_and_no_channels() {
        assert!(SampleBuffer::new(0, vec![ramp(10)]).is_err());
        assert!(SampleBuffer::new(44100, vec![]).is_err());
    }

    #[test]
    fn test_buffer_duration() {
        let buffer = SampleBuffer::silence(1, 100, 10).unwrap();
        assert!((buffer.duration_secs() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_buffer_from_interleaved_stereo() {
        let interleaved = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let buffer = SampleBuffer::from_interleaved(&interleaved, 2, 48000).unwrap();

        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.frame_count(), 3);
        assert_eq!(buffer.get_sample(0, 0), Some(0.1));
        assert_eq!(buffer.get_sample(1, 0), Some(0.2));
        assert_eq!(buffer.get_sample(0, 1), Some(0.3));
        assert_eq!(buffer.to_interleaved(), interleaved);
    }

    #[test]
    fn test_buffer_from_interleaved_invalid() {
        let interleaved = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        assert!(SampleBuffer::from_interleaved(&interleaved, 2, 48000).is_err());
    }

    #[test]
    fn test_identity_vs_equality() {
        let a = SampleBuffer::new(10, vec![ramp(20)]).unwrap();
        let shared = a.clone();
        let copy = SampleBuffer::new(10, vec![ramp(20)]).unwrap();

        assert!(a.same_buffer(&shared));
        assert_eq!(a.id(), shared.id());
        assert!(!a.same_buffer(&copy));
        assert_ne!(a.id(), copy.id());
        assert_eq!(a, copy);
    }

    #[test]
    fn test_time_frame_conversion() {
        assert_eq!(time_to_frame(3.0, 10), Some(30));
        assert_eq!(time_to_frame(0.26, 10), Some(3));
        assert_eq!(time_to_frame(0.24, 10), Some(2));
        assert_eq!(time_to_frame(-1.0, 10), None);
        assert_eq!(time_to_frame(f64::NAN, 10), None);
        assert_eq!(frame_to_time(30, 10), 3.0);

        for frame in [0usize, 1, 7, 4410, 44_100 * 60 + 17] {
            let t = frame_to_time(frame, 44100);
            assert_eq!(time_to_frame(t, 44100), Some(frame));
        }
    }

    #[test]
    fn test_clamp_frame() {
        let buffer = SampleBuffer::silence(1, 100, 10).unwrap();
        assert_eq!(buffer.clamp_frame(-2.0), 0);
        assert_eq!(buffer.clamp_frame(4.04), 40);
        assert_eq!(buffer.clamp_frame(50.0), 100);
    }

    #[test]
    fn test_buffer_is_finite() {
        let buffer = SampleBuffer::new(10, vec![vec![0.5; 10]]).unwrap();
        assert!(buffer.is_finite());

        let buffer_nan = SampleBuffer::new(10, vec![vec![f32::NAN; 10]]).unwrap();
        assert!(!buffer_nan.is_finite());
    }
}
