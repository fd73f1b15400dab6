//! Test signal generation
//!
//! Sine tones used by the CLI and by tests in place of decoded audio.

use crate::engine::buffer::{time_to_frame, SampleBuffer};
use crate::error::{Result, WaveditError};

/// Generate one sine wave per entry in `frequencies`, one channel each
///
/// The frame count is `round(duration_secs * sample_rate)`.
pub fn generate_tone(
    frequencies: &[f32],
    amplitude: f32,
    duration_secs: f64,
    sample_rate: u32,
) -> Result<SampleBuffer> {
    let frames = time_to_frame(duration_secs, sample_rate).ok_or_else(|| {
        WaveditError::InvalidBuffer {
            reason: format!("invalid tone duration {}", duration_secs),
        }
    })?;
    if sample_rate == 0 {
        return Err(WaveditError::InvalidBuffer {
            reason: "sample rate must be positive".to_string(),
        });
    }

    let channels = frequencies
        .iter()
        .map(|&freq| {
            let angular = 2.0 * std::f64::consts::PI * freq as f64 / sample_rate as f64;
            (0..frames)
                .map(|i| amplitude * (angular * i as f64).sin() as f32)
                .collect()
        })
        .collect();

    SampleBuffer::new(sample_rate, channels)
}

/// Mono full-scale sine tone
pub fn generate_test_tone(
    frequency: f32,
    duration_secs: f64,
    sample_rate: u32,
) -> Result<SampleBuffer> {
    generate_tone(&[frequency], 1.0, duration_secs, sample_rate)
}

/// Stereo tone with a different frequency per channel
pub fn generate_stereo_test_tone(
    freq_left: f32,
    freq_right: f32,
    duration_secs: f64,
    sample_rate: u32,
) -> Result<SampleBuffer> {
    generate_tone(&[freq_left, freq_right], 1.0, duration_secs, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mono_tone_shape() {
        let tone = generate_test_tone(440.0, 0.5, 48_000).unwrap();
        assert_eq!(tone.num_channels(), 1);
        assert_eq!(tone.frame_count(), 24_000);
        assert_eq!(tone.sample_rate(), 48_000);
        assert_eq!(tone.get_sample(0, 0), Some(0.0));
    }

    #[test]
    fn test_tone_peaks_near_amplitude() {
        let tone = generate_tone(&[100.0], 0.25, 1.0, 8_000).unwrap();
        let max = tone.channel(0).iter().cloned().fold(f32::MIN, f32::max);
        assert_relative_eq!(max, 0.25, epsilon = 1e-3);
    }

    #[test]
    fn test_stereo_channels_differ() {
        let tone = generate_stereo_test_tone(440.0, 880.0, 0.1, 44_100).unwrap();
        assert_eq!(tone.num_channels(), 2);
        assert_ne!(tone.channel(0), tone.channel(1));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(generate_test_tone(440.0, -1.0, 44_100).is_err());
        assert!(generate_test_tone(440.0, 1.0, 0).is_err());
        assert!(generate_tone(&[], 1.0, 1.0, 44_100).is_err());
    }
}
