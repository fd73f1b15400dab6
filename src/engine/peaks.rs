//! Peak Decimation
//!
//! Summarizes a [`SampleBuffer`] into one `(min, max)` pair per display
//! column, per channel, and keeps that summary current as the buffer or the
//! display width changes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use serde::Serialize;

use crate::engine::buffer::SampleBuffer;

// ============================================================================
// Peak Summary
// ============================================================================

/// Min/max summary of a buffer at a fixed display width
///
/// Each channel holds `2 * width` values laid out as
/// `[min0, max0, min1, max1, ...]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PeakSummary {
    width: usize,
    source_id: Option<u64>,
    channels: Vec<Vec<f32>>,
}

impl PeakSummary {
    /// Summary with no columns and no channels
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of display columns
    pub fn width(&self) -> usize {
        self.width
    }

    /// Identity of the buffer this summary was computed from
    pub fn source_id(&self) -> Option<u64> {
        self.source_id
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Interleaved min/max values of one channel
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// `(min, max)` pairs of one channel, one per column
    pub fn pairs(&self, index: usize) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.channels[index]
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
    }
}

/// Compute the min/max summary of `buffer` for `target_width` columns
///
/// With at least one sample per column, every channel is split into
/// `target_width` contiguous segments of `frame_count / target_width` frames;
/// the last segment also takes the remainder and ends at `frame_count`.
/// With fewer samples than columns, column `i` shows the single sample at
/// `min(i * frame_count / target_width, frame_count - 1)`.
pub fn compute_peaks(buffer: &SampleBuffer, target_width: usize) -> PeakSummary {
    let frames = buffer.frame_count();
    if target_width == 0 || frames == 0 {
        return PeakSummary::empty();
    }

    let samples_per_column = frames / target_width;
    let channels = buffer
        .channels()
        .iter()
        .map(|data| {
            let mut peaks = Vec::with_capacity(target_width * 2);
            if samples_per_column >= 1 {
                for column in 0..target_width {
                    let start = column * samples_per_column;
                    let end = if column + 1 == target_width {
                        frames
                    } else {
                        (start + samples_per_column).min(frames)
                    };
                    let (min, max) = min_max(&data[start..end]);
                    peaks.push(min);
                    peaks.push(max);
                }
            } else {
                for column in 0..target_width {
                    let index = (column * frames / target_width).min(frames - 1);
                    let sample = data[index];
                    peaks.push(sample);
                    peaks.push(sample);
                }
            }
            peaks
        })
        .collect();

    PeakSummary {
        width: target_width,
        source_id: Some(buffer.id()),
        channels,
    }
}

// Segment is never empty: samples_per_column >= 1.
fn min_max(segment: &[f32]) -> (f32, f32) {
    let first = segment[0];
    segment[1..]
        .iter()
        .fold((first, first), |(mn, mx), &s| (mn.min(s), mx.max(s)))
}

// ============================================================================
// Peak Refresher
// ============================================================================

/// Keeps a [`PeakSummary`] in sync with the live buffer and display width
///
/// A buffer-identity change regenerates immediately (and applies any pending
/// width at the same time). Width changes are debounced: the newest width is
/// applied once `debounce` has passed without another request, when
/// [`PeakRefresher::poll`] is called.
#[derive(Debug)]
pub struct PeakRefresher {
    debounce: Duration,
    width: usize,
    pending: Option<(usize, Instant)>,
    summary: Option<Arc<PeakSummary>>,
}

impl PeakRefresher {
    pub fn new(width: usize, debounce: Duration) -> Self {
        Self {
            debounce,
            width,
            pending: None,
            summary: None,
        }
    }

    /// Width currently used for summaries
    pub fn width(&self) -> usize {
        self.width
    }

    /// Latest summary, if one has been generated
    pub fn summary(&self) -> Option<&Arc<PeakSummary>> {
        self.summary.as_ref()
    }

    /// True if a width change is waiting for its debounce window
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Regenerate for a new buffer identity, never debounced
    ///
    /// Returns the new summary, or `None` if the buffer was removed.
    pub fn buffer_changed(
        &mut self,
        buffer: Option<&SampleBuffer>,
    ) -> Option<Arc<PeakSummary>> {
        if let Some((width, _)) = self.pending.take() {
            self.width = width;
        }
        match buffer {
            Some(buffer) => Some(self.regenerate(buffer)),
            None => {
                self.summary = None;
                None
            }
        }
    }

    /// Record a display width change, to be applied after the debounce window
    pub fn request_width(&mut self, width: usize, now: Instant) {
        if width == self.width && self.pending.is_none() {
            return;
        }
        self.pending = Some((width, now + self.debounce));
    }

    /// Apply a pending width change whose debounce window has elapsed
    ///
    /// Returns the regenerated summary if one was produced.
    pub fn poll(
        &mut self,
        buffer: Option<&SampleBuffer>,
        now: Instant,
    ) -> Option<Arc<PeakSummary>> {
        let (width, deadline) = self.pending?;
        if now < deadline {
            return None;
        }
        self.pending = None;
        if width == self.width && self.summary.is_some() {
            return None;
        }
        self.width = width;
        buffer.map(|b| self.regenerate(b))
    }

    fn regenerate(&mut self, buffer: &SampleBuffer) -> Arc<PeakSummary> {
        debug!(
            "[PEAKS] Regenerating {} columns for buffer #{}",
            self.width,
            buffer.id()
        );
        let summary = Arc::new(compute_peaks(buffer, self.width));
        self.summary = Some(Arc::clone(&summary));
        summary
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn mono(samples: Vec<f32>) -> SampleBuffer {
        SampleBuffer::new(100, vec![samples]).unwrap()
    }

    #[test]
    fn test_empty_inputs_give_empty_summary() {
        let buffer = mono(vec![0.5; 10]);
        assert!(compute_peaks(&buffer, 0).is_empty());

        let empty = mono(Vec::new());
        assert!(compute_peaks(&empty, 64).is_empty());
    }

    #[test]
    fn test_shape_is_two_values_per_column() {
        let buffer = SampleBuffer::silence(2, 1000, 100).unwrap();
        let peaks = compute_peaks(&buffer, 37);
        assert_eq!(peaks.width(), 37);
        assert_eq!(peaks.num_channels(), 2);
        for ch in 0..2 {
            assert_eq!(peaks.channel(ch).len(), 74);
            assert!(peaks.pairs(ch).all(|p| p == (0.0, 0.0)));
        }
    }

    #[test]
    fn test_min_max_per_segment() {
        let buffer = mono(vec![0.1, -0.4, 0.3, 0.9, -0.2, 0.0, 0.5, 0.5]);
        let peaks = compute_peaks(&buffer, 4);
        let pairs: Vec<_> = peaks.pairs(0).collect();
        assert_eq!(pairs, vec![(-0.4, 0.1), (0.3, 0.9), (-0.2, 0.0), (0.5, 0.5)]);
    }

    #[test]
    fn test_last_column_absorbs_remainder() {
        // 10 frames over 3 columns: 3 + 3 + 4
        let buffer = mono(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -0.8]);
        let peaks = compute_peaks(&buffer, 3);
        let pairs: Vec<_> = peaks.pairs(0).collect();
        assert_eq!(pairs[2], (-0.8, 0.0));
    }

    #[test]
    fn test_out_of_range_values_are_not_clamped() {
        let buffer = mono(vec![1.5, 1.7, -2.0, -1.2]);
        let pairs: Vec<_> = compute_peaks(&buffer, 2).pairs(0).collect();
        assert_eq!(pairs, vec![(1.5, 1.7), (-2.0, -1.2)]);
    }

    #[test]
    fn test_more_columns_than_samples() {
        let buffer = mono(vec![0.1, 0.2, 0.3]);
        let peaks = compute_peaks(&buffer, 6);
        let pairs: Vec<_> = peaks.pairs(0).collect();
        assert_eq!(
            pairs,
            vec![
                (0.1, 0.1),
                (0.1, 0.1),
                (0.2, 0.2),
                (0.2, 0.2),
                (0.3, 0.3),
                (0.3, 0.3)
            ]
        );
    }

    #[test]
    fn test_deterministic() {
        let samples: Vec<f32> = (0..5000).map(|i| ((i as f32) * 0.37).sin()).collect();
        let buffer = mono(samples);
        assert_eq!(compute_peaks(&buffer, 123), compute_peaks(&buffer, 123));
    }

    #[test]
    fn test_refresher_buffer_change_is_immediate() {
        let mut refresher = PeakRefresher::new(8, Duration::from_millis(50));
        let buffer = mono(vec![0.25; 64]);
        let summary = refresher.buffer_changed(Some(&buffer)).unwrap();
        assert_eq!(summary.width(), 8);
        assert_eq!(summary.source_id(), Some(buffer.id()));

        assert!(refresher.buffer_changed(None).is_none());
        assert!(refresher.summary().is_none());
    }

    #[test]
    fn test_refresher_debounces_width_changes() {
        let mut refresher = PeakRefresher::new(8, Duration::from_millis(50));
        let buffer = mono(vec![0.25; 64]);
        refresher.buffer_changed(Some(&buffer));

        let t0 = Instant::now();
        refresher.request_width(16, t0);
        refresher.request_width(32, t0 + Duration::from_millis(20));
        assert!(refresher
            .poll(Some(&buffer), t0 + Duration::from_millis(60))
            .is_none());

        let summary = refresher
            .poll(Some(&buffer), t0 + Duration::from_millis(71))
            .unwrap();
        assert_eq!(summary.width(), 32);
        assert!(!refresher.has_pending());
    }

    #[test]
    fn test_refresher_buffer_change_flushes_pending_width() {
        let mut refresher = PeakRefresher::new(8, Duration::from_secs(10));
        refresher.request_width(4, Instant::now());
        let buffer = mono(vec![0.25; 64]);
        let summary = refresher.buffer_changed(Some(&buffer)).unwrap();
        assert_eq!(summary.width(), 4);
        assert!(!refresher.has_pending());
    }
}
