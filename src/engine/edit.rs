//! Buffer Editing
//!
//! Pure cut/copy/paste/delete over [`SampleBuffer`]s. Nothing here mutates
//! its input; each operation allocates a new buffer with the same sample rate
//! and channel count.
//!
//! Selections are converted to frames with [`time_to_frame`] (round to
//! nearest), so `paste(delete(b, s), copy(b, s), frame_to_time(start))`
//! reconstructs `b` sample for sample.

use std::ops::Range;

use log::debug;

use crate::engine::buffer::{time_to_frame, SampleBuffer};
use crate::engine::selection::SelectionRange;
use crate::error::{Result, WaveditError};

/// Resolve a selection to a frame range within `buffer`
///
/// Fails with `InvalidRange` for unset ends, negative times or an end past
/// the last frame, and with `EmptyOperation` for a zero-length range.
pub fn selection_frames(
    buffer: &SampleBuffer,
    selection: &SelectionRange,
) -> Result<Range<usize>> {
    let (start, end) = selection.bounds().ok_or_else(|| WaveditError::InvalidRange {
        reason: "selection start and end must both be set".to_string(),
    })?;

    let rate = buffer.sample_rate();
    let frame_count = buffer.frame_count();
    let (start_frame, end_frame) = match (time_to_frame(start, rate), time_to_frame(end, rate)) {
        (Some(s), Some(e)) => (s, e),
        _ => {
            return Err(WaveditError::InvalidRange {
                reason: format!("selection {:.6}s..{:.6}s has a negative bound", start, end),
            })
        }
    };

    if end_frame > frame_count {
        return Err(WaveditError::InvalidRange {
            reason: format!(
                "selection frames {}..{} exceed buffer length {}",
                start_frame, end_frame, frame_count
            ),
        });
    }
    if start_frame == end_frame {
        return Err(WaveditError::EmptyOperation);
    }

    Ok(start_frame..end_frame)
}

/// Extract the selected frames of every channel into a new buffer
pub fn copy(buffer: &SampleBuffer, selection: &SelectionRange) -> Result<SampleBuffer> {
    let range = selection_frames(buffer, selection)?;
    debug!("[EDIT] Copy frames {}..{}", range.start, range.end);

    let channels = buffer
        .channels()
        .iter()
        .map(|ch| ch[range.clone()].to_vec())
        .collect();
    Ok(SampleBuffer::from_parts(buffer.sample_rate(), channels))
}

/// Remove the selected frames, joining what precedes and follows them
pub fn delete(buffer: &SampleBuffer, selection: &SelectionRange) -> Result<SampleBuffer> {
    let range = selection_frames(buffer, selection)?;
    debug!("[EDIT] Delete frames {}..{}", range.start, range.end);

    let remaining = buffer.frame_count() - range.len();
    let channels = buffer
        .channels()
        .iter()
        .map(|ch| {
            let mut out = Vec::with_capacity(remaining);
            out.extend_from_slice(&ch[..range.start]);
            out.extend_from_slice(&ch[range.end..]);
            out
        })
        .collect();
    Ok(SampleBuffer::from_parts(buffer.sample_rate(), channels))
}

/// Delete the selection and return `(remainder, extracted)`
pub fn cut(
    buffer: &SampleBuffer,
    selection: &SelectionRange,
) -> Result<(SampleBuffer, SampleBuffer)> {
    let extracted = copy(buffer, selection)?;
    let remainder = delete(buffer, selection)?;
    Ok((remainder, extracted))
}

/// Splice `insert` into `buffer` at `position` seconds
///
/// The insertion frame is `round(position * sample_rate)` clamped to
/// `[0, frame_count]`. Channel counts and sample rates must match; this
/// function does not resample.
pub fn paste(
    buffer: &SampleBuffer,
    insert: &SampleBuffer,
    position: f64,
) -> Result<SampleBuffer> {
    if insert.num_channels() != buffer.num_channels() {
        return Err(WaveditError::ChannelMismatch {
            expected: buffer.num_channels(),
            found: insert.num_channels(),
        });
    }
    if insert.sample_rate() != buffer.sample_rate() {
        return Err(WaveditError::SampleRateMismatch {
            expected: buffer.sample_rate(),
            found: insert.sample_rate(),
        });
    }

    let at = buffer.clamp_frame(position);
    debug!("[EDIT] Paste {} frames at frame {}", insert.frame_count(), at);

    let total = buffer.frame_count() + insert.frame_count();
    let channels = buffer
        .channels()
        .iter()
        .zip(insert.channels())
        .map(|(orig, ins)| {
            let mut out = Vec::with_capacity(total);
            out.extend_from_slice(&orig[..at]);
            out.extend_from_slice(ins);
            out.extend_from_slice(&orig[at..]);
            out
        })
        .collect();
    Ok(SampleBuffer::from_parts(buffer.sample_rate(), channels))
}

// ============================================================================
// Tests
// ============================================================================
