//! Audio sources and the external collaborators that turn them into buffers
//!
//! Format decoding and microphone capture happen outside the core. The
//! controller only awaits their results.

use std::future::Future;

use crate::engine::SampleBuffer;
use crate::error::Result;

/// Where a new buffer comes from
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Samples that are already decoded
    Decoded { name: String, buffer: SampleBuffer },
    /// Encoded file contents, handed to a [`Decoder`]
    Encoded { name: String, bytes: Vec<u8> },
    /// Remote resource; fetching is not handled by the core
    Remote { url: String },
}

impl AudioSource {
    /// Display name used as the editor's file name
    pub fn name(&self) -> &str {
        match self {
            AudioSource::Decoded { name, .. } | AudioSource::Encoded { name, .. } => name,
            AudioSource::Remote { url } => url,
        }
    }
}

/// Turns encoded bytes into a [`SampleBuffer`]
pub trait Decoder {
    fn decode(&self, bytes: &[u8]) -> impl Future<Output = Result<SampleBuffer>>;
}

/// Microphone (or other) capture
///
/// `start_capture` fails with a permission error when capture is not
/// allowed. `stop_capture` resolves to the recorded buffer, or `None` if
/// nothing was captured.
pub trait CaptureDevice {
    fn start_capture(&mut self) -> Result<()>;
    fn stop_capture(&mut self) -> impl Future<Output = Result<Option<SampleBuffer>>>;
}

/// Identifies one in-flight load; completions with an older ticket are stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(pub(crate) u64);
