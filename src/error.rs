//! Error handling for Wavedit
//!
//! Editing precondition failures, collaborator failures (decode, capture) and
//! ambient I/O/config failures share one error type.

use thiserror::Error;

/// Result type alias for Wavedit operations
pub type Result<T> = std::result::Result<T, WaveditError>;

/// Main error type for Wavedit operations
#[derive(Error, Debug)]
pub enum WaveditError {
    // Editing Errors
    #[error("Invalid range: {reason}")]
    InvalidRange { reason: String },

    #[error("Selection is empty")]
    EmptyOperation,

    #[error("Channel count mismatch: buffer has {expected}, insert has {found}")]
    ChannelMismatch { expected: usize, found: usize },

    #[error("Sample rate mismatch: buffer is {expected} Hz, insert is {found} Hz")]
    SampleRateMismatch { expected: u32, found: u32 },

    #[error("Invalid sample buffer: {reason}")]
    InvalidBuffer { reason: String },

    // Collaborator Errors
    #[error("Error decoding audio data: {reason}")]
    Decode {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Could not start recording: {reason}")]
    Permission { reason: String },

    #[error("Unsupported audio source: {description}")]
    UnsupportedSource { description: String },

    // Transport / History Errors
    #[error("No audio loaded")]
    NoBufferLoaded,

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Configuration parse error: {0}")]
    Config(#[from] serde_json::Error),

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WaveditError {
    /// Build a decode error from any collaborator error
    pub fn decode<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        WaveditError::Decode {
            reason: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            WaveditError::InvalidRange { .. } => "INVALID_RANGE",
            WaveditError::EmptyOperation => "EMPTY_OPERATION",
            WaveditError::ChannelMismatch { .. } => "CHANNEL_MISMATCH",
            WaveditError::SampleRateMismatch { .. } => "SAMPLE_RATE_MISMATCH",
            WaveditError::InvalidBuffer { .. } => "INVALID_BUFFER",
            WaveditError::Decode { .. } => "DECODE_ERROR",
            WaveditError::Permission { .. } => "PERMISSION_ERROR",
            WaveditError::UnsupportedSource { .. } => "UNSUPPORTED_SOURCE",
            WaveditError::NoBufferLoaded => "NO_BUFFER_LOADED",
            WaveditError::NothingToUndo => "NOTHING_TO_UNDO",
            WaveditError::NothingToRedo => "NOTHING_TO_REDO",
            WaveditError::InvalidConfig { .. } => "INVALID_CONFIG",
            WaveditError::Config(_) => "CONFIG_ERROR",
            WaveditError::Io(_) => "IO_ERROR",
        }
    }

    /// Check if this error leaves the editor usable
    ///
    /// Editing precondition errors never touch editor state, and collaborator
    /// failures are converted into state updates at the controller boundary.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            WaveditError::InvalidConfig { .. } | WaveditError::Config(_) | WaveditError::Io(_)
        )
    }

    /// True for errors raised by buffer editing preconditions
    pub fn is_edit_precondition(&self) -> bool {
        matches!(
            self,
            WaveditError::InvalidRange { .. }
                | WaveditError::EmptyOperation
                | WaveditError::ChannelMismatch { .. }
                | WaveditError::SampleRateMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(WaveditError::EmptyOperation.error_code(), "EMPTY_OPERATION");
        let err = WaveditError::ChannelMismatch {
            expected: 2,
            found: 1,
        };
        assert_eq!(err.error_code(), "CHANNEL_MISMATCH");
        assert!(err.is_edit_precondition());
    }

    #[test]
    fn test_decode_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad header");
        let err = WaveditError::decode(io);
        assert_eq!(err.to_string(), "Error decoding audio data: bad header");
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_config_errors_not_recoverable() {
        let err = WaveditError::InvalidConfig {
            reason: "max_undo_levels must be at least 1".to_string(),
        };
        assert!(!err.is_recoverable());
    }
}
