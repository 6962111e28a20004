//! Crate-wide error type for the capture → transcription pipeline.
//!
//! Every failure the pipeline can produce — device setup, recording,
//! upload, response parsing — collapses into [`PipelineError`].  The session
//! machine is the only consumer: it never propagates these further, it
//! transitions to `Error`, records a human-readable status message, and logs
//! the cause.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// All errors that can surface inside a capture-and-transcribe session.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// The host refused microphone access.
    #[error("Microphone permission denied")]
    PermissionDenied,

    /// The audio device rejected the requested stream configuration.
    #[error("Audio device configuration failed: {0}")]
    DeviceConfigurationFailed(String),

    /// Capture finished but produced zero bytes of audio.
    #[error("Recording is empty")]
    EmptyRecording,

    /// The encoder/writer failed while the recording was in progress.
    /// Raised asynchronously from the audio callback.
    #[error("Recording encoding error: {0}")]
    EncodingError(String),

    /// Transport-level failure talking to the transcription endpoint.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The transcription response body was malformed or missing.
    #[error("Failed to decode transcription response: {0}")]
    DecodeError(String),

    /// The bundled fixture asset for simulated capture is missing.
    #[error("Fixture audio not found: {}", .0.display())]
    FixtureNotFound(PathBuf),
}

impl PipelineError {
    /// Status-bar message shown to the user when this error terminates a
    /// session.  Shorter and friendlier than the `Display` text, which is
    /// what goes to the log.
    pub fn status_message(&self) -> &'static str {
        match self {
            PipelineError::PermissionDenied => "Microphone permission denied.",
            PipelineError::DeviceConfigurationFailed(_) => "Audio session configuration failed.",
            PipelineError::EmptyRecording => "Audio file is empty.",
            PipelineError::EncodingError(_) => "Recording encoding error.",
            PipelineError::NetworkError(_) => "Network error.",
            PipelineError::DecodeError(_) => "Transcription failed.",
            PipelineError::FixtureNotFound(_) => "Recording file not found.",
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        // Body-decode failures are protocol errors; everything else
        // (connect, timeout, TLS) is transport.
        if e.is_decode() {
            PipelineError::DecodeError(e.to_string())
        } else {
            PipelineError::NetworkError(e.to_string())
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::EncodingError(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_the_cause() {
        let e = PipelineError::NetworkError("connection refused".into());
        assert!(e.to_string().contains("connection refused"));
    }

    #[test]
    fn fixture_not_found_shows_path() {
        let e = PipelineError::FixtureNotFound(PathBuf::from("/tmp/missing.wav"));
        assert!(e.to_string().contains("/tmp/missing.wav"));
    }

    #[test]
    fn status_messages_are_human_readable() {
        assert_eq!(
            PipelineError::PermissionDenied.status_message(),
            "Microphone permission denied."
        );
        assert_eq!(
            PipelineError::EmptyRecording.status_message(),
            "Audio file is empty."
        );
    }

    #[test]
    fn io_error_maps_to_encoding_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let e: PipelineError = io.into();
        assert!(matches!(e, PipelineError::EncodingError(_)));
    }
}
