//! Simulated capture for environments without a microphone.
//!
//! [`FixtureCapture`] satisfies the [`CaptureBackend`] contract with a
//! bundled audio asset: `begin` verifies the fixture exists and hands back a
//! synthetic amplitude stream so the waveform still animates; `end` returns
//! the fixture itself as the recording.  The session machine cannot tell it
//! apart from the device path.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::audio::backend::{AudioAsset, CaptureBackend};
use crate::audio::level::{LevelSource, SyntheticLevel};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// FixtureCapture
// ---------------------------------------------------------------------------

/// Capture backend that plays back a canned recording.
pub struct FixtureCapture {
    path: PathBuf,
}

impl FixtureCapture {
    /// Backend serving the fixture at `path`.  Existence is checked at
    /// `begin`, not here, so a missing file surfaces through the session's
    /// normal error path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl CaptureBackend for FixtureCapture {
    async fn begin(&mut self) -> Result<LevelSource, PipelineError> {
        if !self.path.exists() {
            return Err(PipelineError::FixtureNotFound(self.path.clone()));
        }
        log::debug!("fixture capture: using {}", self.path.display());
        Ok(LevelSource::Synthetic(SyntheticLevel::from_clock()))
    }

    async fn end(&mut self) -> Result<AudioAsset, PipelineError> {
        let asset = AudioAsset::fixture(self.path.clone());
        if asset.byte_len() == 0 {
            return Err(PipelineError::EmptyRecording);
        }
        Ok(asset)
    }

    async fn abort(&mut self) {
        // Nothing held: the fixture file belongs to the installation.
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn begin_fails_when_fixture_missing() {
        let mut capture = FixtureCapture::new(PathBuf::from("/nonexistent/fixture.wav"));
        let err = capture.begin().await.unwrap_err();
        assert!(matches!(err, PipelineError::FixtureNotFound(_)));
    }

    #[tokio::test]
    async fn begin_yields_synthetic_levels() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("fixture.wav");
        std::fs::write(&path, b"RIFF....WAVEdata").expect("write");

        let mut capture = FixtureCapture::new(path);
        let mut source = capture.begin().await.expect("begin");
        let v = source.sample();
        assert!((0.0..=1.0).contains(&v));
    }

    #[tokio::test]
    async fn end_returns_the_fixture_asset() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("fixture.wav");
        std::fs::write(&path, b"RIFF....WAVEdata").expect("write");

        let mut capture = FixtureCapture::new(path.clone());
        capture.begin().await.expect("begin");
        let asset = capture.end().await.expect("end");

        assert!(asset.is_fixture());
        assert_eq!(asset.path(), path.as_path());
        assert!(asset.byte_len() > 0);
    }

    #[tokio::test]
    async fn empty_fixture_is_rejected_at_end() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("empty.wav");
        std::fs::write(&path, b"").expect("write");

        let mut capture = FixtureCapture::new(path);
        capture.begin().await.expect("begin");
        let err = capture.end().await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyRecording));
    }

    #[tokio::test]
    async fn abort_is_idempotent() {
        let mut capture = FixtureCapture::new(PathBuf::from("/tmp/fixture.wav"));
        capture.abort().await;
        capture.abort().await;
    }
}
