//! Capture backend contract shared by the device and fixture variants.
//!
//! [`CaptureBackend`] is the seam between the session machine and whatever
//! is producing audio.  The machine calls [`begin`](CaptureBackend::begin)
//! when a session starts, meters amplitude through the returned
//! [`LevelSource`], and calls [`end`](CaptureBackend::end) on release to
//! obtain the finished [`AudioAsset`].  [`abort`](CaptureBackend::abort)
//! releases the device on every failure path without producing an asset.
//!
//! [`MockCapture`] (available under `#[cfg(test)]`) records its calls and
//! returns pre-configured results — the session machine's test suite is
//! built on it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::audio::level::LevelSource;
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// AudioAsset
// ---------------------------------------------------------------------------

/// A finished recording: a file on disk plus enough metadata to upload it.
///
/// Immutable once produced by [`CaptureBackend::end`]; the transcription
/// client only reads it.  Device recordings live in the OS temp directory
/// and are removed by [`discard`](AudioAsset::discard) after the session
/// reaches a terminal state; fixture assets are never removed.
#[derive(Debug, Clone)]
pub struct AudioAsset {
    path: PathBuf,
    fixture: bool,
}

impl AudioAsset {
    /// A temp-file recording owned by the pipeline.
    pub fn recorded(path: PathBuf) -> Self {
        Self {
            path,
            fixture: false,
        }
    }

    /// A bundled fixture asset (not owned; never deleted).
    pub fn fixture(path: PathBuf) -> Self {
        Self {
            path,
            fixture: true,
        }
    }

    /// Location of the audio bytes on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Filename sent as the multipart `file` part.
    ///
    /// Always `recorded.<ext>` — the on-disk name (temp-file suffixes, an
    /// arbitrarily named fixture) never leaks onto the wire.
    pub fn file_name(&self) -> String {
        format!("recorded.{}", self.extension())
    }

    /// Content type of the `file` part, derived from the extension.
    pub fn mime(&self) -> String {
        format!("audio/{}", self.extension())
    }

    fn extension(&self) -> String {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "wav".into())
    }

    /// Size of the asset in bytes; `0` when the file is missing.
    pub fn byte_len(&self) -> u64 {
        std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    /// Read the full audio contents for upload.
    pub fn read_bytes(&self) -> Result<Vec<u8>, PipelineError> {
        Ok(std::fs::read(&self.path)?)
    }

    /// Remove the backing file for temp recordings; no-op for fixtures.
    pub fn discard(&self) {
        if self.fixture {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::debug!("could not remove recording {}: {e}", self.path.display());
        }
    }

    /// Whether this asset is the bundled fixture.
    pub fn is_fixture(&self) -> bool {
        self.fixture
    }
}

// ---------------------------------------------------------------------------
// CaptureBackend trait
// ---------------------------------------------------------------------------

/// Polymorphic capture capability — device or simulated, selected at runtime.
///
/// # Contract
///
/// - `begin` acquires the audio source and starts capturing; the returned
///   [`LevelSource`] delivers one normalized amplitude sample per meter
///   tick.  Calling `begin` while already capturing is a backend bug; the
///   session machine guards against it.
/// - `end` stops capturing, finalises the recording and returns it.  A
///   zero-length recording is an error (`EmptyRecording`).
/// - `abort` releases the audio source without producing an asset.  Safe to
///   call at any time, including when nothing is being captured.
#[async_trait]
pub trait CaptureBackend: Send {
    /// Start capturing.
    async fn begin(&mut self) -> Result<LevelSource, PipelineError>;

    /// Stop capturing and hand back the finished asset.
    async fn end(&mut self) -> Result<AudioAsset, PipelineError>;

    /// Release the audio source without producing an asset.  Idempotent.
    async fn abort(&mut self);
}

// Compile-time assertion: Box<dyn CaptureBackend> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn CaptureBackend>) {}
};

// ---------------------------------------------------------------------------
// MockCapture  (test-only)
// ---------------------------------------------------------------------------

/// Test double that counts calls and returns pre-configured results.
#[cfg(test)]
pub struct MockCapture {
    begin_result: Result<(), PipelineError>,
    end_result: Result<AudioAsset, PipelineError>,
    pub begins: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    pub ends: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    pub aborts: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(test)]
impl MockCapture {
    /// Mock where both `begin` and `end` succeed; `end` yields a fixture
    /// asset pointing at `path`.
    pub fn ok(path: impl Into<PathBuf>) -> Self {
        Self {
            begin_result: Ok(()),
            end_result: Ok(AudioAsset::fixture(path.into())),
            begins: Default::default(),
            ends: Default::default(),
            aborts: Default::default(),
        }
    }

    /// Mock whose `begin` fails with `error`.
    pub fn begin_err(error: PipelineError) -> Self {
        Self {
            begin_result: Err(error),
            end_result: Err(PipelineError::EmptyRecording),
            begins: Default::default(),
            ends: Default::default(),
            aborts: Default::default(),
        }
    }

    /// Mock whose `begin` succeeds and `end` fails with `error`.
    pub fn end_err(error: PipelineError) -> Self {
        Self {
            begin_result: Ok(()),
            end_result: Err(error),
            begins: Default::default(),
            ends: Default::default(),
            aborts: Default::default(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl CaptureBackend for MockCapture {
    async fn begin(&mut self) -> Result<LevelSource, PipelineError> {
        self.begins
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.begin_result.clone().map(|_| {
            LevelSource::Synthetic(crate::audio::level::SyntheticLevel::new(1))
        })
    }

    async fn end(&mut self) -> Result<AudioAsset, PipelineError> {
        self.ends.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.end_result.clone()
    }

    async fn abort(&mut self) {
        self.aborts
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
