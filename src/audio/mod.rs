//! Audio capture and metering.
//!
//! # Pipeline
//!
//! ```text
//! CaptureBackend::begin() ──▶ LevelSource ──(50 ms meter tick)──▶ WaveformBuffer
//!        │
//!        ├─ DeviceCapture   cpal callback → hound WAV temp file + PowerCell
//!        └─ FixtureCapture  bundled asset + synthetic level stream
//!
//! CaptureBackend::end() ──▶ AudioAsset ──▶ transcription upload
//! ```
//!
//! The backend variant is picked at runtime from
//! [`CaptureConfig::use_fixture_capture`](crate::config::CaptureConfig);
//! the session machine only ever sees the [`CaptureBackend`] trait.

pub mod backend;
pub mod device;
pub mod fixture;
pub mod level;
pub mod waveform;

pub use backend::{AudioAsset, CaptureBackend};
pub use device::{DeviceCapture, FaultSender};
pub use fixture::FixtureCapture;
pub use level::{normalized_power, power_db, LevelSource, PowerCell, SyntheticLevel};
pub use waveform::{WaveformBuffer, WAVEFORM_BARS};

// test-only re-export so the session test module can import MockCapture
// without `use voicekey::audio::backend::MockCapture`.
#[cfg(test)]
pub use backend::MockCapture;
