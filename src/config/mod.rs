//! Configuration module for voicekey.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for capture and
//! transcription, `AppPaths` for cross-platform data directories, and TOML
//! persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, CaptureConfig, TranscriptionConfig};
