//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// TranscriptionConfig
// ---------------------------------------------------------------------------

/// Settings for the remote transcription endpoint.
///
/// Nothing here is hardcoded into the client — the endpoint, token and model
/// identifier all come from this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Full URL of the `audio/transcriptions` endpoint.
    pub endpoint: String,
    /// Bearer token sent in the `Authorization` header.
    pub auth_token: String,
    /// Speech-model identifier sent as the `model` form field.
    pub model: String,
    /// Language hint as an ISO-639-1 code.  Empty string means the
    /// `language` form part is omitted and the backend auto-detects.
    pub language: String,
    /// Maximum seconds to wait for the upload + response round trip.
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1/audio/transcriptions".into(),
            auth_token: String::new(),
            model: "whisper-large-v3".into(),
            language: String::new(),
            timeout_secs: 30,
        }
    }
}

impl TranscriptionConfig {
    /// The optional language hint, `None` when unset.
    pub fn language_hint(&self) -> Option<&str> {
        if self.language.is_empty() {
            None
        } else {
            Some(self.language.as_str())
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

/// Settings for audio capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Mono capture sample rate in Hz.
    pub sample_rate_hz: u32,
    /// Force the simulated (fixture-based) capture path even when a real
    /// input device is present.
    pub use_fixture_capture: bool,
    /// Path of the canned audio asset used by simulated capture.  Empty
    /// string means the default location under the app data dir.
    pub fixture_path: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 16_000,
            use_fixture_capture: false,
            fixture_path: String::new(),
        }
    }
}

impl CaptureConfig {
    /// Resolve the fixture path, falling back to the default app-data
    /// location when unset.
    pub fn resolved_fixture_path(&self) -> std::path::PathBuf {
        if self.fixture_path.is_empty() {
            AppPaths::new().default_fixture()
        } else {
            std::path::PathBuf::from(&self.fixture_path)
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voicekey::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Transcription endpoint settings.
    pub transcription: TranscriptionConfig,
    /// Audio capture settings.
    pub capture: CaptureConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify that a default `AppConfig` can be serialised to TOML and
    /// deserialised back without any data loss.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.transcription.endpoint, loaded.transcription.endpoint);
        assert_eq!(original.transcription.auth_token, loaded.transcription.auth_token);
        assert_eq!(original.transcription.model, loaded.transcription.model);
        assert_eq!(original.transcription.language, loaded.transcription.language);
        assert_eq!(
            original.transcription.timeout_secs,
            loaded.transcription.timeout_secs
        );
        assert_eq!(original.capture.sample_rate_hz, loaded.capture.sample_rate_hz);
        assert_eq!(
            original.capture.use_fixture_capture,
            loaded.capture.use_fixture_capture
        );
        assert_eq!(original.capture.fixture_path, loaded.capture.fixture_path);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        let default = AppConfig::default();

        assert_eq!(config.transcription.endpoint, default.transcription.endpoint);
        assert_eq!(config.transcription.model, default.transcription.model);
        assert_eq!(config.capture.sample_rate_hz, default.capture.sample_rate_hz);
        assert!(!config.capture.use_fixture_capture);
    }

    /// Verify default values.
    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert!(cfg.transcription.endpoint.ends_with("/audio/transcriptions"));
        assert_eq!(cfg.transcription.model, "whisper-large-v3");
        assert!(cfg.transcription.auth_token.is_empty());
        assert_eq!(cfg.transcription.timeout_secs, 30);
        assert!(cfg.transcription.language_hint().is_none());
        assert_eq!(cfg.capture.sample_rate_hz, 16_000);
        assert!(!cfg.capture.use_fixture_capture);
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.transcription.endpoint = "https://stt.example.com/v1/transcribe".into();
        cfg.transcription.auth_token = "sk-test".into();
        cfg.transcription.model = "whisper-small".into();
        cfg.transcription.language = "hi".into();
        cfg.transcription.timeout_secs = 10;
        cfg.capture.sample_rate_hz = 44_100;
        cfg.capture.use_fixture_capture = true;
        cfg.capture.fixture_path = "/tmp/canned.wav".into();

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.transcription.endpoint, "https://stt.example.com/v1/transcribe");
        assert_eq!(loaded.transcription.auth_token, "sk-test");
        assert_eq!(loaded.transcription.model, "whisper-small");
        assert_eq!(loaded.transcription.language_hint(), Some("hi"));
        assert_eq!(loaded.transcription.timeout_secs, 10);
        assert_eq!(loaded.capture.sample_rate_hz, 44_100);
        assert!(loaded.capture.use_fixture_capture);
        assert_eq!(
            loaded.capture.resolved_fixture_path(),
            std::path::PathBuf::from("/tmp/canned.wav")
        );
    }

    /// An empty fixture path resolves to the default app-data location.
    #[test]
    fn empty_fixture_path_resolves_to_default() {
        let cfg = CaptureConfig::default();
        let resolved = cfg.resolved_fixture_path();
        assert!(resolved.file_name().is_some_and(|n| n == "recorded.wav"));
    }
}
