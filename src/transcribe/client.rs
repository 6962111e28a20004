//! Core `TranscriptionClient` trait and the HTTP implementation.
//!
//! `HttpTranscriber` speaks the OpenAI-compatible `audio/transcriptions`
//! wire format: one multipart POST carrying the audio bytes, the model
//! identifier and an optional language hint, authorised with a bearer
//! token.  All connection details come from
//! [`TranscriptionConfig`](crate::config::TranscriptionConfig); nothing is
//! hardcoded.

use async_trait::async_trait;
use serde::Deserialize;

use crate::audio::AudioAsset;
use crate::config::TranscriptionConfig;
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// The finished transcript for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    /// The transcribed text.
    pub text: String,
    /// Opaque request id from the backend, when it sends one.
    pub request_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Response body of the transcription endpoint.
///
/// Only `text` is required; any additional fields the service adds over time
/// are ignored, and the nested request-id object is optional.
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
    #[serde(default)]
    x_groq: Option<RequestRef>,
}

#[derive(Debug, Default, Deserialize)]
struct RequestRef {
    #[serde(default)]
    id: Option<String>,
}

// ---------------------------------------------------------------------------
// TranscriptionClient trait
// ---------------------------------------------------------------------------

/// Async interface for turning a captured [`AudioAsset`] into text.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// behind an `Arc<dyn TranscriptionClient>`.
#[async_trait]
pub trait TranscriptionClient: Send + Sync {
    /// Upload `asset` and return the transcript.
    ///
    /// An empty or missing asset must fail with
    /// [`PipelineError::EmptyRecording`] before any network I/O happens.
    async fn transcribe(&self, asset: &AudioAsset) -> Result<Transcript, PipelineError>;
}

// ---------------------------------------------------------------------------
// HttpTranscriber
// ---------------------------------------------------------------------------

/// Production client that POSTs the recording as multipart form data.
pub struct HttpTranscriber {
    client: reqwest::Client,
    config: TranscriptionConfig,
}

impl HttpTranscriber {
    /// Build a transcriber from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &TranscriptionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl TranscriptionClient for HttpTranscriber {
    async fn transcribe(&self, asset: &AudioAsset) -> Result<Transcript, PipelineError> {
        // Reject empty/missing audio before touching the network.
        if asset.byte_len() == 0 {
            return Err(PipelineError::EmptyRecording);
        }
        let bytes = asset.read_bytes()?;

        let file_part = reqwest::multipart::Part::bytes(bytes)
            .file_name(asset.file_name())
            .mime_str(&asset.mime())
            .map_err(|e| PipelineError::DecodeError(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.config.model.clone());

        if let Some(lang) = self.config.language_hint() {
            form = form.text("language", lang.to_string());
        }

        log::debug!(
            "uploading {} bytes to {} (model {})",
            asset.byte_len(),
            self.config.endpoint,
            self.config.model
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.auth_token)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::DecodeError(e.to_string()))?;

        Ok(Transcript {
            text: parsed.text,
            request_id: parsed.x_groq.and_then(|r| r.id),
        })
    }
}

// ---------------------------------------------------------------------------
// MockTranscriber  (test-only)
// ---------------------------------------------------------------------------

/// Test double that counts calls, returns a pre-configured result, and can
/// optionally hold its response until released — used to exercise the
/// stale-transcript path in the session machine tests.
#[cfg(test)]
pub struct MockTranscriber {
    result: Result<Transcript, PipelineError>,
    pub calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    gate: Option<std::sync::Arc<tokio::sync::Notify>>,
}

#[cfg(test)]
impl MockTranscriber {
    /// Mock that immediately succeeds with `text`.
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            result: Ok(Transcript {
                text: text.into(),
                request_id: None,
            }),
            calls: Default::default(),
            gate: None,
        }
    }

    /// Mock that immediately fails with `error`.
    pub fn err(error: PipelineError) -> Self {
        Self {
            result: Err(error),
            calls: Default::default(),
            gate: None,
        }
    }

    /// Mock that succeeds with `text`, but only after `gate` is notified.
    pub fn ok_gated(text: impl Into<String>, gate: std::sync::Arc<tokio::sync::Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::ok(text)
        }
    }
}

#[cfg(test)]
#[async_trait]
impl TranscriptionClient for MockTranscriber {
    async fn transcribe(&self, _asset: &AudioAsset) -> Result<Transcript, PipelineError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.result.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn make_config(endpoint: &str) -> TranscriptionConfig {
        TranscriptionConfig {
            endpoint: endpoint.into(),
            auth_token: "sk-test".into(),
            model: "whisper-large-v3".into(),
            language: String::new(),
            timeout_secs: 2,
        }
    }

    // ---- response parsing ---

    #[test]
    fn minimal_response_parses() {
        let parsed: TranscriptionResponse =
            serde_json::from_str(r#"{"text": "hello world"}"#).expect("parse");
        assert_eq!(parsed.text, "hello world");
        assert!(parsed.x_groq.is_none());
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let parsed: TranscriptionResponse = serde_json::from_str(
            r#"{"text": "hi", "task": "transcribe", "duration": 1.5, "segments": []}"#,
        )
        .expect("parse");
        assert_eq!(parsed.text, "hi");
    }

    #[test]
    fn nested_request_id_is_extracted() {
        let parsed: TranscriptionResponse = serde_json::from_str(
            r#"{"text": "hi", "x_groq": {"id": "req_123", "extra": true}}"#,
        )
        .expect("parse");
        assert_eq!(parsed.x_groq.and_then(|r| r.id).as_deref(), Some("req_123"));
    }

    #[test]
    fn missing_text_fails_to_parse() {
        let result: Result<TranscriptionResponse, _> =
            serde_json::from_str(r#"{"task": "transcribe"}"#);
        assert!(result.is_err());
    }

    // ---- HttpTranscriber ---

    #[test]
    fn from_config_builds_without_panic() {
        let _client = HttpTranscriber::from_config(&make_config("http://localhost:1"));
    }

    /// Verify that `HttpTranscriber` is object-safe behind the trait.
    #[test]
    fn transcriber_is_object_safe() {
        let client: Box<dyn TranscriptionClient> =
            Box::new(HttpTranscriber::from_config(&make_config("http://localhost:1")));
        drop(client);
    }

    /// Empty audio must short-circuit to `EmptyRecording` — the endpoint here
    /// is unreachable, so reaching the network would fail with
    /// `NetworkError` instead.
    #[tokio::test]
    async fn empty_asset_is_rejected_before_the_network() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("recorded.wav");
        std::fs::write(&path, b"").expect("write");

        let client = HttpTranscriber::from_config(&make_config("http://127.0.0.1:9"));
        let err = client
            .transcribe(&AudioAsset::recorded(path))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptyRecording));
    }

    /// A missing file counts as empty and must also never hit the network.
    #[tokio::test]
    async fn missing_asset_is_rejected_before_the_network() {
        let client = HttpTranscriber::from_config(&make_config("http://127.0.0.1:9"));
        let asset = AudioAsset::recorded(PathBuf::from("/nonexistent/recorded.wav"));
        let err = client.transcribe(&asset).await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyRecording));
    }

    /// A connection failure surfaces as `NetworkError`.
    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("recorded.wav");
        std::fs::write(&path, b"RIFF....WAVEdata").expect("write");

        // Port 1 is never listening; connect is refused immediately.
        let client = HttpTranscriber::from_config(&make_config("http://127.0.0.1:1/v1"));
        let err = client
            .transcribe(&AudioAsset::recorded(path))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NetworkError(_)), "got {err:?}");
    }

    // ---- MockTranscriber ---

    #[tokio::test]
    async fn mock_counts_calls() {
        let mock = MockTranscriber::ok("hello");
        let asset = AudioAsset::fixture(PathBuf::from("/tmp/fixture.wav"));
        let t = mock.transcribe(&asset).await.expect("ok");
        assert_eq!(t.text, "hello");
        assert_eq!(mock.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gated_mock_waits_for_release() {
        let gate = std::sync::Arc::new(tokio::sync::Notify::new());
        let mock = MockTranscriber::ok_gated("late", std::sync::Arc::clone(&gate));
        let asset = AudioAsset::fixture(PathBuf::from("/tmp/fixture.wav"));

        let pending = mock.transcribe(&asset);
        tokio::pin!(pending);

        // Not ready until the gate opens.
        assert!(
            tokio::time::timeout(std::time::Duration::from_millis(20), &mut pending)
                .await
                .is_err()
        );
        gate.notify_one();
        let t = pending.await.expect("released");
        assert_eq!(t.text, "late");
    }
}
