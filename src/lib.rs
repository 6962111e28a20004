//! voicekey — push-to-talk voice capture and transcription pipeline.
//!
//! Hold to record from the default microphone, release to upload the WAV to
//! an OpenAI-compatible transcription endpoint, and receive the text through
//! a dispatcher any consumer can subscribe to.
//!
//! ```text
//! press ──▶ CaptureBackend ──▶ AudioAsset ──▶ HttpTranscriber ──▶ Transcript
//!              │ (cpal + hound)                 (reqwest multipart)   │
//!              └─▶ LevelSource → waveform bars                        ▼
//!                                                      TranscriptDispatcher
//! ```
//!
//! The [`session`] module ties everything together; see
//! [`session::SessionMachine`] for the orchestration loop.

pub mod audio;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod session;
pub mod transcribe;
