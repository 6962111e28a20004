//! Push-to-talk session orchestration.
//!
//! This module wires the full press → capture → upload → dispatch loop and
//! exposes the shared state that consumers read.
//!
//! # Architecture
//!
//! ```text
//! SessionMsg (mpsc)
//!        │
//!        ▼
//! SessionMachine::run()  ← async tokio task
//!        │
//!        ├─ Pressed  → capture.begin(), clear waveform     [Recording]
//!        │              └─ 50 ms tick: LevelSource → waveform bars
//!        │
//!        └─ Released → capture.end()                       [Processing]
//!              └─ spawn(TranscriptionClient::transcribe)
//!                    ├─ Ok  → TranscriptDispatcher.publish [Complete]
//!                    └─ Err → status from PipelineError    [Error]
//!
//! SharedState (Arc<Mutex<SessionView>>) ←─── sampled by consumers
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use voicekey::audio::FixtureCapture;
//! use voicekey::config::AppConfig;
//! use voicekey::dispatch::TranscriptDispatcher;
//! use voicekey::session::{new_shared_state, SessionMachine};
//! use voicekey::transcribe::HttpTranscriber;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let state = new_shared_state();
//!
//!     let mut dispatcher = TranscriptDispatcher::new();
//!     let mut transcripts = dispatcher.subscribe();
//!
//!     let capture = FixtureCapture::new("fixtures/recorded.wav".into());
//!     let transcriber = Arc::new(HttpTranscriber::from_config(&config.transcription));
//!
//!     let (fault_tx, fault_rx) = mpsc::channel(8);
//!     let (machine, handle) = SessionMachine::new(
//!         state.clone(),
//!         Box::new(capture),
//!         transcriber,
//!         dispatcher,
//!         fault_tx,
//!         fault_rx,
//!     );
//!     tokio::spawn(machine.run());
//!
//!     handle.press();
//!     // ... hold ...
//!     handle.release();
//!
//!     if let Some(t) = transcripts.recv().await {
//!         println!("{}", t.text);
//!     }
//! }
//! ```

pub mod machine;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use machine::{SessionHandle, SessionMachine, SessionMsg, METER_PERIOD_MS};
pub use state::{
    new_shared_state, SessionState, SessionView, SharedState, STATUS_COMPLETE, STATUS_IDLE,
    STATUS_PROCESSING, STATUS_RECORDING,
};
