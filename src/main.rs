//! Application entry point — voicekey console harness.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Pick the capture backend: real microphone, or the bundled fixture
//!    when `capture.use_fixture_capture` is set.
//! 4. Build the transcription client from config.
//! 5. Subscribe transcript and feedback consumers.
//! 6. Spawn the session machine.
//! 7. Drive push-to-talk from stdin: Enter toggles press/release, `q` quits.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use voicekey::audio::{CaptureBackend, DeviceCapture, FixtureCapture};
use voicekey::config::AppConfig;
use voicekey::dispatch::{Feedback, TranscriptDispatcher};
use voicekey::session::{new_shared_state, SessionMachine, SessionState};
use voicekey::transcribe::HttpTranscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Config
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Could not load config ({e}), using defaults");
        AppConfig::default()
    });

    if config.transcription.auth_token.is_empty() {
        log::warn!("transcription.auth_token is empty — uploads will be rejected");
    }

    // 3. Capture backend + fault channel
    let (fault_tx, fault_rx) = mpsc::channel(8);
    let capture: Box<dyn CaptureBackend> = if config.capture.use_fixture_capture {
        let path = config.capture.resolved_fixture_path();
        log::info!("Using fixture capture: {}", path.display());
        Box::new(FixtureCapture::new(path))
    } else {
        log::info!(
            "Using device capture ({} Hz mono)",
            config.capture.sample_rate_hz
        );
        Box::new(DeviceCapture::new(
            config.capture.sample_rate_hz,
            fault_tx.clone(),
        ))
    };

    // 4. Transcription client
    let transcriber = Arc::new(HttpTranscriber::from_config(&config.transcription));
    log::info!(
        "Transcription endpoint: {} (model {})",
        config.transcription.endpoint,
        config.transcription.model
    );

    // 5. Consumers
    let mut dispatcher = TranscriptDispatcher::new();
    let mut transcripts = dispatcher.subscribe();
    let mut feedback = dispatcher.subscribe_feedback();

    tokio::spawn(async move {
        while let Some(transcript) = transcripts.recv().await {
            match &transcript.request_id {
                Some(id) => println!(">> {}   [{}]", transcript.text, id),
                None => println!(">> {}", transcript.text),
            }
        }
    });
    tokio::spawn(async move {
        while let Some(pulse) = feedback.recv().await {
            if pulse == Feedback::Failure {
                log::warn!("session ended in error");
            }
        }
    });

    // 6. Session machine
    let state = new_shared_state();
    let (machine, handle) = SessionMachine::new(
        state.clone(),
        capture,
        transcriber,
        dispatcher,
        fault_tx,
        fault_rx,
    );
    let machine_task = tokio::spawn(machine.run());

    // 7. stdin loop
    println!("Press and hold to speak  (Enter = press/release, q = quit)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == "q" {
            break;
        }

        let recording = state.lock().unwrap().state == SessionState::Recording;
        if recording {
            handle.release();
        } else {
            handle.press();
        }

        // Give the machine a beat, then show where we landed.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let st = state.lock().unwrap();
        println!("[{}] {}", st.state.label(), st.status);
    }

    drop(handle);
    machine_task.await?;
    Ok(())
}
