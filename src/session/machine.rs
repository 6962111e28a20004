//! Session machine — drives the full press → capture → upload → dispatch loop.
//!
//! [`SessionMachine`] owns the [`SharedState`] and responds to
//! [`SessionMsg`]s received over a `tokio::sync::mpsc` channel.
//!
//! # Session flow
//!
//! ```text
//! SessionMsg::Pressed
//!   └─▶ new session id, clear waveform, capture.begin()   [Recording]
//!
//! SessionMsg::Released
//!   └─▶ capture.end() → spawn(transcriber.transcribe)     [Processing]
//!
//! upload finished
//!   ├─ stale session id or not Processing → ignored
//!   ├─ Ok  → dispatcher.publish, Feedback::Success        [Complete]
//!   └─ Err → status from the error, Feedback::Failure     [Error]
//! ```
//!
//! The amplitude meter lives inside the machine's select loop: while a
//! [`LevelSource`] is held, a 50 ms tick samples it and pushes one bar into
//! the shared waveform.  Encoding faults raised by the capture thread arrive
//! over a dedicated channel and abort the recording in place.
//!
//! [`run`](SessionMachine::run) keeps going until every [`SessionHandle`]
//! has dropped **and** no upload is in flight, so a transcript that arrives
//! during shutdown is still accounted for.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::audio::{CaptureBackend, FaultSender, LevelSource};
use crate::dispatch::{Feedback, TranscriptDispatcher};
use crate::error::PipelineError;
use crate::transcribe::{Transcript, TranscriptionClient};

use super::state::{SessionState, SharedState};

/// Period of the amplitude meter while recording.
pub const METER_PERIOD_MS: u64 = 50;

// ---------------------------------------------------------------------------
// SessionMsg / SessionHandle
// ---------------------------------------------------------------------------

/// Push-to-talk commands processed by the machine loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMsg {
    Pressed,
    Released,
}

/// Cheap-to-clone sender half used by input sources (hotkey listener, UI).
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionMsg>,
}

impl SessionHandle {
    pub fn press(&self) {
        let _ = self.tx.send(SessionMsg::Pressed);
    }

    pub fn release(&self) {
        let _ = self.tx.send(SessionMsg::Released);
    }
}

/// Completion message sent by a detached upload task.
type UploadDone = (u64, Result<Transcript, PipelineError>);

// ---------------------------------------------------------------------------
// SessionMachine
// ---------------------------------------------------------------------------

/// Drives the complete capture session.
///
/// Create with [`SessionMachine::new`], then spawn [`run`](Self::run) as a
/// tokio task and feed it through the returned [`SessionHandle`].
pub struct SessionMachine {
    state: SharedState,
    capture: Box<dyn CaptureBackend>,
    transcriber: Arc<dyn TranscriptionClient>,
    dispatcher: TranscriptDispatcher,

    /// Monotonically increasing id; bumped on every accepted press.  An
    /// upload completion carrying an older id is stale and ignored.
    session_id: u64,

    /// Live meter, present only while recording.
    level: Option<LevelSource>,

    rx: mpsc::UnboundedReceiver<SessionMsg>,

    /// Upload completions.  The machine keeps a sender clone to hand to each
    /// spawned upload task; `pending_uploads` gates the receive branch.
    done_tx: mpsc::UnboundedSender<UploadDone>,
    done_rx: mpsc::UnboundedReceiver<UploadDone>,
    pending_uploads: usize,

    fault_rx: mpsc::Receiver<PipelineError>,
    /// Keeps the fault channel open even when no capture thread is running.
    _fault_tx: FaultSender,
}

impl SessionMachine {
    /// Create a new machine.
    ///
    /// # Arguments
    ///
    /// * `state`       — shared view state (also read by consumers).
    /// * `capture`     — device or fixture capture backend.
    /// * `transcriber` — upload client (e.g. `HttpTranscriber`).
    /// * `dispatcher`  — transcript fan-out; subscribe before passing it in.
    /// * `fault_tx` / `fault_rx` — channel the capture backend reports
    ///   mid-recording encoding faults on.
    pub fn new(
        state: SharedState,
        capture: Box<dyn CaptureBackend>,
        transcriber: Arc<dyn TranscriptionClient>,
        dispatcher: TranscriptDispatcher,
        fault_tx: FaultSender,
        fault_rx: mpsc::Receiver<PipelineError>,
    ) -> (Self, SessionHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let machine = Self {
            state,
            capture,
            transcriber,
            dispatcher,
            session_id: 0,
            level: None,
            rx,
            done_tx,
            done_rx,
            pending_uploads: 0,
            fault_rx,
            _fault_tx: fault_tx,
        };
        (machine, SessionHandle { tx })
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the machine until every [`SessionHandle`] is dropped and no upload
    /// is in flight.  Spawn as a tokio task from `main()`.
    pub async fn run(mut self) {
        let mut meter = tokio::time::interval(Duration::from_millis(METER_PERIOD_MS));
        meter.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut commands_open = true;

        while commands_open || self.pending_uploads > 0 {
            tokio::select! {
                msg = self.rx.recv(), if commands_open => match msg {
                    Some(SessionMsg::Pressed) => self.handle_pressed().await,
                    Some(SessionMsg::Released) => self.handle_released().await,
                    None => commands_open = false,
                },
                done = self.done_rx.recv(), if self.pending_uploads > 0 => {
                    if let Some((session, result)) = done {
                        self.pending_uploads -= 1;
                        self.handle_transcript(session, result);
                    }
                }
                _ = meter.tick(), if self.level.is_some() => self.advance_waveform(),
                fault = self.fault_rx.recv() => {
                    if let Some(error) = fault {
                        self.handle_fault(error).await;
                    }
                }
            }
        }

        log::info!("session: command channel closed, machine shutting down");
    }

    // -----------------------------------------------------------------------
    // Event handlers
    // -----------------------------------------------------------------------

    /// Press: start a fresh session unless one is already recording.
    ///
    /// Pressing from `Processing` supersedes the in-flight upload — its
    /// result will carry the old session id and be dropped on arrival.
    async fn handle_pressed(&mut self) {
        {
            let st = self.state.lock().unwrap();
            if st.state == SessionState::Recording {
                log::debug!("session: press while recording ignored");
                return;
            }
        }

        self.session_id += 1;
        log::debug!("session: Pressed → Recording (session {})", self.session_id);

        match self.capture.begin().await {
            Ok(level) => {
                self.level = Some(level);
                let mut st = self.state.lock().unwrap();
                st.state = SessionState::Recording;
                st.status = SessionState::Recording.status_line().to_string();
                st.waveform.clear();
                st.last_error = None;
            }
            Err(e) => self.fail_session(e),
        }
    }

    /// Release: finish the capture and start the upload.
    async fn handle_released(&mut self) {
        {
            let st = self.state.lock().unwrap();
            if st.state != SessionState::Recording {
                log::debug!("session: release outside recording ignored");
                return;
            }
        }

        self.level = None;
        {
            let mut st = self.state.lock().unwrap();
            st.state = SessionState::Processing;
            st.status = SessionState::Processing.status_line().to_string();
        }

        let asset = match self.capture.end().await {
            Ok(asset) => asset,
            Err(e) => {
                self.fail_session(e);
                return;
            }
        };

        log::debug!(
            "session: Released → Processing ({} bytes captured)",
            asset.byte_len()
        );

        // Upload in a detached task so the loop keeps handling input.
        let session = self.session_id;
        let transcriber = Arc::clone(&self.transcriber);
        let done_tx = self.done_tx.clone();
        self.pending_uploads += 1;
        tokio::spawn(async move {
            let result = transcriber.transcribe(&asset).await;
            asset.discard();
            let _ = done_tx.send((session, result));
        });
    }

    /// An upload finished.  Stale completions are dropped without touching
    /// the current session.
    fn handle_transcript(&mut self, session: u64, result: Result<Transcript, PipelineError>) {
        let current = {
            let st = self.state.lock().unwrap();
            session == self.session_id && st.state == SessionState::Processing
        };
        if !current {
            log::debug!("session: stale transcript for session {session} ignored");
            return;
        }

        match result {
            Ok(transcript) => {
                log::debug!("session: transcript ready ({} chars)", transcript.text.len());
                self.dispatcher.publish(&transcript);
                self.dispatcher.notify(Feedback::Success);

                let mut st = self.state.lock().unwrap();
                st.state = SessionState::Complete;
                st.status = SessionState::Complete.status_line().to_string();
                st.last_transcript = Some(transcript.text);
            }
            Err(e) => self.fail_session(e),
        }
    }

    /// The capture thread reported a mid-recording fault (e.g. a WAV write
    /// failure).  Only a live recording is affected; anything else is stale.
    async fn handle_fault(&mut self, error: PipelineError) {
        {
            let st = self.state.lock().unwrap();
            if st.state != SessionState::Recording {
                log::debug!("session: capture fault outside recording ignored: {error}");
                return;
            }
        }

        log::warn!("session: capture fault while recording: {error}");
        self.level = None;
        self.capture.abort().await;
        self.fail_session(error);
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// One meter tick: sample the level source and push a bar.
    fn advance_waveform(&mut self) {
        if let Some(level) = self.level.as_mut() {
            let value = level.sample();
            self.state.lock().unwrap().waveform.push(value);
        }
    }

    fn fail_session(&mut self, error: PipelineError) {
        log::error!("session error: {error}");
        self.level = None;
        self.dispatcher.notify(Feedback::Failure);

        let mut st = self.state.lock().unwrap();
        st.state = SessionState::Error;
        st.status = error.status_message().to_string();
        st.last_error = Some(error);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
