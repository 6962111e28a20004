//! Session state machine types and shared view state.
//!
//! [`SessionState`] drives the capture machine.  The UI (or any consumer)
//! reads it via [`SharedState`] to render the current phase, status line and
//! live waveform.
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<SessionView>>` — cheap to
//! clone and safe to share across threads.

use std::sync::{Arc, Mutex};

use crate::audio::WaveformBuffer;
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Status lines
// ---------------------------------------------------------------------------

pub const STATUS_IDLE: &str = "Press and hold to speak";
pub const STATUS_RECORDING: &str = "Recording...";
pub const STATUS_PROCESSING: &str = "Processing...";
pub const STATUS_COMPLETE: &str = "Inserted text";

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// States of a push-to-talk capture session.
///
/// The state machine transitions are:
///
/// ```text
/// Idle ──press───▶ Recording ──release──▶ Processing
///                                           ├─ transcript ──▶ Complete
///                                           └─ error ───────▶ Error
/// Complete / Error / Processing ──press──▶ Recording   (new session)
/// ```
///
/// A press while already `Recording` is a no-op; a release anywhere but
/// `Recording` is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the user to press and hold.
    Idle,

    /// Microphone is live; levels feed the waveform.
    Recording,

    /// Audio captured; the upload is in flight.
    Processing,

    /// A transcript was produced and dispatched.
    Complete,

    /// The session failed.  The next press starts a fresh session.
    Error,
}

impl SessionState {
    /// Returns `true` while audio is being captured or uploaded.
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Recording | SessionState::Processing)
    }

    /// Short human-readable label for logs and status displays.
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Recording => "Recording",
            SessionState::Processing => "Processing",
            SessionState::Complete => "Complete",
            SessionState::Error => "Error",
        }
    }

    /// The status line shown for this state.
    ///
    /// `Error` has no fixed line — the message comes from the
    /// [`PipelineError`](crate::error::PipelineError) that caused it.
    pub fn status_line(&self) -> &'static str {
        match self {
            SessionState::Idle => STATUS_IDLE,
            SessionState::Recording => STATUS_RECORDING,
            SessionState::Processing => STATUS_PROCESSING,
            SessionState::Complete => STATUS_COMPLETE,
            SessionState::Error => "",
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle
    }
}

// ---------------------------------------------------------------------------
// SessionView
// ---------------------------------------------------------------------------

/// Shared view state — the single source of truth for consumers.
///
/// Held behind [`SharedState`].  The session machine mutates it; readers
/// sample it whenever they need to render.
pub struct SessionView {
    /// Current phase of the capture session.
    pub state: SessionState,

    /// Status line matching the current phase (or the error message).
    pub status: String,

    /// Live level bars, always [`WAVEFORM_BARS`](crate::audio::WAVEFORM_BARS)
    /// entries.  Advances only while recording; cleared when a new session
    /// starts.
    pub waveform: WaveformBuffer,

    /// Text of the most recent successful session.
    ///
    /// `None` until at least one session completes.
    pub last_transcript: Option<String>,

    /// The error behind `state == SessionState::Error`.
    pub last_error: Option<PipelineError>,
}

impl SessionView {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            status: STATUS_IDLE.to_string(),
            waveform: WaveformBuffer::new(),
            last_transcript: None,
            last_error: None,
        }
    }
}

impl Default for SessionView {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`SessionView`].
///
/// Cheap to clone (`Arc` clone).  Lock for a short critical section; do
/// **not** hold the lock across `.await` points.
pub type SharedState = Arc<Mutex<SessionView>>;

/// Construct a new [`SharedState`] wrapping a default [`SessionView`].
pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(SessionView::new()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
