//! Speech-to-text upload.
//!
//! ```text
//!   AudioAsset ──► TranscriptionClient::transcribe ──► Transcript
//!                        │
//!                        └─ HttpTranscriber: multipart POST
//!                           (file + model + optional language)
//! ```

pub mod client;

pub use client::{HttpTranscriber, Transcript, TranscriptionClient};

#[cfg(test)]
pub use client::MockTranscriber;
