//! Real microphone capture via `cpal`, written to a temporary WAV file.
//!
//! `cpal::Stream` is not `Send`, so [`DeviceCapture`] runs a dedicated
//! worker thread that owns the stream for its whole lifetime and services
//! begin/end/abort commands over a channel.  The async trait methods are
//! thin request/reply wrappers around that channel.
//!
//! While a recording is active the cpal callback does three things per
//! buffer: append the samples to the WAV writer, publish the buffer's power
//! in decibels through a shared [`PowerCell`], and — if the writer fails —
//! route an `EncodingError` back to the session machine over the fault
//! channel so the failure lands on the normal transition path.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::{mpsc, oneshot};

use crate::audio::backend::{AudioAsset, CaptureBackend};
use crate::audio::level::{power_db, LevelSource, PowerCell};
use crate::error::PipelineError;

/// A WAV file of exactly this size contains a header and no samples.
const WAV_HEADER_LEN: u64 = 44;

/// Channel for routing asynchronous capture failures (encoding errors from
/// the audio callback) back into the session machine.
pub type FaultSender = mpsc::Sender<PipelineError>;

// ---------------------------------------------------------------------------
// Temp file naming
// ---------------------------------------------------------------------------

static RECORDING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Fresh temp-file path for one recording session.
fn temp_recording_path() -> PathBuf {
    let seq = RECORDING_SEQ.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("recorded-{}-{seq}.wav", std::process::id()))
}

/// Convert a normalized `f32` sample to the 16-bit PCM the WAV writer wants.
fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

// ---------------------------------------------------------------------------
// Worker commands
// ---------------------------------------------------------------------------

enum WorkerCmd {
    Begin {
        reply: oneshot::Sender<Result<LevelSource, PipelineError>>,
    },
    End {
        reply: oneshot::Sender<Result<AudioAsset, PipelineError>>,
    },
    Abort {
        reply: oneshot::Sender<()>,
    },
}

type SharedWriter = Arc<Mutex<Option<hound::WavWriter<BufWriter<File>>>>>;

/// One in-progress recording as held by the worker thread.
struct ActiveRecording {
    // Kept alive for the duration of the recording; dropping it stops the
    // hardware stream.
    _stream: cpal::Stream,
    writer: SharedWriter,
    power: Arc<PowerCell>,
    path: PathBuf,
}

// ---------------------------------------------------------------------------
// DeviceCapture
// ---------------------------------------------------------------------------

/// Capture backend that records the default input device to a WAV temp file.
pub struct DeviceCapture {
    cmd_tx: std::sync::mpsc::Sender<WorkerCmd>,
}

impl DeviceCapture {
    /// Spawn the capture worker thread.
    ///
    /// * `sample_rate_hz` — mono capture rate requested from the device.
    /// * `fault_tx`       — receives `EncodingError`s raised asynchronously
    ///   by the audio callback.
    pub fn new(sample_rate_hz: u32, fault_tx: FaultSender) -> Self {
        let (cmd_tx, cmd_rx) = std::sync::mpsc::channel::<WorkerCmd>();

        std::thread::Builder::new()
            .name("audio-capture".into())
            .spawn(move || worker_loop(cmd_rx, sample_rate_hz, fault_tx))
            .expect("failed to spawn audio-capture thread");

        Self { cmd_tx }
    }

    fn worker_gone() -> PipelineError {
        PipelineError::DeviceConfigurationFailed("capture worker unavailable".into())
    }
}

#[async_trait]
impl CaptureBackend for DeviceCapture {
    async fn begin(&mut self) -> Result<LevelSource, PipelineError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(WorkerCmd::Begin { reply })
            .map_err(|_| Self::worker_gone())?;
        rx.await.map_err(|_| Self::worker_gone())?
    }

    async fn end(&mut self) -> Result<AudioAsset, PipelineError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(WorkerCmd::End { reply })
            .map_err(|_| Self::worker_gone())?;
        rx.await.map_err(|_| Self::worker_gone())?
    }

    async fn abort(&mut self) {
        let (reply, rx) = oneshot::channel();
        if self.cmd_tx.send(WorkerCmd::Abort { reply }).is_ok() {
            let _ = rx.await;
        }
    }
}

// ---------------------------------------------------------------------------
// Worker thread
// ---------------------------------------------------------------------------

fn worker_loop(
    cmd_rx: std::sync::mpsc::Receiver<WorkerCmd>,
    sample_rate_hz: u32,
    fault_tx: FaultSender,
) {
    let mut active: Option<ActiveRecording> = None;

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            WorkerCmd::Begin { reply } => {
                if active.is_some() {
                    // The session machine guards against double-begin; treat
                    // it as a configuration fault rather than silently
                    // stacking streams.
                    let _ = reply.send(Err(PipelineError::DeviceConfigurationFailed(
                        "capture already active".into(),
                    )));
                    continue;
                }

                match start_recording(sample_rate_hz, fault_tx.clone()) {
                    Ok(rec) => {
                        let source = LevelSource::Device(Arc::clone(&rec.power));
                        active = Some(rec);
                        let _ = reply.send(Ok(source));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }

            WorkerCmd::End { reply } => {
                let result = match active.take() {
                    Some(rec) => finish_recording(rec),
                    None => {
                        log::debug!("device capture: end() with no active recording");
                        Err(PipelineError::EmptyRecording)
                    }
                };
                let _ = reply.send(result);
            }

            WorkerCmd::Abort { reply } => {
                if let Some(rec) = active.take() {
                    // Drop the stream first so the callback stops, then
                    // throw away the partial file.
                    drop(rec._stream);
                    discard_partial(&rec.writer, &rec.path);
                    log::debug!("device capture: aborted, device released");
                }
                let _ = reply.send(());
            }
        }
    }
}

/// Close the writer and delete the partial file after a failed or aborted
/// recording.
fn discard_partial(writer: &SharedWriter, path: &std::path::Path) {
    if let Some(w) = writer.lock().ok().and_then(|mut g| g.take()) {
        let _ = w.finalize();
    }
    if let Err(e) = std::fs::remove_file(path) {
        log::debug!("could not remove partial recording {}: {e}", path.display());
    }
}

fn start_recording(
    sample_rate_hz: u32,
    fault_tx: FaultSender,
) -> Result<ActiveRecording, PipelineError> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or_else(|| {
        PipelineError::DeviceConfigurationFailed("no input device on the default host".into())
    })?;

    let config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(sample_rate_hz),
        buffer_size: cpal::BufferSize::Default,
    };

    let path = temp_recording_path();
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: sample_rate_hz,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let writer: SharedWriter = Arc::new(Mutex::new(Some(
        hound::WavWriter::create(&path, spec)
            .map_err(|e| PipelineError::DeviceConfigurationFailed(e.to_string()))?,
    )));

    let power = Arc::new(PowerCell::new());

    let cb_writer = Arc::clone(&writer);
    let cb_power = Arc::clone(&power);
    let cb_fault = fault_tx.clone();

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                cb_power.store(power_db(data));

                let mut guard = match cb_writer.lock() {
                    Ok(g) => g,
                    Err(_) => return,
                };
                if let Some(w) = guard.as_mut() {
                    for &sample in data {
                        if let Err(e) = w.write_sample(to_i16(sample)) {
                            // Stop writing and route the failure onto the
                            // state machine's transition path.
                            let _ =
                                cb_fault.try_send(PipelineError::EncodingError(e.to_string()));
                            *guard = None;
                            return;
                        }
                    }
                }
            },
            move |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
                let _ = fault_tx.try_send(PipelineError::EncodingError(err.to_string()));
            },
            None, // no timeout
        )
        .map_err(|e| {
            discard_partial(&writer, &path);
            match e {
                cpal::BuildStreamError::DeviceNotAvailable => PipelineError::PermissionDenied,
                other => PipelineError::DeviceConfigurationFailed(other.to_string()),
            }
        })?;

    stream.play().map_err(|e| {
        discard_partial(&writer, &path);
        PipelineError::DeviceConfigurationFailed(e.to_string())
    })?;

    log::info!(
        "recording to {} (mono, {} Hz)",
        path.display(),
        sample_rate_hz
    );

    Ok(ActiveRecording {
        _stream: stream,
        writer,
        power,
        path,
    })
}

fn finish_recording(rec: ActiveRecording) -> Result<AudioAsset, PipelineError> {
    // Stop the hardware stream before finalising so no further callbacks
    // race the writer.
    drop(rec._stream);

    let writer = rec
        .writer
        .lock()
        .ok()
        .and_then(|mut g| g.take())
        .ok_or_else(|| PipelineError::EncodingError("recording writer already closed".into()))?;

    writer
        .finalize()
        .map_err(|e| PipelineError::EncodingError(e.to_string()))?;

    let len = std::fs::metadata(&rec.path).map(|m| m.len()).unwrap_or(0);
    if len <= WAV_HEADER_LEN {
        let _ = std::fs::remove_file(&rec.path);
        return Err(PipelineError::EmptyRecording);
    }

    Ok(AudioAsset::recorded(rec.path))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_paths_are_unique_wav_files() {
        let a = temp_recording_path();
        let b = temp_recording_path();
        assert_ne!(a, b);
        assert!(a.extension().is_some_and(|e| e == "wav"));
        assert!(a.starts_with(std::env::temp_dir()));
    }

    #[test]
    fn sample_conversion_clamps() {
        assert_eq!(to_i16(0.0), 0);
        assert_eq!(to_i16(1.0), i16::MAX);
        assert_eq!(to_i16(2.0), i16::MAX);
        assert_eq!(to_i16(-2.0), -i16::MAX);
    }

    /// `DeviceCapture` must be usable behind `Box<dyn CaptureBackend>` from
    /// the session task, which requires `Send`.
    #[test]
    fn device_capture_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<DeviceCapture>();
    }

    /// A recording that fails after the WAV file was created must not leave
    /// the file behind.
    #[test]
    fn discard_partial_removes_the_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("recorded-0-0.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer: SharedWriter = Arc::new(Mutex::new(Some(
            hound::WavWriter::create(&path, spec).expect("create"),
        )));
        assert!(path.exists());

        discard_partial(&writer, &path);

        assert!(!path.exists());
        assert!(writer.lock().unwrap().is_none());
    }

    /// `discard_partial` must be safe to call twice (abort after a failed
    /// start, or a double abort).
    #[test]
    fn discard_partial_is_idempotent() {
        let writer: SharedWriter = Arc::new(Mutex::new(None));
        let path = std::env::temp_dir().join("recorded-nonexistent.wav");
        discard_partial(&writer, &path);
        discard_partial(&writer, &path);
    }
}
