//! Amplitude metering primitives.
//!
//! The device capture callback measures instantaneous power in decibels and
//! publishes it through a [`PowerCell`]; the session machine's meter tick
//! reads it back via a [`LevelSource`] and normalizes it to `[0, 1]` with
//! [`normalized_power`].  Simulated capture substitutes a seeded
//! pseudo-random stream behind the same [`LevelSource`] interface, so the
//! meter never knows which capture variant is active.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Decibel floor below which the meter reads silence.
pub const SILENCE_FLOOR_DB: f32 = -80.0;

// ---------------------------------------------------------------------------
// normalized_power
// ---------------------------------------------------------------------------

/// Convert a decibel power reading to a linear level in `[0.0, 1.0]`.
///
/// `-80 dB` (and anything quieter) maps to `0.0`; `0 dB` maps to `1.0`;
/// in between the conversion is `10^(dB/20)`, clamped.  Monotonic over the
/// whole input range.
///
/// ```
/// use voicekey::audio::normalized_power;
///
/// assert_eq!(normalized_power(-80.0), 0.0);
/// assert_eq!(normalized_power(0.0), 1.0);
/// assert!(normalized_power(-20.0) < normalized_power(-6.0));
/// ```
pub fn normalized_power(decibels: f32) -> f32 {
    if decibels <= SILENCE_FLOOR_DB {
        return 0.0;
    }
    let linear = 10.0_f32.powf(decibels / 20.0);
    linear.clamp(0.0, 1.0)
}

/// Decibel power of a buffer of PCM samples in `[-1.0, 1.0]`.
///
/// Returns [`SILENCE_FLOOR_DB`] for empty or all-zero input so the meter
/// reads silence rather than negative infinity.
pub fn power_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return SILENCE_FLOOR_DB;
    }
    let mean_sq: f32 = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    let rms = mean_sq.sqrt();
    if rms <= 0.0 {
        return SILENCE_FLOOR_DB;
    }
    (20.0 * rms.log10()).max(SILENCE_FLOOR_DB)
}

// ---------------------------------------------------------------------------
// PowerCell
// ---------------------------------------------------------------------------

/// Lock-free cell holding the most recent power reading in decibels.
///
/// Written by the real-time audio callback (which must never block) and read
/// by the meter tick on the session task.  The `f32` is stored as its bit
/// pattern in an `AtomicU32`.
#[derive(Debug)]
pub struct PowerCell {
    bits: AtomicU32,
}

impl PowerCell {
    /// New cell reading silence.
    pub fn new() -> Self {
        Self {
            bits: AtomicU32::new(SILENCE_FLOOR_DB.to_bits()),
        }
    }

    /// Publish a new decibel reading.
    pub fn store(&self, db: f32) {
        self.bits.store(db.to_bits(), Ordering::Relaxed);
    }

    /// Latest decibel reading.
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl Default for PowerCell {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// LevelSource
// ---------------------------------------------------------------------------

/// Per-tick amplitude source handed out by [`CaptureBackend::begin`].
///
/// Both capture variants deliver samples through this one type, so the
/// session machine's metering loop is agnostic to which backend is active.
///
/// [`CaptureBackend::begin`]: crate::audio::CaptureBackend::begin
#[derive(Debug)]
pub enum LevelSource {
    /// Real metering: read the device callback's latest dB value and
    /// normalize it.
    Device(Arc<PowerCell>),
    /// Synthetic metering for the fixture path: a seeded xorshift stream of
    /// plausible levels in `[0, 1]`.
    Synthetic(SyntheticLevel),
}

impl LevelSource {
    /// Produce the next normalized amplitude sample in `[0.0, 1.0]`.
    pub fn sample(&mut self) -> f32 {
        match self {
            LevelSource::Device(cell) => normalized_power(cell.load()),
            LevelSource::Synthetic(gen) => gen.next(),
        }
    }
}

// ---------------------------------------------------------------------------
// SyntheticLevel
// ---------------------------------------------------------------------------

/// Xorshift-based pseudo-random level generator for simulated capture.
#[derive(Debug)]
pub struct SyntheticLevel {
    state: u64,
}

impl SyntheticLevel {
    /// Seeded generator.  A zero seed is remapped since xorshift must not
    /// start from zero.
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    /// Generator seeded from the current time.
    pub fn from_clock() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u64 | 1)
            .unwrap_or(1);
        Self::new(nanos)
    }

    /// Next value in `[0.0, 1.0]`.
    pub fn next(&mut self) -> f32 {
        // xorshift64
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        (x >> 40) as f32 / (1u64 << 24) as f32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
