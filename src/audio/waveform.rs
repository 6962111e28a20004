//! Live waveform data for the recording visualisation.
//!
//! [`WaveformBuffer`] is a fixed-width FIFO of normalized amplitude samples.
//! The session machine pushes one sample per meter tick; the presentation
//! layer reads the whole window at its own cadence to draw the bars.
//!
//! # Example
//!
//! ```rust
//! use voicekey::audio::WaveformBuffer;
//!
//! let mut buf = WaveformBuffer::new();
//! buf.push(0.8);
//! // The window stays exactly 40 samples wide; the oldest is evicted.
//! assert_eq!(buf.samples().len(), 40);
//! assert_eq!(buf.samples()[39], 0.8);
//! ```

use std::collections::VecDeque;

/// Number of bars in the waveform window.  40 is smooth and cheap to draw.
pub const WAVEFORM_BARS: usize = 40;

// ---------------------------------------------------------------------------
// WaveformBuffer
// ---------------------------------------------------------------------------

/// Fixed-width FIFO of normalized amplitude samples in `[0.0, 1.0]`.
///
/// The buffer is pre-filled with zeros so its length is exactly
/// [`WAVEFORM_BARS`] at every instant — a push appends the new sample and
/// evicts the oldest one.
#[derive(Debug, Clone)]
pub struct WaveformBuffer {
    samples: VecDeque<f32>,
}

impl WaveformBuffer {
    /// Create a buffer pre-filled with silence.
    pub fn new() -> Self {
        Self {
            samples: std::iter::repeat(0.0).take(WAVEFORM_BARS).collect(),
        }
    }

    /// Append a normalized sample, evicting the oldest.
    ///
    /// The value is clamped to `[0.0, 1.0]` so a misbehaving source can
    /// never push the visualisation out of range.
    pub fn push(&mut self, value: f32) {
        self.samples.pop_front();
        self.samples.push_back(value.clamp(0.0, 1.0));
    }

    /// Reset the whole window to silence.
    pub fn clear(&mut self) {
        for s in self.samples.iter_mut() {
            *s = 0.0;
        }
    }

    /// Snapshot of the window, oldest sample first.
    pub fn samples(&self) -> Vec<f32> {
        self.samples.iter().copied().collect()
    }

    /// Number of samples (always [`WAVEFORM_BARS`]).
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Peak sample value across the window.
    pub fn peak(&self) -> f32 {
        self.samples.iter().copied().fold(0.0_f32, f32::max)
    }
}

impl Default for WaveformBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_silent_and_full_width() {
        let buf = WaveformBuffer::new();
        assert_eq!(buf.len(), WAVEFORM_BARS);
        assert!(buf.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn length_is_constant_under_pushes() {
        let mut buf = WaveformBuffer::new();
        for i in 0..100 {
            buf.push(i as f32 / 100.0);
            assert_eq!(buf.len(), WAVEFORM_BARS);
        }
    }

    #[test]
    fn push_appends_at_the_end() {
        let mut buf = WaveformBuffer::new();
        buf.push(0.5);
        let samples = buf.samples();
        assert_eq!(samples[WAVEFORM_BARS - 1], 0.5);
        assert_eq!(samples[WAVEFORM_BARS - 2], 0.0);
    }

    #[test]
    fn oldest_sample_is_evicted_first() {
        let mut buf = WaveformBuffer::new();
        // Fill the window completely, then push one more.
        for i in 0..WAVEFORM_BARS {
            buf.push((i + 1) as f32 / 100.0);
        }
        buf.push(0.99);
        let samples = buf.samples();
        // First push (0.01) is gone; second push is now the oldest.
        assert_eq!(samples[0], 0.02);
        assert_eq!(samples[WAVEFORM_BARS - 1], 0.99);
    }

    #[test]
    fn values_are_clamped_to_unit_range() {
        let mut buf = WaveformBuffer::new();
        buf.push(3.0);
        buf.push(-1.0);
        let samples = buf.samples();
        assert_eq!(samples[WAVEFORM_BARS - 2], 1.0);
        assert_eq!(samples[WAVEFORM_BARS - 1], 0.0);
    }

    #[test]
    fn clear_resets_to_silence() {
        let mut buf = WaveformBuffer::new();
        buf.push(0.7);
        buf.push(0.9);
        buf.clear();
        assert_eq!(buf.len(), WAVEFORM_BARS);
        assert!(buf.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn peak_reflects_max_sample() {
        let mut buf = WaveformBuffer::new();
        buf.push(0.3);
        buf.push(0.8);
        buf.push(0.1);
        assert!((buf.peak() - 0.8).abs() < f32::EPSILON);
    }
}
