//! FCCH tone detection
//!
//! The FCCH burst is 148 symbols of all-zero bits, which GMSK turns into
//! an unmodulated tone at +1/4 symbol rate from the carrier. In baseband
//! that shows up as a window where the sample-to-sample phase increment
//! is nearly constant. Detection scans for the burst-length window with
//! the lowest phase-increment variance, gated on power against an
//! adaptive noise floor.

use std::f64::consts::TAU;

use num_complex::Complex32;
use tracing::trace;

use super::{FCCH_BURST_SYMBOLS, FCCH_TONE_OFFSET_HZ, GSM_SYMBOL_RATE};

/// Maximum phase-increment variance (rad^2) for a window to count as a tone
const MAX_TONE_VARIANCE: f64 = 0.05;

/// Power margin a candidate window must have over the noise floor
const POWER_MARGIN: f64 = 2.0;

/// Widest believable error between the measured tone and the nominal
/// FCCH position; anything further off is some other emission.
const MAX_OFFSET_HZ: f64 = 40_000.0;

/// A detected FCCH tone window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneHit {
    /// Sample index where the burst window starts
    pub burst_start: usize,
    /// Measured tone error relative to the nominal FCCH position
    pub frequency_offset_hz: f64,
    /// Phase-increment variance of the window (lower is cleaner)
    pub variance: f64,
}

pub struct FcchDetector {
    sample_rate: f64,
    window: usize,
    /// Adaptive noise floor (exponential moving average of buffer power)
    noise_floor: f64,
    buffers_seen: u64,
}

impl FcchDetector {
    pub fn new(sample_rate: f64) -> Self {
        let samples_per_symbol = sample_rate / GSM_SYMBOL_RATE;
        let window = (FCCH_BURST_SYMBOLS as f64 * samples_per_symbol) as usize;
        Self {
            sample_rate,
            window,
            noise_floor: 0.0,
            buffers_seen: 0,
        }
    }

    /// Burst window length in samples
    pub fn window_len(&self) -> usize {
        self.window
    }

    /// Drop per-channel adaptation so one channel's noise estimate does
    /// not leak into the next.
    pub fn reset(&mut self) {
        self.noise_floor = 0.0;
        self.buffers_seen = 0;
    }

    /// Search one buffer for an FCCH tone window
    pub fn search(&mut self, samples: &[Complex32]) -> Option<ToneHit> {
        if samples.len() < self.window + 1 {
            return None;
        }

        let mean_power: f64 = samples
            .iter()
            .map(|s| f64::from(s.norm_sqr()))
            .sum::<f64>()
            / samples.len() as f64;

        if self.buffers_seen == 0 {
            self.noise_floor = mean_power;
        } else {
            self.noise_floor = self.noise_floor * 0.9 + mean_power * 0.1;
        }
        self.buffers_seen += 1;

        // Phase increment between consecutive samples, with prefix sums
        // for O(1) window statistics.
        let n = samples.len() - 1;
        let mut sum = vec![0.0f64; n + 1];
        let mut sum_sq = vec![0.0f64; n + 1];
        let mut pow_sum = vec![0.0f64; n + 1];
        for i in 0..n {
            let d = f64::from((samples[i + 1] * samples[i].conj()).arg());
            sum[i + 1] = sum[i] + d;
            sum_sq[i + 1] = sum_sq[i] + d * d;
            pow_sum[i + 1] = pow_sum[i] + f64::from(samples[i].norm_sqr());
        }

        let w = self.window;
        let count = w as f64;
        let mut best: Option<ToneHit> = None;

        for start in 0..=(n - w) {
            let mean = (sum[start + w] - sum[start]) / count;
            let variance = (sum_sq[start + w] - sum_sq[start]) / count - mean * mean;
            if variance > MAX_TONE_VARIANCE {
                continue;
            }

            let window_power = (pow_sum[start + w] - pow_sum[start]) / count;
            if window_power < self.noise_floor * POWER_MARGIN {
                continue;
            }

            let tone_hz = mean * self.sample_rate / TAU;
            let offset = tone_hz - FCCH_TONE_OFFSET_HZ;
            if offset.abs() > MAX_OFFSET_HZ {
                continue;
            }

            if best.map_or(true, |b| variance < b.variance) {
                best = Some(ToneHit {
                    burst_start: start,
                    frequency_offset_hz: offset,
                    variance,
                });
            }
        }

        if let Some(hit) = &best {
            trace!(
                "tone window at sample {}: offset {:+.1} Hz, variance {:.2e}",
                hit.burst_start,
                hit.frequency_offset_hz,
                hit.variance
            );
        }

        best
    }

    /// Re-estimate the tone over the interior of a found burst, away
    /// from the ramp-up and ramp-down edges.
    pub fn refine(&self, samples: &[Complex32], hit: &ToneHit) -> f64 {
        let margin = self.window / 8;
        let start = hit.burst_start + margin;
        let end = (hit.burst_start + self.window - margin).min(samples.len().saturating_sub(1));
        if end <= start + 1 {
            return hit.frequency_offset_hz;
        }

        let mut acc = 0.0f64;
        for i in start..end {
            acc += f64::from((samples[i + 1] * samples[i].conj()).arg());
        }
        let mean = acc / (end - start) as f64;
        mean * self.sample_rate / TAU - FCCH_TONE_OFFSET_HZ
    }
}
