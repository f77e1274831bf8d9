//! Configuration loaded from environment variables

use std::path::PathBuf;

/// Operational knobs not covered by the command line
#[derive(Debug, Clone)]
pub struct Config {
    /// RTL-SDR device index
    pub device_index: u32,

    /// Tuner gain in dB
    pub gain_db: f32,

    /// PPM frequency correction applied by the tuner
    pub ppm_error: i32,

    /// Path to the rtl_sdr executable
    pub rtl_sdr_path: PathBuf,

    /// Receiver master clock in Hz
    pub master_clock_hz: u32,

    /// Decimation applied to the master clock to get the sample rate
    pub decimation: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            device_index: std::env::var("DEVICE_INDEX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),

            gain_db: std::env::var("DEVICE_GAIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(49.6),

            ppm_error: std::env::var("PPM_ERROR")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),

            rtl_sdr_path: std::env::var("RTL_SDR_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("rtl_sdr")),

            master_clock_hz: std::env::var("MASTER_CLOCK_HZ")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(26_000_000),

            decimation: std::env::var("DECIMATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(24), // 26 MHz / 24 = 4x the GSM symbol rate
        }
    }

    /// Baseband sample rate in samples per second
    pub fn sample_rate(&self) -> f64 {
        f64::from(self.master_clock_hz) / f64::from(self.decimation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sample_rate_is_four_samples_per_symbol() {
        let config = Config {
            device_index: 0,
            gain_db: 49.6,
            ppm_error: 0,
            rtl_sdr_path: PathBuf::from("rtl_sdr"),
            master_clock_hz: 26_000_000,
            decimation: 24,
        };
        let sps = config.sample_rate() / crate::sync::GSM_SYMBOL_RATE;
        assert!((sps - 4.0).abs() < 0.01, "expected ~4 samples/symbol, got {sps}");
    }
}
