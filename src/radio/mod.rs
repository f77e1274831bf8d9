//! Radio source abstraction and the rtl_sdr-backed implementation

mod iq;
mod rtlsdr;

pub use iq::IqConverter;
pub use rtlsdr::RtlSdrSource;

use num_complex::Complex32;
use thiserror::Error;

/// Hardware-level faults. These are never conflated with a
/// synchronization miss: a miss is a normal outcome, a `RadioError`
/// aborts the operation that hit it.
#[derive(Debug, Error)]
pub enum RadioError {
    #[error("failed to start radio process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("no radio device found at index {0}")]
    NoDevice(u32),

    #[error("radio has not been tuned")]
    NotTuned,

    #[error("radio sample stream ended unexpectedly")]
    StreamClosed,

    #[error("radio sample stream stalled (no samples within {0} ms)")]
    StreamStalled(u64),

    #[error("radio i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// A tunable baseband IQ sample source.
///
/// One instance maps to one physical receiver; the owning analyzer is
/// its only user for the process lifetime.
pub trait RadioSource {
    /// Retune the receiver to a new center frequency.
    fn tune(&mut self, freq_hz: f64) -> Result<(), RadioError>;

    /// Adjust the tuner gain.
    fn set_gain(&mut self, gain_db: f32) -> Result<(), RadioError>;

    /// Baseband sample rate in samples per second.
    fn sample_rate(&self) -> f64;

    /// Blocking read of the next buffer of baseband samples. `buf` is
    /// cleared and refilled; returns the number of samples delivered.
    fn read_buffer(&mut self, buf: &mut Vec<Complex32>) -> Result<usize, RadioError>;
}
