//! Per-channel synchronization
//!
//! A state machine drives one synchronization attempt per channel:
//! detect whether a usable carrier exists at a frequency and measure the
//! receiver's offset against it.

mod fcch;
mod machine;

pub use machine::GsmSync;

use crate::radio::{RadioError, RadioSource};

/// GSM symbol rate (270.833 kHz)
pub const GSM_SYMBOL_RATE: f64 = 1_625_000.0 / 6.0;

/// The FCCH burst is a pure tone one quarter of the symbol rate above
/// the carrier.
pub const FCCH_TONE_OFFSET_HZ: f64 = GSM_SYMBOL_RATE / 4.0;

/// Useful tone portion of the FCCH burst, in symbols
pub const FCCH_BURST_SYMBOLS: usize = 148;

/// Outcome of one synchronization attempt.
///
/// A miss is a normal result; radio faults travel separately as
/// [`RadioError`] so a dead receiver is never mistaken for an idle
/// channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncOutcome {
    Locked {
        /// Receiver frequency error relative to the nominal carrier
        frequency_offset_hz: f64,
        /// Sample index of the burst start within the examined buffer
        burst_start: usize,
    },
    NotFound,
}

/// One synchronization attempt per call.
///
/// Implementations tune the radio to `freq_hz` and drive their step
/// sequence against it. Every call starts from a fresh session; no
/// timing or frequency estimate carries over from previous channels.
pub trait SyncStateMachine {
    fn execute(
        &mut self,
        freq_hz: f64,
        radio: &mut dyn RadioSource,
    ) -> Result<SyncOutcome, RadioError>;
}
