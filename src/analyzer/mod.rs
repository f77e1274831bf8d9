//! Technology analyzers: scan a band for base stations or calibrate
//! against one known channel.

mod gsm;
mod lte;
mod umts;

pub use gsm::GsmAnalyzer;
pub use lte::LteAnalyzer;
pub use umts::UmtsAnalyzer;

use indexmap::IndexMap;
use thiserror::Error;

use crate::band::{BandIndicator, Technology};
use crate::radio::{RadioError, RadioSource};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("band not defined")]
    UndefinedBand,

    #[error("{0} is not yet supported")]
    Unsupported(BandIndicator),

    #[error("frequency {freq_hz:.0} Hz is outside the {band} downlink range")]
    FrequencyOutOfRange { freq_hz: f64, band: BandIndicator },

    #[error("calibrate_frequency called before set_frequency")]
    NotTuned,

    #[error("no reference burst found at the tuned frequency")]
    NoSignal,

    #[error(transparent)]
    Radio(#[from] RadioError),
}

/// Record kept per locked channel during a scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelRecord {
    pub freq_hz: f64,
    pub frequency_offset_hz: f64,
}

/// Insertion-ordered ARFCN -> record map, following enumeration order.
/// Rebuilt from scratch on every scan.
pub type ChannelMap = IndexMap<u16, ChannelRecord>;

/// Capability set shared by all technology analyzers
pub trait Analyzer {
    /// Walk every channel in the bound band and record the ones that
    /// reach lock.
    fn scan(&mut self) -> Result<(), ScanError>;

    /// True only after a `scan` call has completed
    fn has_scanned(&self) -> bool;

    /// Direct mode: tune the radio to an explicit downlink frequency
    fn set_frequency(&mut self, freq_hz: f64) -> Result<(), ScanError>;

    /// Direct mode: measure the receiver offset against the reference
    /// burst at the currently tuned frequency. Requires a prior
    /// `set_frequency`.
    fn calibrate_frequency(&mut self) -> Result<(), ScanError>;

    /// Terminal step once synchronized; reports the session summary
    fn analyze(&mut self) -> Result<(), ScanError>;

    /// Channels locked by the last scan
    fn channels(&self) -> &ChannelMap;
}

/// Pick the analyzer implementation for a band. Adding a technology
/// means adding an arm here, nothing else.
pub fn analyzer_for(
    band: BandIndicator,
    radio: Box<dyn RadioSource>,
) -> Result<Box<dyn Analyzer>, ScanError> {
    match band.technology() {
        Some(Technology::Gsm) => Ok(Box::new(GsmAnalyzer::new(band, radio))),
        Some(Technology::Umts) => Ok(Box::new(UmtsAnalyzer::new(band))),
        Some(Technology::Lte) => Ok(Box::new(LteAnalyzer::new(band))),
        None => Err(ScanError::UndefinedBand),
    }
}
