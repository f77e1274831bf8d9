//! UMTS analyzer slot
//!
//! The UARFCN plan and PSC search are not implemented; every operation
//! reports the band as unsupported.

use crate::band::BandIndicator;

use super::{Analyzer, ChannelMap, ScanError};

pub struct UmtsAnalyzer {
    band: BandIndicator,
    channels: ChannelMap,
}

impl UmtsAnalyzer {
    pub fn new(band: BandIndicator) -> Self {
        Self {
            band,
            channels: ChannelMap::new(),
        }
    }
}

impl Analyzer for UmtsAnalyzer {
    fn scan(&mut self) -> Result<(), ScanError> {
        Err(ScanError::Unsupported(self.band))
    }

    fn has_scanned(&self) -> bool {
        false
    }

    fn set_frequency(&mut self, _freq_hz: f64) -> Result<(), ScanError> {
        Err(ScanError::Unsupported(self.band))
    }

    fn calibrate_frequency(&mut self) -> Result<(), ScanError> {
        Err(ScanError::Unsupported(self.band))
    }

    fn analyze(&mut self) -> Result<(), ScanError> {
        Err(ScanError::Unsupported(self.band))
    }

    fn channels(&self) -> &ChannelMap {
        &self.channels
    }
}
