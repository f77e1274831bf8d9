//! GSM analyzer: full-band FCCH scan and single-channel calibration

use tracing::{debug, info, warn};

use crate::arfcn::{self, BandPlan, ChannelEnumerator};
use crate::band::BandIndicator;
use crate::radio::RadioSource;
use crate::sync::{GsmSync, SyncOutcome, SyncStateMachine};

use super::{Analyzer, ChannelMap, ChannelRecord, ScanError};

pub struct GsmAnalyzer {
    band: BandIndicator,
    radio: Box<dyn RadioSource>,
    enumerator: Box<dyn ChannelEnumerator>,
    sync: Box<dyn SyncStateMachine>,
    channels: ChannelMap,
    scanned: bool,
    tuned_hz: Option<f64>,
    calibration_offset_hz: Option<f64>,
}

impl GsmAnalyzer {
    pub fn new(band: BandIndicator, radio: Box<dyn RadioSource>) -> Self {
        let sample_rate = radio.sample_rate();
        Self {
            band,
            radio,
            enumerator: Box::new(BandPlan),
            sync: Box::new(GsmSync::new(sample_rate)),
            channels: ChannelMap::new(),
            scanned: false,
            tuned_hz: None,
            calibration_offset_hz: None,
        }
    }

    #[cfg(test)]
    fn with_parts(
        band: BandIndicator,
        radio: Box<dyn RadioSource>,
        enumerator: Box<dyn ChannelEnumerator>,
        sync: Box<dyn SyncStateMachine>,
    ) -> Self {
        Self {
            band,
            radio,
            enumerator,
            sync,
            channels: ChannelMap::new(),
            scanned: false,
            tuned_hz: None,
            calibration_offset_hz: None,
        }
    }
}

impl Analyzer for GsmAnalyzer {
    fn scan(&mut self) -> Result<(), ScanError> {
        info!("scanning {} for base stations", self.band);
        // Prior results are fully replaced, never merged into
        self.channels = ChannelMap::new();

        let mut tried = 0u32;
        let mut chan = self.enumerator.first(self.band);
        while let Some(c) = chan {
            match arfcn::arfcn_to_freq(c, self.band) {
                Some(freq_hz) => {
                    tried += 1;
                    match self.sync.execute(freq_hz, self.radio.as_mut())? {
                        SyncOutcome::Locked {
                            frequency_offset_hz,
                            ..
                        } => {
                            info!(
                                "  chan {:4} ({:.4} MHz): offset {:+.1} Hz ({:+.3} ppm)",
                                c,
                                freq_hz / 1e6,
                                frequency_offset_hz,
                                frequency_offset_hz / freq_hz * 1e6
                            );
                            self.channels.insert(
                                c,
                                ChannelRecord {
                                    freq_hz,
                                    frequency_offset_hz,
                                },
                            );
                        }
                        SyncOutcome::NotFound => {
                            debug!("  chan {:4} ({:.4} MHz): no signal", c, freq_hz / 1e6);
                        }
                    }
                }
                None => {
                    warn!("enumerator produced channel {c} outside the {} plan", self.band);
                }
            }
            chan = self.enumerator.next(c, self.band);
        }

        self.scanned = true;
        info!(
            "scan complete: {} of {} channels locked",
            self.channels.len(),
            tried
        );
        Ok(())
    }

    fn has_scanned(&self) -> bool {
        self.scanned
    }

    fn set_frequency(&mut self, freq_hz: f64) -> Result<(), ScanError> {
        let in_range = self
            .band
            .downlink_range()
            .is_some_and(|(lo, hi)| freq_hz >= lo && freq_hz <= hi);
        if !in_range {
            return Err(ScanError::FrequencyOutOfRange {
                freq_hz,
                band: self.band,
            });
        }

        self.radio.tune(freq_hz)?;
        self.tuned_hz = Some(freq_hz);
        match arfcn::freq_to_arfcn(freq_hz, self.band) {
            Some(chan) => info!("tuned to {:.4} MHz (chan {chan})", freq_hz / 1e6),
            None => info!("tuned to {:.4} MHz (off-raster)", freq_hz / 1e6),
        }
        Ok(())
    }

    fn calibrate_frequency(&mut self) -> Result<(), ScanError> {
        let freq_hz = self.tuned_hz.ok_or(ScanError::NotTuned)?;

        match self.sync.execute(freq_hz, self.radio.as_mut())? {
            SyncOutcome::Locked {
                frequency_offset_hz,
                burst_start,
            } => {
                debug!("reference burst at sample offset {burst_start}");
                info!(
                    "FCCH found: offset {:+.1} Hz ({:+.3} ppm)",
                    frequency_offset_hz,
                    frequency_offset_hz / freq_hz * 1e6
                );
                self.calibration_offset_hz = Some(frequency_offset_hz);
                Ok(())
            }
            SyncOutcome::NotFound => Err(ScanError::NoSignal),
        }
    }

    fn analyze(&mut self) -> Result<(), ScanError> {
        if self.scanned {
            if self.channels.is_empty() {
                info!("no base stations found in {}", self.band);
            } else {
                info!("base stations in {}:", self.band);
                for (chan, record) in &self.channels {
                    info!(
                        "  chan {:4}: {:.4} MHz (offset {:+.1} Hz)",
                        chan,
                        record.freq_hz / 1e6,
                        record.frequency_offset_hz
                    );
                }
            }
        } else if let (Some(freq_hz), Some(offset)) = (self.tuned_hz, self.calibration_offset_hz) {
            info!(
                "calibrated at {:.4} MHz: offset {:+.1} Hz ({:+.3} ppm)",
                freq_hz / 1e6,
                offset,
                offset / freq_hz * 1e6
            );
        }
        Ok(())
    }

    fn channels(&self) -> &ChannelMap {
        &self.channels
    }
}
