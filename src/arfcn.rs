//! ARFCN enumeration and channel-to-frequency mapping (3GPP TS 45.005)
//!
//! GSM bands are not contiguous integer ranges: EGSM and GSM-R put their
//! extension channels in a split block at the top of the ARFCN space that
//! wraps back into the P-GSM block. The two enumeration primitives hide
//! that topology from the scan loop.

use crate::band::BandIndicator;

/// Channel raster in Hz
pub const CHANNEL_SPACING_HZ: f64 = 200_000.0;

/// Walks a band's valid channel numbers in canonical order.
///
/// A traversal must never revisit a channel or the scan loop would spin
/// forever; bands with split allocations wrap exactly once.
pub trait ChannelEnumerator {
    fn first(&self, band: BandIndicator) -> Option<u16>;
    fn next(&self, chan: u16, band: BandIndicator) -> Option<u16>;
}

/// Production enumerator backed by the static band-plan tables
#[derive(Debug, Default, Clone, Copy)]
pub struct BandPlan;

impl ChannelEnumerator for BandPlan {
    fn first(&self, band: BandIndicator) -> Option<u16> {
        first_chan(band)
    }

    fn next(&self, chan: u16, band: BandIndicator) -> Option<u16> {
        next_chan(chan, band)
    }
}

/// First valid ARFCN of a band's traversal
pub fn first_chan(band: BandIndicator) -> Option<u16> {
    match band {
        BandIndicator::Gsm850 => Some(128),
        BandIndicator::GsmR900 => Some(955),
        BandIndicator::Gsm900 => Some(1),
        BandIndicator::Egsm900 => Some(975),
        BandIndicator::Dcs1800 | BandIndicator::Pcs1900 => Some(512),
        _ => None,
    }
}

/// Next valid ARFCN after `chan`, or `None` when the traversal is done
pub fn next_chan(chan: u16, band: BandIndicator) -> Option<u16> {
    match band {
        BandIndicator::Gsm850 => (128..251).contains(&chan).then(|| chan + 1),
        BandIndicator::Gsm900 => (1..124).contains(&chan).then(|| chan + 1),
        BandIndicator::Egsm900 => match chan {
            975..=1022 => Some(chan + 1),
            1023 => Some(0), // extension block wraps into P-GSM
            0..=123 => Some(chan + 1),
            _ => None,
        },
        BandIndicator::GsmR900 => match chan {
            955..=1022 => Some(chan + 1),
            1023 => Some(0),
            0..=123 => Some(chan + 1),
            _ => None,
        },
        BandIndicator::Dcs1800 => (512..885).contains(&chan).then(|| chan + 1),
        BandIndicator::Pcs1900 => (512..810).contains(&chan).then(|| chan + 1),
        _ => None,
    }
}

/// Downlink center frequency of `chan` in `band`, or `None` if the
/// channel is not part of the band's plan.
pub fn arfcn_to_freq(chan: u16, band: BandIndicator) -> Option<f64> {
    match band {
        BandIndicator::Gsm850 if (128..=251).contains(&chan) => {
            Some(869.2e6 + CHANNEL_SPACING_HZ * f64::from(chan - 128))
        }
        BandIndicator::Gsm900 if (1..=124).contains(&chan) => {
            Some(935.0e6 + CHANNEL_SPACING_HZ * f64::from(chan))
        }
        BandIndicator::Egsm900 => match chan {
            0..=124 => Some(935.0e6 + CHANNEL_SPACING_HZ * f64::from(chan)),
            975..=1023 => Some(935.0e6 + CHANNEL_SPACING_HZ * (f64::from(chan) - 1024.0)),
            _ => None,
        },
        BandIndicator::GsmR900 => match chan {
            0..=124 => Some(935.0e6 + CHANNEL_SPACING_HZ * f64::from(chan)),
            955..=1023 => Some(935.0e6 + CHANNEL_SPACING_HZ * (f64::from(chan) - 1024.0)),
            _ => None,
        },
        BandIndicator::Dcs1800 if (512..=885).contains(&chan) => {
            Some(1805.2e6 + CHANNEL_SPACING_HZ * f64::from(chan - 512))
        }
        BandIndicator::Pcs1900 if (512..=810).contains(&chan) => {
            Some(1930.2e6 + CHANNEL_SPACING_HZ * f64::from(chan - 512))
        }
        _ => None,
    }
}

/// Approximate inverse of [`arfcn_to_freq`]: nearest raster slot that is
/// a valid channel of `band`.
pub fn freq_to_arfcn(freq_hz: f64, band: BandIndicator) -> Option<u16> {
    match band {
        BandIndicator::Gsm850 => slot(freq_hz, 869.2e6, 128, 251),
        BandIndicator::Gsm900 => slot(freq_hz, 935.2e6, 1, 124),
        BandIndicator::Dcs1800 => slot(freq_hz, 1805.2e6, 512, 885),
        BandIndicator::Pcs1900 => slot(freq_hz, 1930.2e6, 512, 810),
        BandIndicator::Egsm900 | BandIndicator::GsmR900 => {
            let lo = if band == BandIndicator::GsmR900 { 955 } else { 975 };
            let upper_base = 935.0e6 + CHANNEL_SPACING_HZ * (f64::from(lo) - 1024.0);
            slot(freq_hz, 935.0e6, 0, 124).or_else(|| slot(freq_hz, upper_base, lo, 1023))
        }
        _ => None,
    }
}

fn slot(freq_hz: f64, base_hz: f64, first: u16, last: u16) -> Option<u16> {
    let steps = ((freq_hz - base_hz) / CHANNEL_SPACING_HZ).round();
    if steps < 0.0 || steps > f64::from(last - first) {
        return None;
    }
    Some(first + steps as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const GSM_BANDS: [BandIndicator; 6] = [
        BandIndicator::Gsm850,
        BandIndicator::GsmR900,
        BandIndicator::Gsm900,
        BandIndicator::Egsm900,
        BandIndicator::Dcs1800,
        BandIndicator::Pcs1900,
    ];

    fn traverse(band: BandIndicator) -> Vec<u16> {
        let mut out = Vec::new();
        let mut chan = first_chan(band);
        while let Some(c) = chan {
            out.push(c);
            assert!(out.len() <= 1024, "{band} traversal does not terminate");
            chan = next_chan(c, band);
        }
        out
    }

    #[test]
    fn test_traversal_is_finite_and_non_repeating() {
        for band in GSM_BANDS {
            let chans = traverse(band);
            let unique: HashSet<u16> = chans.iter().copied().collect();
            assert_eq!(unique.len(), chans.len(), "{band} traversal repeats a channel");
            assert!(!chans.is_empty());
        }
    }

    #[test]
    fn test_traversal_channel_counts() {
        assert_eq!(traverse(BandIndicator::Gsm850).len(), 124);
        assert_eq!(traverse(BandIndicator::Gsm900).len(), 124);
        assert_eq!(traverse(BandIndicator::Egsm900).len(), 49 + 125);
        assert_eq!(traverse(BandIndicator::GsmR900).len(), 69 + 125);
        assert_eq!(traverse(BandIndicator::Dcs1800).len(), 374);
        assert_eq!(traverse(BandIndicator::Pcs1900).len(), 299);
    }

    #[test]
    fn test_egsm_wraps_through_zero() {
        assert_eq!(next_chan(1023, BandIndicator::Egsm900), Some(0));
        assert_eq!(next_chan(124, BandIndicator::Egsm900), None);
        let chans = traverse(BandIndicator::Egsm900);
        assert_eq!(chans[0], 975);
        assert_eq!(*chans.last().unwrap(), 124);
    }

    #[test]
    fn test_every_enumerated_channel_maps_to_a_frequency() {
        for band in GSM_BANDS {
            for chan in traverse(band) {
                assert!(
                    arfcn_to_freq(chan, band).is_some(),
                    "chan {chan} enumerated but unmappable in {band}"
                );
            }
        }
    }

    #[test]
    fn test_known_downlink_frequencies() {
        assert_eq!(arfcn_to_freq(512, BandIndicator::Dcs1800), Some(1805.2e6));
        assert_eq!(arfcn_to_freq(128, BandIndicator::Gsm850), Some(869.2e6));
        assert_eq!(arfcn_to_freq(1, BandIndicator::Gsm900), Some(935.2e6));
        assert_eq!(arfcn_to_freq(975, BandIndicator::Egsm900), Some(925.2e6));
        assert_eq!(arfcn_to_freq(955, BandIndicator::GsmR900), Some(921.2e6));
        assert_eq!(arfcn_to_freq(512, BandIndicator::Pcs1900), Some(1930.2e6));
    }

    #[test]
    fn test_channel_validity_is_band_dependent() {
        // 512 is a DCS/PCS channel but means nothing in GSM900
        assert_eq!(arfcn_to_freq(512, BandIndicator::Gsm900), None);
        // 885 is the DCS ceiling, past the PCS ceiling of 810
        assert!(arfcn_to_freq(885, BandIndicator::Dcs1800).is_some());
        assert_eq!(arfcn_to_freq(885, BandIndicator::Pcs1900), None);
        // 0 exists in EGSM but not P-GSM
        assert!(arfcn_to_freq(0, BandIndicator::Egsm900).is_some());
        assert_eq!(arfcn_to_freq(0, BandIndicator::Gsm900), None);
    }

    #[test]
    fn test_freq_to_arfcn_inverts_the_mapping() {
        for band in GSM_BANDS {
            for chan in traverse(band) {
                let freq = arfcn_to_freq(chan, band).unwrap();
                assert_eq!(
                    freq_to_arfcn(freq, band),
                    Some(chan),
                    "round trip failed for chan {chan} in {band}"
                );
            }
        }
    }

    #[test]
    fn test_freq_to_arfcn_rejects_out_of_band() {
        assert_eq!(freq_to_arfcn(800.0e6, BandIndicator::Gsm900), None);
        assert_eq!(freq_to_arfcn(2.0e9, BandIndicator::Dcs1800), None);
    }

    #[test]
    fn test_undefined_band_has_no_channels() {
        assert_eq!(first_chan(BandIndicator::Undefined), None);
        assert_eq!(arfcn_to_freq(1, BandIndicator::Undefined), None);
    }
}
