//! GSM band indicators and their downlink allocations

use std::fmt;

/// Frequency allocation the analyzer is bound to.
///
/// `Undefined` is the single sentinel for "no band given"; it must be
/// rejected before any scan or tune operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BandIndicator {
    Gsm850,
    GsmR900,
    Gsm900,
    Egsm900,
    Dcs1800,
    Pcs1900,
    Umts2100,
    Lte1900,
    Undefined,
}

/// Air-interface technology a band belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Technology {
    Gsm,
    Umts,
    Lte,
}

/// Look up a band by its operator-facing name. Exact, case-sensitive.
pub fn str_to_band(name: &str) -> Option<BandIndicator> {
    match name {
        "GSM850" => Some(BandIndicator::Gsm850),
        "GSM-R" => Some(BandIndicator::GsmR900),
        "GSM900" => Some(BandIndicator::Gsm900),
        "EGSM" => Some(BandIndicator::Egsm900),
        "DCS" => Some(BandIndicator::Dcs1800),
        "PCS" => Some(BandIndicator::Pcs1900),
        "UMTS2100" => Some(BandIndicator::Umts2100),
        "LTE1900" => Some(BandIndicator::Lte1900),
        _ => None,
    }
}

impl BandIndicator {
    pub fn technology(self) -> Option<Technology> {
        match self {
            BandIndicator::Gsm850
            | BandIndicator::GsmR900
            | BandIndicator::Gsm900
            | BandIndicator::Egsm900
            | BandIndicator::Dcs1800
            | BandIndicator::Pcs1900 => Some(Technology::Gsm),
            BandIndicator::Umts2100 => Some(Technology::Umts),
            BandIndicator::Lte1900 => Some(Technology::Lte),
            BandIndicator::Undefined => None,
        }
    }

    /// Downlink center-frequency range in Hz, lowest to highest channel.
    /// `None` for bands without a GSM channel plan.
    pub fn downlink_range(self) -> Option<(f64, f64)> {
        match self {
            BandIndicator::Gsm850 => Some((869.2e6, 893.8e6)),
            BandIndicator::GsmR900 => Some((921.2e6, 959.8e6)),
            BandIndicator::Gsm900 => Some((935.2e6, 959.8e6)),
            BandIndicator::Egsm900 => Some((925.2e6, 959.8e6)),
            BandIndicator::Dcs1800 => Some((1805.2e6, 1879.8e6)),
            BandIndicator::Pcs1900 => Some((1930.2e6, 1989.8e6)),
            _ => None,
        }
    }
}

impl fmt::Display for BandIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BandIndicator::Gsm850 => "GSM850",
            BandIndicator::GsmR900 => "GSM-R",
            BandIndicator::Gsm900 => "GSM900",
            BandIndicator::Egsm900 => "EGSM",
            BandIndicator::Dcs1800 => "DCS",
            BandIndicator::Pcs1900 => "PCS",
            BandIndicator::Umts2100 => "UMTS2100",
            BandIndicator::Lte1900 => "LTE1900",
            BandIndicator::Undefined => "undefined",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_str_to_band_known_names() {
        assert_eq!(str_to_band("GSM900"), Some(BandIndicator::Gsm900));
        assert_eq!(str_to_band("GSM-R"), Some(BandIndicator::GsmR900));
        assert_eq!(str_to_band("DCS"), Some(BandIndicator::Dcs1800));
        assert_eq!(str_to_band("PCS"), Some(BandIndicator::Pcs1900));
        assert_eq!(str_to_band("EGSM"), Some(BandIndicator::Egsm900));
        assert_eq!(str_to_band("GSM850"), Some(BandIndicator::Gsm850));
    }

    #[test]
    fn test_str_to_band_is_case_sensitive() {
        assert_eq!(str_to_band("gsm900"), None);
        assert_eq!(str_to_band("Dcs"), None);
        assert_eq!(str_to_band(""), None);
        assert_eq!(str_to_band("GSM1800"), None);
    }

    #[test]
    fn test_undefined_has_no_technology() {
        assert_eq!(BandIndicator::Undefined.technology(), None);
        assert_eq!(BandIndicator::Undefined.downlink_range(), None);
    }

    #[test]
    fn test_gsm_bands_have_downlink_ranges() {
        for band in [
            BandIndicator::Gsm850,
            BandIndicator::GsmR900,
            BandIndicator::Gsm900,
            BandIndicator::Egsm900,
            BandIndicator::Dcs1800,
            BandIndicator::Pcs1900,
        ] {
            assert_eq!(band.technology(), Some(Technology::Gsm));
            let (lo, hi) = band.downlink_range().unwrap();
            assert!(lo < hi);
            assert!(lo >= 869.0e6, "{band} downlink below the GSM floor");
        }
    }
}
