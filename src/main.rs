//! cellscan - GSM base-station channel scanner and frequency calibrator
//!
//! Scans a GSM band for active base-station carriers by hunting for the
//! FCCH burst on every ARFCN, or tunes to one known channel and
//! measures the receiver's frequency offset against its FCCH tone.

mod analyzer;
mod arfcn;
mod band;
mod config;
mod radio;
mod sync;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use analyzer::{analyzer_for, ScanError};
use band::{str_to_band, BandIndicator};
use config::Config;
use radio::{RadioSource, RtlSdrSource};

#[derive(Parser, Debug)]
#[command(name = "cellscan", disable_help_flag = true)]
struct Args {
    /// Band to scan for base stations
    #[arg(short = 's', value_name = "BAND")]
    scan_band: Option<String>,

    /// Band indicator for direct tuning
    #[arg(short = 'b', value_name = "BAND")]
    band: Option<String>,

    /// Channel number of a nearby base station
    #[arg(short = 'c', value_name = "CHANNEL")]
    channel: Option<u16>,

    /// Print usage
    #[arg(short = 'h')]
    help: bool,
}

fn usage() -> ExitCode {
    eprintln!("cellscan - GSM base station scanner and frequency calibrator");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("\tBase station scan:");
    eprintln!("\t\tcellscan -s <band indicator>");
    eprintln!();
    eprintln!("\tTune to channel frequency:");
    eprintln!("\t\tcellscan -b <band indicator> -c <channel number>");
    eprintln!();
    eprintln!("Where options are:");
    eprintln!("\t-s\tband to scan (GSM850, GSM-R, GSM900, EGSM, DCS, PCS)");
    eprintln!("\t-c\tchannel of nearby GSM base station");
    eprintln!("\t-b\tband indicator (GSM850, GSM-R, GSM900, EGSM, DCS, PCS)");
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Unknown flags (including "-?") fail to parse and land on usage
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(_) => return usage(),
    };
    if args.help {
        return usage();
    }

    let band_name = args.scan_band.as_deref().or(args.band.as_deref());
    let band = match band_name {
        Some(name) => match str_to_band(name) {
            Some(band) => band,
            None => {
                error!("bad band indicator: ``{name}''");
                return usage();
            }
        },
        None => BandIndicator::Undefined,
    };

    if band == BandIndicator::Undefined {
        error!("band not defined");
        return ExitCode::FAILURE;
    }

    // No channel means scan, as does an explicit -s
    let scan_mode = args.scan_band.is_some() || args.channel.is_none();

    let config = Config::from_env();
    match run(band, scan_mode, args.channel, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<ScanError>() {
            // Recognized band without an implementation is not a failure
            Some(ScanError::Unsupported(_)) => {
                info!("{e}");
                ExitCode::SUCCESS
            }
            _ => {
                error!("{e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run(
    band: BandIndicator,
    scan_mode: bool,
    channel: Option<u16>,
    config: &Config,
) -> anyhow::Result<()> {
    // Validate the direct-mode channel before touching any hardware
    let direct_freq = if scan_mode {
        None
    } else {
        let chan = channel.context("direct mode requires a channel (-c)")?;
        let freq_hz = arfcn::arfcn_to_freq(chan, band)
            .with_context(|| format!("channel {chan} is not valid in {band}"))?;
        Some(freq_hz)
    };

    let radio: Box<dyn RadioSource> =
        Box::new(RtlSdrSource::open(config).context("cannot open radio source")?);
    let mut analyzer = analyzer_for(band, radio)?;

    match direct_freq {
        None => analyzer.scan()?,
        Some(freq_hz) => {
            analyzer.set_frequency(freq_hz)?;
            analyzer.calibrate_frequency()?;
        }
    }

    analyzer.analyze()?;
    Ok(())
}
