//! RTL-SDR sample source via the rtl_sdr process
//!
//! Spawns rtl_sdr writing raw 8-bit IQ samples to stdout; a reader
//! thread chunks the stream into buffers and hands them over a bounded
//! channel. rtl_sdr has no runtime control interface, so retuning and
//! gain changes restart the process at the new settings.

use std::io::{BufRead, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use num_complex::Complex32;
use tracing::{debug, info, warn};

use crate::config::Config;

use super::{IqConverter, RadioError, RadioSource};

/// Samples per buffer handed to the consumer
const BUFFER_SAMPLES: usize = 64 * 1024;

/// How long a blocking read waits before declaring the stream stalled
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Capture statistics, shared with the reader thread
#[derive(Debug, Default)]
pub struct CaptureStats {
    pub buffers_read: AtomicU64,
    pub samples_read: AtomicU64,
    pub buffers_dropped: AtomicU64,
}

/// One running rtl_sdr process and its sample pipe
struct Capture {
    child: Child,
    rx: Receiver<Vec<u8>>,
    running: Arc<AtomicBool>,
    freq_hz: f64,
}

impl Capture {
    fn stop(mut self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// RTL-SDR backed [`RadioSource`]
pub struct RtlSdrSource {
    device_index: u32,
    gain_db: f32,
    ppm_error: i32,
    rtl_sdr_path: PathBuf,
    sample_rate: f64,
    converter: IqConverter,
    stats: Arc<CaptureStats>,
    capture: Option<Capture>,
}

impl RtlSdrSource {
    /// Probe the device and build an idle source. The capture process
    /// starts on the first `tune`.
    pub fn open(config: &Config) -> Result<Self, RadioError> {
        let listing = query_device_info(&config.rtl_sdr_path, config.device_index)?;
        info!("RTL-SDR device {}: {}", config.device_index, listing);

        Ok(Self {
            device_index: config.device_index,
            gain_db: config.gain_db,
            ppm_error: config.ppm_error,
            rtl_sdr_path: config.rtl_sdr_path.clone(),
            sample_rate: config.sample_rate(),
            converter: IqConverter::new(),
            stats: Arc::new(CaptureStats::default()),
            capture: None,
        })
    }

    fn start_capture(&self, freq_hz: f64) -> Result<Capture, RadioError> {
        let mut cmd = Command::new(&self.rtl_sdr_path);
        cmd.arg("-d")
            .arg(self.device_index.to_string())
            .arg("-f")
            .arg(format!("{freq_hz:.0}"))
            .arg("-s")
            .arg(format!("{:.0}", self.sample_rate))
            .arg("-g")
            .arg(format!("{:.1}", self.gain_db));

        if self.ppm_error != 0 {
            cmd.arg("-p").arg(self.ppm_error.to_string());
        }

        // "-" streams raw IQ to stdout
        cmd.arg("-").stdout(Stdio::piped()).stderr(Stdio::piped());

        debug!("executing: {:?}", cmd);

        let mut child = cmd.spawn().map_err(RadioError::Spawn)?;
        let mut stdout = child.stdout.take().ok_or(RadioError::StreamClosed)?;

        // Forward rtl_sdr's own chatter to the log
        if let Some(stderr) = child.stderr.take() {
            thread::spawn(move || {
                let mut reader = std::io::BufReader::new(stderr);
                let mut line = String::new();
                while reader.read_line(&mut line).unwrap_or(0) > 0 {
                    if !line.trim().is_empty() {
                        debug!("[rtl_sdr] {}", line.trim());
                    }
                    line.clear();
                }
            });
        }

        let (tx, rx) = bounded::<Vec<u8>>(8);
        let running = Arc::new(AtomicBool::new(true));
        let reader_running = running.clone();
        let stats = self.stats.clone();

        thread::Builder::new()
            .name("radio-capture".to_string())
            .spawn(move || read_loop(&mut stdout, reader_running, stats, tx))
            .map_err(RadioError::Io)?;

        Ok(Capture {
            child,
            rx,
            running,
            freq_hz,
        })
    }
}

impl RadioSource for RtlSdrSource {
    fn tune(&mut self, freq_hz: f64) -> Result<(), RadioError> {
        if let Some(capture) = self.capture.take() {
            capture.stop();
        }
        self.capture = Some(self.start_capture(freq_hz)?);
        Ok(())
    }

    fn set_gain(&mut self, gain_db: f32) -> Result<(), RadioError> {
        self.gain_db = gain_db;
        // Gain only takes effect through process arguments
        if let Some(freq_hz) = self.capture.as_ref().map(|c| c.freq_hz) {
            self.tune(freq_hz)?;
        }
        Ok(())
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn read_buffer(&mut self, buf: &mut Vec<Complex32>) -> Result<usize, RadioError> {
        let capture = self.capture.as_ref().ok_or(RadioError::NotTuned)?;

        match capture.rx.recv_timeout(READ_TIMEOUT) {
            Ok(raw) => {
                self.converter.convert(&raw, buf);
                Ok(buf.len())
            }
            Err(RecvTimeoutError::Timeout) => {
                Err(RadioError::StreamStalled(READ_TIMEOUT.as_millis() as u64))
            }
            Err(RecvTimeoutError::Disconnected) => Err(RadioError::StreamClosed),
        }
    }
}

impl Drop for RtlSdrSource {
    fn drop(&mut self) {
        if let Some(capture) = self.capture.take() {
            capture.stop();
        }
        debug!(
            "capture done: {} buffers, {} samples, {} dropped",
            self.stats.buffers_read.load(Ordering::Relaxed),
            self.stats.samples_read.load(Ordering::Relaxed),
            self.stats.buffers_dropped.load(Ordering::Relaxed),
        );
    }
}

/// Reader loop pumping raw IQ from the child process into the channel
fn read_loop(
    stdout: &mut impl Read,
    running: Arc<AtomicBool>,
    stats: Arc<CaptureStats>,
    tx: Sender<Vec<u8>>,
) {
    let mut buf = vec![0u8; BUFFER_SAMPLES * 2];

    while running.load(Ordering::SeqCst) {
        match stdout.read(&mut buf) {
            Ok(0) => {
                debug!("rtl_sdr stdout closed (EOF)");
                break;
            }
            Ok(n) => {
                stats.buffers_read.fetch_add(1, Ordering::Relaxed);
                stats.samples_read.fetch_add((n / 2) as u64, Ordering::Relaxed);

                // Drop rather than block when the consumer lags; the
                // detector only needs contiguity within a buffer.
                match tx.try_send(buf[..n].to_vec()) {
                    Ok(()) => {}
                    Err(crossbeam_channel::TrySendError::Full(_)) => {
                        stats.buffers_dropped.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(crossbeam_channel::TrySendError::Disconnected(_)) => break,
                }
            }
            Err(e) => {
                warn!("error reading from rtl_sdr: {e}");
                break;
            }
        }
    }
}

/// Identify the device by briefly running rtl_sdr and parsing the
/// listing it prints on stderr ("0:  Realtek, RTL2838UHIDIR, SN: ...").
fn query_device_info(rtl_sdr_path: &Path, device_index: u32) -> Result<String, RadioError> {
    let output = Command::new(rtl_sdr_path)
        .arg("-d")
        .arg(device_index.to_string())
        .arg("-f")
        .arg("935000000")
        .arg("-s")
        .arg("1083333")
        .arg("-n")
        .arg("1")
        .arg("-")
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(RadioError::Spawn)?;

    let listing = String::from_utf8_lossy(&output.stderr);
    let prefix = format!("{device_index}:");
    for line in listing.lines() {
        if let Some(rest) = line.trim().strip_prefix(&prefix) {
            return Ok(sanitize(rest));
        }
    }

    Err(RadioError::NoDevice(device_index))
}

/// Strip non-printable bytes that some tuner EEPROMs put in their strings
fn sanitize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string()
}
