//! GSM synchronization state machine
//!
//! Sequences the steps of one channel attempt: tune, coarse FCCH search
//! over a bounded buffer budget, then refinement of the tone estimate.
//! The sample-domain work lives in [`FcchDetector`]; this type only
//! drives the transitions and aggregates their pass/fail outcome.

use num_complex::Complex32;
use tracing::debug;

use crate::radio::{RadioError, RadioSource};

use super::fcch::{FcchDetector, ToneHit};
use super::{SyncOutcome, SyncStateMachine};

/// Buffers examined per channel before giving up. At 64k samples per
/// buffer this covers several 51-frame multiframes, enough to see an
/// FCCH burst if one is on the air.
const SEARCH_BUDGET_BUFFERS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncState {
    Idle,
    CoarseSearch,
    Refine,
    NotFound,
}

/// Transient per-channel state, allocated fresh for every `execute` so
/// nothing leaks between channels.
struct Session {
    state: SyncState,
    buffers_examined: usize,
    buf: Vec<Complex32>,
    hit: Option<ToneHit>,
}

impl Session {
    fn new() -> Self {
        Self {
            state: SyncState::Idle,
            buffers_examined: 0,
            buf: Vec::new(),
            hit: None,
        }
    }
}

/// FCCH-based synchronization for GSM carriers
pub struct GsmSync {
    detector: FcchDetector,
}

impl GsmSync {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            detector: FcchDetector::new(sample_rate),
        }
    }
}

impl SyncStateMachine for GsmSync {
    fn execute(
        &mut self,
        freq_hz: f64,
        radio: &mut dyn RadioSource,
    ) -> Result<SyncOutcome, RadioError> {
        let mut session = Session::new();
        self.detector.reset();

        radio.tune(freq_hz)?;
        session.state = SyncState::CoarseSearch;

        while session.state == SyncState::CoarseSearch {
            if session.buffers_examined >= SEARCH_BUDGET_BUFFERS {
                session.state = SyncState::NotFound;
                break;
            }

            radio.read_buffer(&mut session.buf)?;
            session.buffers_examined += 1;

            if let Some(hit) = self.detector.search(&session.buf) {
                session.hit = Some(hit);
                session.state = SyncState::Refine;
            }
        }

        if session.state == SyncState::NotFound {
            debug!(
                "no tone window of {} samples in {} buffers at {:.4} MHz",
                self.detector.window_len(),
                session.buffers_examined,
                freq_hz / 1e6
            );
        }

        if let (SyncState::Refine, Some(hit)) = (session.state, session.hit) {
            let frequency_offset_hz = self.detector.refine(&session.buf, &hit);
            debug!(
                "locked at {:.4} MHz after {} buffers: offset {:+.1} Hz",
                freq_hz / 1e6,
                session.buffers_examined,
                frequency_offset_hz
            );
            return Ok(SyncOutcome::Locked {
                frequency_offset_hz,
                burst_start: hit.burst_start,
            });
        }

        Ok(SyncOutcome::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::FCCH_TONE_OFFSET_HZ;
    use std::f64::consts::TAU;

    const SAMPLE_RATE: f64 = 26_000_000.0 / 24.0;

    /// Radio stub that replays canned buffers
    struct StubRadio {
        buffers: Vec<Vec<Complex32>>,
        tuned: Vec<f64>,
        fail_read: bool,
    }

    impl StubRadio {
        fn new(buffers: Vec<Vec<Complex32>>) -> Self {
            Self {
                buffers,
                tuned: Vec::new(),
                fail_read: false,
            }
        }
    }

    impl RadioSource for StubRadio {
        fn tune(&mut self, freq_hz: f64) -> Result<(), RadioError> {
            self.tuned.push(freq_hz);
            Ok(())
        }

        fn set_gain(&mut self, _gain_db: f32) -> Result<(), RadioError> {
            Ok(())
        }

        fn sample_rate(&self) -> f64 {
            SAMPLE_RATE
        }

        fn read_buffer(&mut self, buf: &mut Vec<Complex32>) -> Result<usize, RadioError> {
            if self.fail_read {
                return Err(RadioError::StreamClosed);
            }
            if self.buffers.is_empty() {
                // Ran out of canned data; keep feeding noise-free silence
                buf.clear();
                buf.resize(8192, Complex32::new(0.0, 0.0));
            } else {
                *buf = self.buffers.remove(0);
            }
            Ok(buf.len())
        }
    }

    struct Lcg(u64);

    impl Lcg {
        fn next_f32(&mut self) -> f32 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((self.0 >> 33) as f32 / (1u64 << 31) as f32) - 1.0
        }
    }

    fn noise_buffer(len: usize, seed: u64) -> Vec<Complex32> {
        let mut rng = Lcg(seed);
        (0..len)
            .map(|_| Complex32::new(0.02 * rng.next_f32(), 0.02 * rng.next_f32()))
            .collect()
    }

    fn tone_buffer(tone_hz: f64) -> Vec<Complex32> {
        let mut buf = noise_buffer(8192, 0xBEEF);
        let burst = FcchDetector::new(SAMPLE_RATE).window_len() + 100;
        let mut phase = 0.0f64;
        for sample in buf.iter_mut().skip(1000).take(burst) {
            *sample = Complex32::new(phase.cos() as f32, phase.sin() as f32);
            phase += TAU * tone_hz / SAMPLE_RATE;
        }
        buf
    }

    #[test]
    fn test_locks_on_fcch_tone() {
        let mut radio = StubRadio::new(vec![
            noise_buffer(8192, 1),
            tone_buffer(FCCH_TONE_OFFSET_HZ + 3_000.0),
        ]);
        let mut sync = GsmSync::new(SAMPLE_RATE);

        let outcome = sync.execute(935.2e6, &mut radio).unwrap();
        match outcome {
            SyncOutcome::Locked {
                frequency_offset_hz,
                ..
            } => {
                assert!(
                    (frequency_offset_hz - 3_000.0).abs() < 300.0,
                    "offset {frequency_offset_hz}"
                );
            }
            SyncOutcome::NotFound => panic!("expected lock"),
        }
        assert_eq!(radio.tuned, vec![935.2e6]);
    }

    #[test]
    fn test_gives_up_after_budget() {
        let mut radio = StubRadio::new(vec![noise_buffer(8192, 7)]);
        let mut sync = GsmSync::new(SAMPLE_RATE);

        let outcome = sync.execute(935.2e6, &mut radio).unwrap();
        assert_eq!(outcome, SyncOutcome::NotFound);
    }

    #[test]
    fn test_radio_fault_propagates() {
        let mut radio = StubRadio::new(vec![]);
        radio.fail_read = true;
        let mut sync = GsmSync::new(SAMPLE_RATE);

        let result = sync.execute(935.2e6, &mut radio);
        assert!(matches!(result, Err(RadioError::StreamClosed)));
    }

    #[test]
    fn test_sessions_are_independent() {
        // A lock on one channel must not make the next channel lock too
        let mut sync = GsmSync::new(SAMPLE_RATE);

        let mut radio = StubRadio::new(vec![tone_buffer(FCCH_TONE_OFFSET_HZ)]);
        assert!(matches!(
            sync.execute(935.2e6, &mut radio).unwrap(),
            SyncOutcome::Locked { .. }
        ));

        let mut radio = StubRadio::new(vec![noise_buffer(8192, 3)]);
        assert_eq!(
            sync.execute(935.4e6, &mut radio).unwrap(),
            SyncOutcome::NotFound
        );
    }
}
