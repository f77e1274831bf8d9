//! 8-bit IQ to complex float conversion
//!
//! rtl_sdr writes unsigned 8-bit (I, Q) pairs. A 256-entry lookup table
//! maps each byte to its centered float value once, instead of repeating
//! the arithmetic per sample.

use num_complex::Complex32;

pub struct IqConverter {
    table: [f32; 256],
}

impl IqConverter {
    pub fn new() -> Self {
        let mut table = [0.0f32; 256];
        for (byte, value) in table.iter_mut().enumerate() {
            *value = (byte as f32 - 127.5) / 127.5;
        }
        Self { table }
    }

    /// Convert one IQ byte pair to a baseband sample
    #[inline(always)]
    pub fn sample(&self, i: u8, q: u8) -> Complex32 {
        Complex32::new(self.table[i as usize], self.table[q as usize])
    }

    /// Convert a raw buffer of interleaved (I, Q) bytes. `out` is
    /// cleared first; a trailing odd byte is dropped.
    pub fn convert(&self, iq_data: &[u8], out: &mut Vec<Complex32>) {
        out.clear();
        out.reserve(iq_data.len() / 2);
        for pair in iq_data.chunks_exact(2) {
            out.push(self.sample(pair[0], pair[1]));
        }
    }
}

impl Default for IqConverter {
    fn default() -> Self {
        Self::new()
    }
}
