//! Spectrum-frame storage: per-channel magnitude, phase, and frequency
//! bin vectors.

use crate::error::{FlowError, Result};

/// A spectrum buffer.
///
/// Each channel carries three bin vectors (magnitude, phase, Hz) in one
/// contiguous allocation partitioned per channel, a maximum bin count
/// fixed at creation, a current bin count, a hop sample count, and a
/// `ready` flag that an analysis procedure raises when the channel's
/// current frame is valid for this cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectBuf {
    srate: f32,
    ch_n: usize,
    max_bin_n: Vec<usize>,
    bin_n: Vec<usize>,
    hop_smp_n: Vec<usize>,
    ready: Vec<bool>,
    /// Per channel: `[mag(max_bin_n) | phs(max_bin_n) | hz(max_bin_n)]`.
    buf: Vec<f32>,
    /// Start offset of each channel's region in `buf`.
    ch_offset: Vec<usize>,
}

impl SpectBuf {
    /// Creates a zeroed spectrum buffer with uniform geometry.
    pub fn new(srate: f32, ch_n: usize, max_bin_n: usize, bin_n: usize, hop_smp_n: usize) -> Result<SpectBuf> {
        Self::with_geometry(
            srate,
            &vec![max_bin_n; ch_n],
            &vec![bin_n; ch_n],
            &vec![hop_smp_n; ch_n],
        )
    }

    /// Creates a zeroed spectrum buffer with per-channel geometry.
    pub fn with_geometry(
        srate: f32,
        max_bin_n: &[usize],
        bin_n: &[usize],
        hop_smp_n: &[usize],
    ) -> Result<SpectBuf> {
        let ch_n = max_bin_n.len();
        if bin_n.len() != ch_n || hop_smp_n.len() != ch_n {
            return Err(FlowError::InvalidArg(
                "spectrum geometry vectors must share one length".to_string(),
            ));
        }
        for (ch, (&b, &m)) in bin_n.iter().zip(max_bin_n.iter()).enumerate() {
            if b > m {
                return Err(FlowError::InvalidArg(format!(
                    "channel {ch} bin count {b} exceeds max {m}"
                )));
            }
        }

        let mut ch_offset = Vec::with_capacity(ch_n);
        let mut total = 0usize;
        for &m in max_bin_n {
            ch_offset.push(total);
            total += 3 * m;
        }

        Ok(SpectBuf {
            srate,
            ch_n,
            max_bin_n: max_bin_n.to_vec(),
            bin_n: bin_n.to_vec(),
            hop_smp_n: hop_smp_n.to_vec(),
            ready: vec![false; ch_n],
            buf: vec![0.0; total],
            ch_offset,
        })
    }

    /// Sample rate in Hz.
    pub fn srate(&self) -> f32 {
        self.srate
    }

    /// Channel count.
    pub fn ch_n(&self) -> usize {
        self.ch_n
    }

    /// Maximum bin count of a channel.
    pub fn max_bin_n(&self, ch: usize) -> usize {
        self.max_bin_n[ch]
    }

    /// Current bin count of a channel.
    pub fn bin_n(&self, ch: usize) -> usize {
        self.bin_n[ch]
    }

    /// Hop sample count of a channel.
    pub fn hop_smp_n(&self, ch: usize) -> usize {
        self.hop_smp_n[ch]
    }

    /// Sets the current bin count of a channel.
    pub fn set_bin_n(&mut self, ch: usize, bin_n: usize) -> Result<()> {
        self.check_ch(ch)?;
        if bin_n > self.max_bin_n[ch] {
            return Err(FlowError::InvalidArg(format!(
                "bin count {bin_n} exceeds channel {ch} max {}",
                self.max_bin_n[ch]
            )));
        }
        self.bin_n[ch] = bin_n;
        Ok(())
    }

    /// True if the channel's current frame is valid this cycle.
    pub fn ready(&self, ch: usize) -> bool {
        self.ready[ch]
    }

    /// Raises or clears a channel's ready flag.
    pub fn set_ready(&mut self, ch: usize, fl: bool) {
        self.ready[ch] = fl;
    }

    /// Magnitude bins of a channel (current bin count).
    pub fn mag(&self, ch: usize) -> &[f32] {
        let o = self.ch_offset[ch];
        &self.buf[o..o + self.bin_n[ch]]
    }

    /// Mutable magnitude bins of a channel.
    pub fn mag_mut(&mut self, ch: usize) -> &mut [f32] {
        let o = self.ch_offset[ch];
        let n = self.bin_n[ch];
        &mut self.buf[o..o + n]
    }

    /// Phase bins of a channel.
    pub fn phs(&self, ch: usize) -> &[f32] {
        let o = self.ch_offset[ch] + self.max_bin_n[ch];
        &self.buf[o..o + self.bin_n[ch]]
    }

    /// Mutable phase bins of a channel.
    pub fn phs_mut(&mut self, ch: usize) -> &mut [f32] {
        let o = self.ch_offset[ch] + self.max_bin_n[ch];
        let n = self.bin_n[ch];
        &mut self.buf[o..o + n]
    }

    /// Bin-center frequencies of a channel, in Hz.
    pub fn hz(&self, ch: usize) -> &[f32] {
        let o = self.ch_offset[ch] + 2 * self.max_bin_n[ch];
        &self.buf[o..o + self.bin_n[ch]]
    }

    /// Mutable bin-center frequencies of a channel.
    pub fn hz_mut(&mut self, ch: usize) -> &mut [f32] {
        let o = self.ch_offset[ch] + 2 * self.max_bin_n[ch];
        let n = self.bin_n[ch];
        &mut self.buf[o..o + n]
    }

    fn check_ch(&self, ch: usize) -> Result<()> {
        if ch >= self.ch_n {
            return Err(FlowError::InvalidArg(format!(
                "channel {ch} out of range ({} channels)",
                self.ch_n
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partitioned_storage() {
        let mut f = SpectBuf::new(48_000.0, 2, 8, 8, 64).unwrap();
        f.mag_mut(0).fill(1.0);
        f.phs_mut(0).fill(2.0);
        f.hz_mut(1).fill(3.0);
        assert_eq!(f.mag(0), &[1.0; 8]);
        assert_eq!(f.phs(0), &[2.0; 8]);
        // Channel 0's writes never leak into channel 1.
        assert_eq!(f.mag(1), &[0.0; 8]);
        assert_eq!(f.hz(1), &[3.0; 8]);
    }

    #[test]
    fn test_bin_count_clamped_by_max() {
        let mut f = SpectBuf::new(48_000.0, 1, 16, 8, 64).unwrap();
        assert_eq!(f.bin_n(0), 8);
        assert_eq!(f.mag(0).len(), 8);
        f.set_bin_n(0, 16).unwrap();
        assert_eq!(f.mag(0).len(), 16);
        assert!(f.set_bin_n(0, 17).is_err());
    }

    #[test]
    fn test_invalid_geometry() {
        assert!(SpectBuf::with_geometry(48_000.0, &[8, 8], &[8], &[64, 64]).is_err());
        assert!(SpectBuf::with_geometry(48_000.0, &[8], &[9], &[64]).is_err());
    }

    #[test]
    fn test_ready_flags() {
        let mut f = SpectBuf::new(48_000.0, 2, 4, 4, 32).unwrap();
        assert!(!f.ready(0));
        f.set_ready(0, true);
        assert!(f.ready(0));
        assert!(!f.ready(1));
    }
}
