//! Parameter and signal containers handed from analysis to synthesis.
//!
//! Both are sized once from the analysis engine (time slots per frame, band
//! count, microphone count) and reused for every frame.

use num_complex::Complex32;

/// Per time-slot, per-band spatial parameters.
#[derive(Debug, Clone)]
pub struct ParamContainer {
    num_slots: usize,
    num_bands: usize,
    /// Index into the analysis direction grid.
    pub doa_index: Vec<usize>,
    /// Estimated `[azimuth, elevation]` in degrees.
    pub doa_deg: Vec<[f32; 2]>,
    /// 0 = fully directional, 1 = fully diffuse.
    pub diffuseness: Vec<f32>,
    /// Linear direct-stream gain written by the radial editor.
    pub direct_gain: Vec<f32>,
}

impl ParamContainer {
    pub fn new(num_slots: usize, num_bands: usize) -> Self {
        let len = num_slots * num_bands;
        Self {
            num_slots,
            num_bands,
            doa_index: vec![0; len],
            doa_deg: vec![[0.0, 0.0]; len],
            diffuseness: vec![1.0; len],
            direct_gain: vec![1.0; len],
        }
    }

    #[inline]
    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    #[inline]
    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    #[inline]
    pub fn index(&self, slot: usize, band: usize) -> usize {
        slot * self.num_bands + band
    }
}

/// Per time-slot, per-band, per-microphone spectra.
#[derive(Debug, Clone)]
pub struct SignalContainer {
    num_slots: usize,
    num_bands: usize,
    num_mics: usize,
    data: Vec<Complex32>,
}

impl SignalContainer {
    pub fn new(num_slots: usize, num_bands: usize, num_mics: usize) -> Self {
        Self {
            num_slots,
            num_bands,
            num_mics,
            data: vec![Complex32::new(0.0, 0.0); num_slots * num_bands * num_mics],
        }
    }

    #[inline]
    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    #[inline]
    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    #[inline]
    pub fn num_mics(&self) -> usize {
        self.num_mics
    }

    /// Microphone spectra for one slot and band.
    #[inline]
    pub fn bin(&self, slot: usize, band: usize) -> &[Complex32] {
        let start = (slot * self.num_bands + band) * self.num_mics;
        &self.data[start..start + self.num_mics]
    }

    #[inline]
    pub fn bin_mut(&mut self, slot: usize, band: usize) -> &mut [Complex32] {
        let start = (slot * self.num_bands + band) * self.num_mics;
        &mut self.data[start..start + self.num_mics]
    }

    pub fn clear(&mut self) {
        self.data.fill(Complex32::new(0.0, 0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_bins_do_not_overlap() {
        let mut signals = SignalContainer::new(4, 3, 2);
        signals.bin_mut(1, 2)[1] = Complex32::new(1.0, -1.0);
        assert_eq!(signals.bin(1, 2)[1], Complex32::new(1.0, -1.0));
        assert_eq!(signals.bin(2, 0)[0], Complex32::new(0.0, 0.0));

        signals.clear();
        assert_eq!(signals.bin(1, 2)[1], Complex32::new(0.0, 0.0));
    }

    #[test]
    fn test_param_defaults() {
        let params = ParamContainer::new(4, 129);
        assert_eq!(params.direct_gain.len(), 4 * 129);
        assert_eq!(params.index(1, 0), 129);
        assert!(params.direct_gain.iter().all(|&g| g == 1.0));
    }
}
