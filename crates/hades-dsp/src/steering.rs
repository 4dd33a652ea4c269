//! Frequency-domain array manifold and HRTFs on the analysis grid.

use crate::stft::{ir_spectrum, NUM_BANDS, WINDOW_LEN};
use hades_core::{nearest_direction, ImpulseResponseSet, NUM_EARS};
use num_complex::Complex32;
use rustfft::FftPlanner;

/// Array steering vectors, `directions x bands x mics`.
pub struct SteeringVectors {
    directions: Vec<[f32; 2]>,
    num_mics: usize,
    data: Vec<Complex32>,
    /// `|a|^2` per direction and band.
    norms: Vec<f32>,
}

impl SteeringVectors {
    pub fn from_ir_set(array: &ImpulseResponseSet) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(WINDOW_LEN);
        let num_dirs = array.num_directions();
        let num_mics = array.num_channels();
        let mut data = vec![Complex32::new(0.0, 0.0); num_dirs * NUM_BANDS * num_mics];
        let mut spectrum = vec![Complex32::new(0.0, 0.0); NUM_BANDS];

        for dir in 0..num_dirs {
            for mic in 0..num_mics {
                ir_spectrum(fft.as_ref(), array.ir(dir, mic), &mut spectrum);
                for (band, &bin) in spectrum.iter().enumerate() {
                    data[(dir * NUM_BANDS + band) * num_mics + mic] = bin;
                }
            }
        }

        let norms = data
            .chunks_exact(num_mics)
            .map(|a| a.iter().map(Complex32::norm_sqr).sum::<f32>())
            .collect();

        Self {
            directions: array.directions().to_vec(),
            num_mics,
            data,
            norms,
        }
    }

    pub fn num_directions(&self) -> usize {
        self.directions.len()
    }

    pub fn num_mics(&self) -> usize {
        self.num_mics
    }

    pub fn directions(&self) -> &[[f32; 2]] {
        &self.directions
    }

    #[inline]
    pub fn vector(&self, direction: usize, band: usize) -> &[Complex32] {
        let start = (direction * NUM_BANDS + band) * self.num_mics;
        &self.data[start..start + self.num_mics]
    }

    #[inline]
    pub fn norm_sqr(&self, direction: usize, band: usize) -> f32 {
        self.norms[direction * NUM_BANDS + band]
    }
}

/// Nearest-neighbour HRTFs for every analysis grid direction,
/// `directions x bands x ears`.
pub struct HrtfTable {
    data: Vec<Complex32>,
}

impl HrtfTable {
    pub fn nearest(grid: &[[f32; 2]], binaural: &ImpulseResponseSet) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(WINDOW_LEN);
        let mut data = vec![Complex32::new(0.0, 0.0); grid.len() * NUM_BANDS * NUM_EARS];
        let mut spectrum = vec![Complex32::new(0.0, 0.0); NUM_BANDS];

        for (dir, &target) in grid.iter().enumerate() {
            let hrir = nearest_direction(binaural.directions(), target);
            for ear in 0..NUM_EARS {
                ir_spectrum(fft.as_ref(), binaural.ir(hrir, ear), &mut spectrum);
                for (band, &bin) in spectrum.iter().enumerate() {
                    data[(dir * NUM_BANDS + band) * NUM_EARS + ear] = bin;
                }
            }
        }
        Self { data }
    }

    #[inline]
    pub fn get(&self, direction: usize, band: usize) -> [Complex32; NUM_EARS] {
        let start = (direction * NUM_BANDS + band) * NUM_EARS;
        [self.data[start], self.data[start + 1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_delay_only_array_has_unit_magnitude() {
        // Two mics, two directions, pure delays
        let len = 16;
        let mut data = vec![0.0; 2 * 2 * len];
        data[0] = 1.0;
        data[len + 3] = 1.0;
        data[2 * len + 3] = 1.0;
        data[3 * len] = 1.0;
        let set = ImpulseResponseSet::new(48_000.0, len, 2, vec![[90.0, 0.0], [-90.0, 0.0]], data)
            .unwrap();

        let steering = SteeringVectors::from_ir_set(&set);
        assert_eq!(steering.num_directions(), 2);
        for band in [0, 10, 128] {
            for x in steering.vector(1, band) {
                assert_relative_eq!(x.norm(), 1.0, epsilon = 1e-5);
            }
            assert_relative_eq!(steering.norm_sqr(0, band), 2.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_hrtf_picks_nearest_direction() {
        let len = 8;
        let mut data = vec![0.0; 2 * 2 * len];
        // Direction 0: gain 1 on both ears; direction 1: gain 0.5
        data[0] = 1.0;
        data[len] = 1.0;
        data[2 * len] = 0.5;
        data[3 * len] = 0.5;
        let binaural =
            ImpulseResponseSet::new(48_000.0, len, 2, vec![[0.0, 0.0], [180.0, 0.0]], data).unwrap();

        let table = HrtfTable::nearest(&[[10.0, 0.0], [170.0, 0.0]], &binaural);
        assert_relative_eq!(table.get(0, 5)[0].norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(table.get(1, 5)[1].norm(), 0.5, epsilon = 1e-5);
    }
}
