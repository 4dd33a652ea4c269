//! Reference spatial analysis: single-source MUSIC direction of arrival and
//! COMEDIE diffuseness over an STFT filterbank.

use crate::linalg::{dot_h, power_iteration, smooth_outer, trace};
use crate::steering::SteeringVectors;
use crate::stft::{band_frequencies, ForwardStft, NUM_BANDS};
use hades_core::{
    AnalysisControls, AnalysisEngine, AnalysisSettings, ParamContainer, SignalContainer, HOP_SIZE,
};
use num_complex::Complex32;
use std::sync::Arc;

/// Power-iteration steps per slot; the eigenvector is warm-started from the
/// previous slot so a couple of steps track it.
const POWER_ITERATIONS: usize = 2;

/// Band energy below which a slot is treated as fully diffuse.
const SILENCE: f32 = 1e-12;

pub struct ReferenceAnalysis {
    stft: ForwardStft,
    steering: SteeringVectors,
    controls: Arc<AnalysisControls>,
    frequencies: Vec<f32>,
    num_mics: usize,
    num_slots: usize,
    /// Smoothed spatial covariance, `bands x mics x mics`.
    covariance: Vec<Complex32>,
    /// Principal eigenvector per band.
    principal: Vec<Complex32>,
    tmp: Vec<Complex32>,
}

impl ReferenceAnalysis {
    pub fn new(settings: &AnalysisSettings<'_>) -> Self {
        let num_mics = settings.array.num_channels();
        let mut analysis = Self {
            stft: ForwardStft::new(num_mics),
            steering: SteeringVectors::from_ir_set(settings.array),
            controls: Arc::new(AnalysisControls::new(settings.covariance_averaging)),
            frequencies: band_frequencies(settings.sample_rate),
            num_mics,
            num_slots: settings.frame_size / settings.hop_size.max(1),
            covariance: vec![Complex32::new(0.0, 0.0); NUM_BANDS * num_mics * num_mics],
            principal: vec![Complex32::new(0.0, 0.0); NUM_BANDS * num_mics],
            tmp: vec![Complex32::new(0.0, 0.0); num_mics],
        };
        analysis.reset();
        analysis
    }

    /// Grid direction maximising `|a^H u|^2 / |a|^2` for unit eigenvector `u`.
    fn music_doa(&self, band: usize, u: &[Complex32]) -> usize {
        let mut best = 0;
        let mut best_score = f32::NEG_INFINITY;
        for dir in 0..self.steering.num_directions() {
            let norm = self.steering.norm_sqr(dir, band);
            if norm <= f32::EPSILON {
                continue;
            }
            let score = dot_h(self.steering.vector(dir, band), u).norm_sqr() / norm;
            if score > best_score {
                best_score = score;
                best = dir;
            }
        }
        best
    }
}

/// COMEDIE estimate from the principal eigenvalue and the trace, assuming the
/// remaining eigenvalues are equal.
pub fn comedie(lambda_max: f32, trace: f32, num_mics: usize) -> f32 {
    if num_mics < 2 || trace <= SILENCE {
        return 1.0;
    }
    let m = num_mics as f32;
    let spread = (m * lambda_max / trace - 1.0) / (m - 1.0);
    (1.0 - spread).clamp(0.0, 1.0)
}

impl AnalysisEngine for ReferenceAnalysis {
    fn num_bands(&self) -> usize {
        NUM_BANDS
    }

    fn num_time_slots(&self) -> usize {
        self.num_slots
    }

    fn num_mics(&self) -> usize {
        self.num_mics
    }

    fn frequency_vector(&self) -> &[f32] {
        &self.frequencies
    }

    fn controls(&self) -> Arc<AnalysisControls> {
        Arc::clone(&self.controls)
    }

    fn processing_delay(&self) -> usize {
        HOP_SIZE
    }

    fn reset(&mut self) {
        self.stft.reset();
        self.covariance.fill(Complex32::new(0.0, 0.0));
        self.principal.fill(Complex32::new(0.0, 0.0));
        for band in self.principal.chunks_exact_mut(self.num_mics) {
            band[0] = Complex32::new(1.0, 0.0);
        }
    }

    fn apply(
        &mut self,
        input: &[Vec<f32>],
        frame_size: usize,
        params: &mut ParamContainer,
        signals: &mut SignalContainer,
    ) {
        self.stft.analyse(input, frame_size, signals);

        let m = self.num_mics;
        let alpha = self.controls.covariance_averaging.get_relaxed();
        let num_slots = self.num_slots.min(params.num_slots());
        for slot in 0..num_slots {
            for band in 0..NUM_BANDS {
                let cov = &mut self.covariance[band * m * m..(band + 1) * m * m];
                smooth_outer(cov, signals.bin(slot, band), alpha);

                let u = &mut self.principal[band * m..(band + 1) * m];
                let lambda = power_iteration(cov, u, &mut self.tmp, POWER_ITERATIONS);
                let diffuseness = comedie(lambda, trace(cov, m), m);

                let idx = params.index(slot, band);
                params.diffuseness[idx] = diffuseness;
                let dir = {
                    let u = &self.principal[band * m..(band + 1) * m];
                    self.music_doa(band, u)
                };
                params.doa_index[idx] = dir;
                params.doa_deg[idx] = self.steering.directions()[dir];
            }
        }
    }
}
