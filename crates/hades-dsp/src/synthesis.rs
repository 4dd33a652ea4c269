//! Reference binaural synthesis.
//!
//! Per slot and band the direct stream is a beamformed source estimate
//! rendered through the HRTF of the estimated direction; the ambient stream
//! is the reference microphone of each ear. Diffuseness splits energy between
//! the two, the per-band stream balance and eq mix them, and covariance
//! matching optionally pulls each ear's band energy towards its reference
//! microphone.

use crate::linalg::{dot_h, smooth_outer, solve_in_place, trace};
use crate::steering::{HrtfTable, SteeringVectors};
use crate::stft::{InverseStft, NUM_BANDS};
use hades_core::{
    Beamformer, ParamContainer, SignalContainer, SynthesisControls, SynthesisEngine,
    SynthesisSettings, HOP_SIZE, NUM_EARS,
};
use num_complex::Complex32;
use std::sync::Arc;

const ZERO: Complex32 = Complex32::new(0.0, 0.0);

/// Regularisation of the beamformer solves, relative to the mean mic power.
const DIAGONAL_LOADING: f32 = 1e-3;

/// Limits of the covariance-matching gain.
const MIN_MATCHING_GAIN: f32 = 0.25;
const MAX_MATCHING_GAIN: f32 = 4.0;

const EPS: f32 = 1e-9;

/// Preallocated working memory for one slot.
struct Scratch {
    spectra: [Vec<Complex32>; NUM_EARS],
    /// `mics x mics` matrix destroyed by each solve.
    matrix: Vec<Complex32>,
    rhs: Vec<Complex32>,
}

pub struct ReferenceSynthesis {
    controls: Arc<SynthesisControls>,
    beamformer: Beamformer,
    enable_cov_matching: bool,
    reference_sensors: [usize; NUM_EARS],
    steering: SteeringVectors,
    hrtfs: HrtfTable,
    istft: InverseStft,
    num_mics: usize,
    /// Beamformer covariance, `bands x mics x mics`.
    covariance: Vec<Complex32>,
    /// Smoothed band energies, `bands x ears`.
    target_energy: Vec<f32>,
    output_energy: Vec<f32>,
    scratch: Scratch,
}

impl ReferenceSynthesis {
    pub fn new(settings: &SynthesisSettings<'_>) -> Self {
        let steering = SteeringVectors::from_ir_set(settings.array);
        let hrtfs = HrtfTable::nearest(steering.directions(), settings.binaural);
        let num_mics = steering.num_mics();
        Self {
            controls: Arc::new(SynthesisControls::new(NUM_BANDS, settings.averaging)),
            beamformer: settings.beamformer,
            enable_cov_matching: settings.enable_cov_matching,
            reference_sensors: settings.reference_sensors,
            steering,
            hrtfs,
            istft: InverseStft::new(NUM_EARS),
            num_mics,
            covariance: vec![ZERO; NUM_BANDS * num_mics * num_mics],
            target_energy: vec![0.0; NUM_BANDS * NUM_EARS],
            output_energy: vec![0.0; NUM_BANDS * NUM_EARS],
            scratch: Scratch {
                spectra: [vec![ZERO; NUM_BANDS], vec![ZERO; NUM_BANDS]],
                matrix: vec![ZERO; num_mics * num_mics],
                rhs: vec![ZERO; num_mics],
            },
        }
    }

    /// Source signal per ear for one slot and band.
    fn source_estimate(
        &mut self,
        x: &[Complex32],
        direction: usize,
        band: usize,
        alpha: f32,
    ) -> [Complex32; NUM_EARS] {
        let a = self.steering.vector(direction, band);
        match self.beamformer {
            Beamformer::None => self.reference_sensors.map(|mic| {
                let h = a[mic];
                x[mic] * h.conj() / (h.norm_sqr() + EPS)
            }),
            Beamformer::FilterAndSum => {
                let s = dot_h(a, x) / (self.steering.norm_sqr(direction, band) + EPS);
                [s; NUM_EARS]
            }
            Beamformer::Bmvdr => {
                let m = self.num_mics;
                let cov = &mut self.covariance[band * m * m..(band + 1) * m * m];
                smooth_outer(cov, x, alpha);

                let loading = DIAGONAL_LOADING * trace(cov, m) / m as f32 + EPS;
                let Scratch { matrix, rhs, .. } = &mut self.scratch;
                matrix.copy_from_slice(cov);
                for i in 0..m {
                    matrix[i * m + i] += loading;
                }
                rhs.copy_from_slice(a);
                // rhs = R^-1 a
                let s = if solve_in_place(matrix, rhs) {
                    let denom = dot_h(a, rhs).re;
                    if denom > EPS {
                        dot_h(rhs, x) / denom
                    } else {
                        ZERO
                    }
                } else {
                    dot_h(a, x) / (self.steering.norm_sqr(direction, band) + EPS)
                };
                [s; NUM_EARS]
            }
        }
    }
}

impl SynthesisEngine for ReferenceSynthesis {
    fn controls(&self) -> Arc<SynthesisControls> {
        Arc::clone(&self.controls)
    }

    fn processing_delay(&self) -> usize {
        0
    }

    fn reset(&mut self) {
        self.istft.reset();
        self.covariance.fill(ZERO);
        self.target_energy.fill(0.0);
        self.output_energy.fill(0.0);
    }

    fn apply(
        &mut self,
        params: &ParamContainer,
        signals: &SignalContainer,
        frame_size: usize,
        output: &mut [Vec<f32>],
    ) {
        let alpha = self.controls.averaging.get_relaxed();
        let num_slots = (frame_size / HOP_SIZE)
            .min(params.num_slots())
            .min(signals.num_slots());

        for slot in 0..num_slots {
            for band in 0..NUM_BANDS {
                let idx = params.index(slot, band);
                let x = signals.bin(slot, band);
                let direction = params.doa_index[idx].min(self.steering.num_directions() - 1);
                let diffuseness = params.diffuseness[idx].clamp(0.0, 1.0);
                let direct_gain = params.direct_gain[idx] * (1.0 - diffuseness).sqrt();
                let ambient_gain = diffuseness.sqrt();

                let balance = self.controls.stream_balance()[band].get_relaxed();
                let eq = self.controls.eq()[band].get_relaxed();
                let direct_weight = balance.min(1.0) * eq;
                let ambient_weight = (2.0 - balance).min(1.0) * eq;

                let source = self.source_estimate(x, direction, band, alpha);
                let hrtf = self.hrtfs.get(direction, band);

                for ear in 0..NUM_EARS {
                    let reference = x[self.reference_sensors[ear]];
                    let direct = hrtf[ear] * source[ear] * direct_gain;
                    let ambient = reference * ambient_gain;
                    let mut y = direct * direct_weight + ambient * ambient_weight;

                    if self.enable_cov_matching {
                        let e = band * NUM_EARS + ear;
                        self.target_energy[e] =
                            alpha * self.target_energy[e] + (1.0 - alpha) * reference.norm_sqr();
                        self.output_energy[e] =
                            alpha * self.output_energy[e] + (1.0 - alpha) * y.norm_sqr();
                        let gain = (self.target_energy[e] / (self.output_energy[e] + EPS))
                            .sqrt()
                            .clamp(MIN_MATCHING_GAIN, MAX_MATCHING_GAIN);
                        y *= gain;
                    }
                    self.scratch.spectra[ear][band] = y;
                }
            }

            let range = slot * HOP_SIZE..(slot + 1) * HOP_SIZE;
            for (ear, channel) in output.iter_mut().take(NUM_EARS).enumerate() {
                self.istft
                    .synthesise(ear, &self.scratch.spectra[ear], &mut channel[range.clone()]);
            }
        }
    }
}
