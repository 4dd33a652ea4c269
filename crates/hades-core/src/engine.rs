//! Interfaces of the heavyweight engines the renderer orchestrates.
//!
//! The renderer never looks inside these: it creates them on the background
//! build task, drives them from the audio thread in a fixed order
//! (analysis, radial editor, synthesis) and drops them when the configuration
//! changes. Implementations must not allocate, lock or block in `apply`.

use crate::config::{Beamformer, DiffusenessEstimator, DoaEstimator, HrtfInterpolation, NUM_EARS};
use crate::containers::{ParamContainer, SignalContainer};
use crate::controls::{AnalysisControls, SynthesisControls};
use crate::ir::ImpulseResponseSet;
use crate::radial::RadialGainMap;
use crate::Result;
use std::sync::Arc;

/// Everything needed to construct an analysis engine.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisSettings<'a> {
    pub sample_rate: f32,
    pub hop_size: usize,
    pub frame_size: usize,
    pub hybrid_mode: bool,
    pub array: &'a ImpulseResponseSet,
    pub diffuseness_estimator: DiffusenessEstimator,
    pub doa_estimator: DoaEstimator,
    pub covariance_averaging: f32,
}

/// Everything needed to construct a synthesis engine.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisSettings<'a> {
    pub sample_rate: f32,
    pub beamformer: Beamformer,
    pub enable_cov_matching: bool,
    pub reference_sensors: [usize; NUM_EARS],
    pub array: &'a ImpulseResponseSet,
    pub binaural: &'a ImpulseResponseSet,
    pub interpolation: HrtfInterpolation,
    pub averaging: f32,
}

/// Spatial analysis: multichannel time frame in, per-band parameters and
/// spectra out.
pub trait AnalysisEngine: Send {
    fn num_bands(&self) -> usize;

    /// Filterbank time slots per frame.
    fn num_time_slots(&self) -> usize;

    fn num_mics(&self) -> usize;

    /// Band centre frequencies in Hz, `num_bands` long.
    fn frequency_vector(&self) -> &[f32];

    fn controls(&self) -> Arc<AnalysisControls>;

    /// Latency in samples.
    fn processing_delay(&self) -> usize;

    /// Flush internal state with zeros.
    fn reset(&mut self);

    /// Analyse one frame. `input` holds `num_mics` channels of `frame_size` samples.
    fn apply(
        &mut self,
        input: &[Vec<f32>],
        frame_size: usize,
        params: &mut ParamContainer,
        signals: &mut SignalContainer,
    );
}

/// Per-direction editing of the direct-stream parameters.
pub trait RadialEditor: Send {
    fn apply(&mut self, params: &mut ParamContainer, gains: &RadialGainMap);
}

/// Binaural synthesis: parameters and spectra in, two-channel frame out.
pub trait SynthesisEngine: Send {
    fn controls(&self) -> Arc<SynthesisControls>;

    fn processing_delay(&self) -> usize;

    fn reset(&mut self);

    /// `output` holds `NUM_EARS` channels of at least `frame_size` samples.
    fn apply(
        &mut self,
        params: &ParamContainer,
        signals: &SignalContainer,
        frame_size: usize,
        output: &mut [Vec<f32>],
    );
}

/// Constructs the engines for one codec build.
pub trait CodecFactory: Send + Sync {
    fn create_analysis(&self, settings: &AnalysisSettings<'_>) -> Result<Box<dyn AnalysisEngine>>;

    fn create_synthesis(
        &self,
        analysis: &dyn AnalysisEngine,
        settings: &SynthesisSettings<'_>,
    ) -> Result<Box<dyn SynthesisEngine>>;

    fn create_radial_editor(&self, analysis: &dyn AnalysisEngine) -> Result<Box<dyn RadialEditor>>;
}
