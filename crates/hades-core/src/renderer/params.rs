//! Parameter surface: setters, getters and telemetry.
//!
//! Topology setters store the value and invalidate the codec so the next
//! build picks it up; setting a field to its current value does nothing.
//! Averaging, stream balance and radial gains are hot and never rebuild.

use super::{Renderer, RendererInfo};
use crate::bands::StreamBalanceSnapshot;
use crate::config::{
    Beamformer, DiffusenessEstimator, DoaEstimator, Ear, RendererConfig, FRAME_SIZE,
};
use crate::controls::MAX_STREAM_BALANCE;
use crate::progress::BuildProgress;
use crate::radial::RadialGainMap;
use crate::state::RendererState;
use crate::status::{CodecStatus, ProcStatus};
use crate::{Error, Result};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

impl Renderer {
    fn update_config<T: PartialEq>(&self, field: fn(&mut RendererConfig) -> &mut T, value: T) {
        {
            let mut config = self.config.write();
            let slot = field(&mut config);
            if *slot == value {
                return;
            }
            *slot = value;
        }
        self.invalidate();
    }

    fn invalidate(&self) {
        self.state.invalidate();
        debug!("Codec invalidated");
    }

    /// Force a rebuild with the current configuration.
    pub fn refresh_settings(&self) {
        self.invalidate();
    }

    /// Change the host sample rate. A new rate invalidates the codec; an
    /// initialised codec is flushed either way.
    pub fn set_sample_rate(&self, sample_rate: u32) {
        if self.sample_rate.swap(sample_rate, Ordering::SeqCst) != sample_rate {
            self.invalidate();
        }
        if self.state.codec_status() == CodecStatus::Initialised {
            if let Some(codec) = self.rt.lock().codec.as_mut() {
                codec.analysis.reset();
                codec.synthesis.reset();
            }
        }
    }

    pub fn set_doa_estimator(&self, estimator: DoaEstimator) {
        self.update_config(|c| &mut c.doa_estimator, estimator);
    }

    pub fn set_diffuseness_estimator(&self, estimator: DiffusenessEstimator) {
        self.update_config(|c| &mut c.diffuseness_estimator, estimator);
    }

    pub fn set_beamformer(&self, beamformer: Beamformer) {
        self.update_config(|c| &mut c.beamformer, beamformer);
    }

    pub fn set_enable_cov_matching(&self, enabled: bool) {
        self.update_config(|c| &mut c.enable_cov_matching, enabled);
    }

    /// Select the reference microphone for one ear.
    ///
    /// `index` must be below the microphone count of the loaded array (no
    /// index is valid before the first successful load).
    pub fn set_reference_sensor(&self, ear: Ear, index: usize) -> Result<()> {
        let num_mics = self.info.load().num_mics;
        if index >= num_mics {
            return Err(Error::InvalidSensorIndex { index, num_mics });
        }
        {
            let mut config = self.config.write();
            let slot = &mut config.reference_sensors[ear.index()];
            if *slot == Some(index) {
                return Ok(());
            }
            *slot = Some(index);
        }
        self.invalidate();
        Ok(())
    }

    pub fn set_array_ir_path(&self, path: impl Into<PathBuf>) {
        self.update_config(|c| &mut c.array_ir_path, Some(path.into()));
    }

    /// Selecting a measured HRIR set also turns the built-in set off.
    pub fn set_hrir_path(&self, path: impl Into<PathBuf>) {
        let path = Some(path.into());
        {
            let mut config = self.config.write();
            if config.hrir_path == path && !config.use_default_hrirs {
                return;
            }
            config.hrir_path = path;
            config.use_default_hrirs = false;
        }
        self.invalidate();
    }

    pub fn set_use_default_hrirs(&self, enabled: bool) {
        self.update_config(|c| &mut c.use_default_hrirs, enabled);
    }

    /// Hot: written straight into the live analysis engine.
    pub fn set_analysis_averaging(&self, value: f32) {
        let value = value.clamp(0.0, 1.0);
        self.config.write().analysis_averaging = value;
        if let Some(controls) = self.analysis_controls.load().as_ref() {
            controls.covariance_averaging.set(value);
        }
    }

    /// Hot: written straight into the live synthesis engine.
    pub fn set_synthesis_averaging(&self, value: f32) {
        let value = value.clamp(0.0, 1.0);
        self.config.write().synthesis_averaging = value;
        if let Some(bands) = self.bands.load().as_ref() {
            bands.controls.averaging.set(value);
        }
    }

    /// Set one band's direct/ambient balance, clamped to `0..=2`.
    ///
    /// The top band is not editable; it and any index past it are ignored,
    /// as is every call while no codec is built.
    pub fn set_stream_balance(&self, band: usize, value: f32) {
        if let Some(bands) = self.bands.load().as_ref() {
            if bands.is_editable(band) {
                bands.set_stream_balance(band, value.clamp(0.0, MAX_STREAM_BALANCE));
            }
        }
    }

    pub fn set_stream_balance_all_bands(&self, value: f32) {
        if let Some(bands) = self.bands.load().as_ref() {
            let value = value.clamp(0.0, MAX_STREAM_BALANCE);
            for band in 0..bands.num_bands() {
                bands.set_stream_balance(band, value);
            }
        }
    }

    /// Push the display copy of the stream balance back into the engine.
    pub fn set_stream_balance_from_local(&self) {
        if let Some(bands) = self.bands.load().as_ref() {
            bands.push_shadow();
        }
    }

    /// Shared handle to the 360-entry radial gain map. Writes take effect on
    /// the next frame.
    pub fn radial_gains(&self) -> Arc<RadialGainMap> {
        Arc::clone(&self.radial_gains)
    }

    // Getters

    pub const fn frame_size() -> usize {
        FRAME_SIZE
    }

    pub fn codec_status(&self) -> CodecStatus {
        self.state.codec_status()
    }

    pub fn proc_status(&self) -> ProcStatus {
        self.state.proc_status()
    }

    pub fn progress(&self) -> &BuildProgress {
        &self.progress
    }

    /// Copy of the current configuration.
    pub fn config(&self) -> RendererConfig {
        self.config.read().clone()
    }

    pub fn doa_estimator(&self) -> DoaEstimator {
        self.config.read().doa_estimator
    }

    pub fn diffuseness_estimator(&self) -> DiffusenessEstimator {
        self.config.read().diffuseness_estimator
    }

    pub fn beamformer(&self) -> Beamformer {
        self.config.read().beamformer
    }

    pub fn enable_cov_matching(&self) -> bool {
        self.config.read().enable_cov_matching
    }

    pub fn analysis_averaging(&self) -> f32 {
        self.config.read().analysis_averaging
    }

    pub fn synthesis_averaging(&self) -> f32 {
        self.config.read().synthesis_averaging
    }

    /// `None` until set or defaulted by a build.
    pub fn reference_sensor(&self, ear: Ear) -> Option<usize> {
        self.config.read().reference_sensors[ear.index()]
    }

    pub fn array_ir_path(&self) -> Option<PathBuf> {
        self.config.read().array_ir_path.clone()
    }

    pub fn hrir_path(&self) -> Option<PathBuf> {
        self.config.read().hrir_path.clone()
    }

    pub fn use_default_hrirs(&self) -> bool {
        self.config.read().use_default_hrirs
    }

    /// Live balance of one band; 0 for the top band, past it, or with no codec.
    pub fn stream_balance(&self, band: usize) -> f32 {
        match self.bands.load().as_ref() {
            Some(bands) if bands.is_editable(band) => bands.controls.stream_balance()[band].get(),
            _ => 0.0,
        }
    }

    /// Balance of the first band, 0 with no codec.
    pub fn stream_balance_all_bands(&self) -> f32 {
        self.bands
            .load()
            .as_ref()
            .and_then(|bands| bands.controls.stream_balance().first().map(|v| v.get()))
            .unwrap_or(0.0)
    }

    /// Refresh the display copy from the engine and return it with the band
    /// centre frequencies.
    pub fn stream_balance_snapshot(&self) -> StreamBalanceSnapshot {
        match self.bands.load_full() {
            Some(bands) => {
                bands.refresh_shadow();
                StreamBalanceSnapshot {
                    frequencies: bands.frequencies().to_vec(),
                    balance: bands.shadow_values(),
                    num_bands: bands.num_bands(),
                }
            }
            None => StreamBalanceSnapshot::default(),
        }
    }

    /// Telemetry of the last build.
    pub fn info(&self) -> Arc<RendererInfo> {
        self.info.load_full()
    }

    pub fn num_bands(&self) -> usize {
        self.info.load().num_bands
    }

    pub fn num_mics(&self) -> usize {
        self.info.load().num_mics
    }

    pub fn processing_delay(&self) -> usize {
        self.info.load().processing_delay
    }

    pub fn array_loaded(&self) -> bool {
        self.info.load().array_loaded
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::SeqCst)
    }

    // Persisted state

    pub fn save_state(&self) -> RendererState {
        let config = self.config.read().clone();
        let stream_balance = self
            .bands
            .load()
            .as_ref()
            .map(|bands| bands.controls.stream_balance_values())
            .unwrap_or_default();
        RendererState {
            stream_balance,
            doa_estimator: config.doa_estimator,
            diffuseness_estimator: config.diffuseness_estimator,
            beamformer: config.beamformer,
            enable_cov_matching: config.enable_cov_matching,
            analysis_averaging: config.analysis_averaging,
            synthesis_averaging: config.synthesis_averaging,
            reference_sensors: config.reference_sensors,
            array_ir_path: config.array_ir_path,
            hrir_path: config.hrir_path,
            use_default_hrirs: config.use_default_hrirs,
        }
    }

    /// Apply a saved state and schedule a rebuild.
    ///
    /// Stream balances only apply if the saved band count matches the
    /// current build; the rebuild then carries them forward. Reference
    /// sensors the current array cannot satisfy are skipped.
    pub fn restore_state(&self, state: &RendererState) {
        if let Some(bands) = self.bands.load().as_ref() {
            if state.stream_balance.len() == bands.num_bands() {
                for (band, &value) in state.stream_balance.iter().enumerate() {
                    bands.set_stream_balance(band, value.clamp(0.0, MAX_STREAM_BALANCE));
                }
            } else if !state.stream_balance.is_empty() {
                debug!(
                    saved = state.stream_balance.len(),
                    current = bands.num_bands(),
                    "Saved stream balance does not match band count"
                );
            }
        }

        if let Some(path) = &state.array_ir_path {
            self.set_array_ir_path(path);
        }
        {
            let mut config = self.config.write();
            config.hrir_path = state.hrir_path.clone();
            config.use_default_hrirs = state.use_default_hrirs || state.hrir_path.is_none();
        }
        self.set_doa_estimator(state.doa_estimator);
        self.set_diffuseness_estimator(state.diffuseness_estimator);
        self.set_beamformer(state.beamformer);
        self.set_enable_cov_matching(state.enable_cov_matching);
        self.set_analysis_averaging(state.analysis_averaging);
        self.set_synthesis_averaging(state.synthesis_averaging);

        for ear in Ear::BOTH {
            if let Some(index) = state.reference_sensors[ear.index()] {
                if let Err(e) = self.set_reference_sensor(ear, index) {
                    warn!(?ear, "Skipping saved reference sensor: {e}");
                }
            }
        }

        self.refresh_settings();
    }
}
