//! Codec build procedure and the on-demand build thread.

use super::{Codec, Renderer, RendererInfo};
use crate::bands::BandState;
use crate::config::{
    HrtfInterpolation, RendererConfig, FRAME_SIZE, HOP_SIZE, NUM_EARS,
};
use crate::containers::{ParamContainer, SignalContainer};
use crate::default_hrirs::default_hrirs;
use crate::engine::{AnalysisSettings, SynthesisSettings};
use crate::ir::ImpulseResponseSet;
use crate::progress::BuildPhase;
use crate::status::CodecStatus;
use crate::{Error, Result};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Per-band values carried from one build to the next.
pub(super) struct PreviousBands {
    eq: Vec<f32>,
    stream_balance: Vec<f32>,
}

/// Output of a successful build, published in one step.
struct Built {
    codec: Codec,
    bands: BandState,
    info: RendererInfo,
}

impl Renderer {
    /// Rebuild the engines from the current configuration.
    ///
    /// Returns false without doing anything unless the codec status is
    /// `NotInitialised`. Blocks while a frame is in flight. Always leaves the
    /// status `Initialised`, even when the array IR set fails to load; the
    /// renderer is then silent until the configuration changes.
    pub fn init_codec(&self) -> bool {
        if !self.state.try_claim_build() {
            return false;
        }
        self.state.wait_for_frame_end();
        self.progress.enter(BuildPhase::Codec);

        // Values held over from a failed build count as the previous ones
        let previous = match self.bands.load_full() {
            Some(bands) => Some(PreviousBands {
                eq: bands.controls.eq_values(),
                stream_balance: bands.controls.stream_balance_values(),
            }),
            None => self.held_bands.lock().take(),
        };

        // Release the old engines before building new ones
        drop(self.rt.lock().codec.take());

        let config = self.config.read().clone();
        let sample_rate = self.sample_rate.load(Ordering::SeqCst) as f32;

        match self.build(&config, sample_rate, previous.as_ref()) {
            Ok(built) => {
                info!(
                    num_bands = built.info.num_bands,
                    num_mics = built.info.num_mics,
                    delay = built.info.processing_delay,
                    "Codec initialised"
                );
                self.analysis_controls
                    .store(Some(built.codec.analysis.controls()));
                self.bands.store(Some(Arc::new(built.bands)));
                self.info.store(Arc::new(built.info));
                self.rt.lock().codec = Some(built.codec);
            }
            Err(e) => {
                warn!("Codec build failed, output will be silent: {e}");
                self.analysis_controls.store(None);
                self.bands.store(None);
                self.info.store(Arc::new(RendererInfo::default()));
                *self.held_bands.lock() = previous;
            }
        }

        self.progress.enter(BuildPhase::Done);
        self.state.finish_build();
        true
    }

    /// Run [`init_codec`](Self::init_codec) on a background thread.
    ///
    /// Does nothing (returns `None`) unless the status is `NotInitialised`
    /// and no build thread is already pending, so repeated calls coalesce
    /// into at most one build.
    pub fn spawn_init_codec(self: &Arc<Self>) -> Option<JoinHandle<bool>> {
        if self.state.codec_status() != CodecStatus::NotInitialised {
            return None;
        }
        if self.build_pending.swap(true) {
            return None;
        }

        let renderer = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("hades-build".into())
            .spawn(move || {
                let built = renderer.init_codec();
                renderer.build_pending.set(false);
                built
            });

        match spawned {
            Ok(handle) => {
                debug!("Spawned codec build thread");
                Some(handle)
            }
            Err(e) => {
                warn!("Failed to spawn codec build thread: {e}");
                self.build_pending.set(false);
                None
            }
        }
    }

    fn build(
        &self,
        config: &RendererConfig,
        sample_rate: f32,
        previous: Option<&PreviousBands>,
    ) -> Result<Built> {
        let array_path = config.array_ir_path.as_deref().ok_or(Error::NoArrayIrPath)?;
        let array = Arc::new(self.loader.load(array_path)?);
        let num_mics = array.num_channels();
        debug!(
            path = %array_path.display(),
            num_mics,
            num_directions = array.num_directions(),
            "Loaded array impulse responses"
        );

        let reference_sensors = config.resolved_reference_sensors(num_mics);
        {
            // Only if nobody changed them since the snapshot was taken
            let mut live = self.config.write();
            if live.reference_sensors == config.reference_sensors {
                live.reference_sensors = reference_sensors.map(Some);
            }
        }

        self.progress.enter(BuildPhase::Analysis);
        let analysis = self.factory.create_analysis(&AnalysisSettings {
            sample_rate,
            hop_size: HOP_SIZE,
            frame_size: FRAME_SIZE,
            hybrid_mode: true,
            array: &array,
            diffuseness_estimator: config.diffuseness_estimator,
            doa_estimator: config.doa_estimator,
            covariance_averaging: config.analysis_averaging,
        })?;

        let num_bands = analysis.num_bands();
        if analysis.num_mics() != num_mics {
            return Err(Error::engine(
                "analysis",
                format!("expects {} microphones, array has {num_mics}", analysis.num_mics()),
            ));
        }
        if analysis.frequency_vector().len() != num_bands {
            return Err(Error::engine(
                "analysis",
                format!(
                    "{} band frequencies for {num_bands} bands",
                    analysis.frequency_vector().len()
                ),
            ));
        }

        self.progress.enter(BuildPhase::Containers);
        let params = ParamContainer::new(analysis.num_time_slots(), num_bands);
        let signals = SignalContainer::new(analysis.num_time_slots(), num_bands, num_mics);

        self.progress.enter(BuildPhase::Synthesis);
        let binaural = self.load_binaural(config, sample_rate);
        let synthesis = self.factory.create_synthesis(
            analysis.as_ref(),
            &SynthesisSettings {
                sample_rate,
                beamformer: config.beamformer,
                enable_cov_matching: config.enable_cov_matching,
                reference_sensors,
                array: &array,
                binaural: &binaural,
                interpolation: HrtfInterpolation::Nearest,
                averaging: config.synthesis_averaging,
            },
        )?;
        let editor = self.factory.create_radial_editor(analysis.as_ref())?;

        let controls = synthesis.controls();
        if controls.num_bands() != num_bands {
            return Err(Error::engine(
                "synthesis",
                format!("{} bands, analysis has {num_bands}", controls.num_bands()),
            ));
        }
        if let Some(previous) = previous {
            if controls.restore_bands(&previous.eq, &previous.stream_balance) {
                debug!("Restored per-band eq and stream balance");
            } else {
                debug!(
                    old = previous.stream_balance.len(),
                    new = num_bands,
                    "Band count changed, per-band values reset"
                );
            }
        }
        let bands = BandState::new(controls, analysis.frequency_vector());

        let info = RendererInfo {
            num_bands,
            num_mics,
            num_array_directions: array.num_directions(),
            array_ir_length: array.ir_length(),
            array_sample_rate: array.sample_rate(),
            num_hrir_directions: binaural.num_directions(),
            hrir_length: binaural.ir_length(),
            hrir_sample_rate: binaural.sample_rate(),
            processing_delay: analysis.processing_delay() + synthesis.processing_delay(),
            array_loaded: true,
        };

        Ok(Built {
            codec: Codec {
                editor,
                synthesis,
                signals,
                params,
                analysis,
                _binaural: binaural,
                _array: array,
                num_mics,
            },
            bands,
            info,
        })
    }

    /// Configured HRIR set, or the built-in one. A set that fails to load or
    /// is not two-channel switches the renderer back to the built-in set.
    fn load_binaural(&self, config: &RendererConfig, sample_rate: f32) -> Arc<ImpulseResponseSet> {
        let path = match (&config.hrir_path, config.use_default_hrirs) {
            (Some(path), false) => path,
            _ => return default_hrirs(),
        };

        let loaded = self.loader.load(path).and_then(|set| {
            if set.num_channels() == NUM_EARS {
                Ok(set)
            } else {
                Err(Error::MalformedIrSet(format!(
                    "expected {NUM_EARS} channels, found {}",
                    set.num_channels()
                )))
            }
        });

        match loaded {
            Ok(set) => {
                if set.sample_rate() != sample_rate {
                    warn!(
                        hrir_rate = set.sample_rate(),
                        sample_rate, "HRIR sample rate differs from the host sample rate"
                    );
                }
                Arc::new(set)
            }
            Err(e) => {
                warn!(path = %path.display(), "Falling back to default HRIRs: {e}");
                let mut live = self.config.write();
                if live.hrir_path == config.hrir_path {
                    live.use_default_hrirs = true;
                }
                default_hrirs()
            }
        }
    }
}
