//! Reference engines for the HADES renderer core.
//!
//! [`ReferenceEngines`] implements [`CodecFactory`] with deliberately simple
//! stand-ins for each stage:
//!
//! - analysis: sine-window STFT (256 taps, hop 128, 129 bands), smoothed
//!   spatial covariance, single-source MUSIC direction of arrival and COMEDIE
//!   diffuseness
//! - radial editor: per-degree direct-stream gain lookup
//! - synthesis: filter-and-sum / binaural MVDR source estimate, nearest HRTF,
//!   stream balance and eq, optional covariance matching, overlap-add

pub mod analysis;
pub mod editor;
pub mod linalg;
pub mod steering;
pub mod stft;
pub mod synthesis;

pub use analysis::ReferenceAnalysis;
pub use editor::ReferenceRadialEditor;
pub use synthesis::ReferenceSynthesis;

use hades_core::{
    AnalysisEngine, AnalysisSettings, CodecFactory, Error, RadialEditor, Result, SynthesisEngine,
    SynthesisSettings, HOP_SIZE, MAX_NUM_CHANNELS, NUM_EARS,
};
use tracing::{debug, warn};

/// Factory for the reference engines.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceEngines;

impl CodecFactory for ReferenceEngines {
    fn create_analysis(&self, settings: &AnalysisSettings<'_>) -> Result<Box<dyn AnalysisEngine>> {
        if settings.hop_size != HOP_SIZE || settings.frame_size % settings.hop_size != 0 {
            return Err(Error::engine(
                "analysis",
                format!(
                    "frame size {} is not a multiple of hop size {HOP_SIZE}",
                    settings.frame_size
                ),
            ));
        }
        let num_mics = settings.array.num_channels();
        if num_mics > MAX_NUM_CHANNELS {
            return Err(Error::engine(
                "analysis",
                format!("{num_mics} microphones exceeds the limit of {MAX_NUM_CHANNELS}"),
            ));
        }
        if settings.array.sample_rate() != settings.sample_rate {
            warn!(
                ir_rate = settings.array.sample_rate(),
                sample_rate = settings.sample_rate,
                "Array impulse responses were measured at a different sample rate"
            );
        }
        debug!(
            num_mics,
            num_directions = settings.array.num_directions(),
            "Creating reference analysis"
        );
        Ok(Box::new(ReferenceAnalysis::new(settings)))
    }

    fn create_synthesis(
        &self,
        analysis: &dyn AnalysisEngine,
        settings: &SynthesisSettings<'_>,
    ) -> Result<Box<dyn SynthesisEngine>> {
        let num_mics = settings.array.num_channels();
        if analysis.num_mics() != num_mics {
            return Err(Error::engine(
                "synthesis",
                format!(
                    "analysis has {} microphones, array set has {num_mics}",
                    analysis.num_mics()
                ),
            ));
        }
        if let Some(&index) = settings.reference_sensors.iter().find(|&&i| i >= num_mics) {
            return Err(Error::InvalidSensorIndex { index, num_mics });
        }
        if settings.binaural.num_channels() != NUM_EARS {
            return Err(Error::engine(
                "synthesis",
                format!("binaural set has {} channels", settings.binaural.num_channels()),
            ));
        }
        debug!(
            beamformer = ?settings.beamformer,
            cov_matching = settings.enable_cov_matching,
            "Creating reference synthesis"
        );
        Ok(Box::new(ReferenceSynthesis::new(settings)))
    }

    fn create_radial_editor(&self, _analysis: &dyn AnalysisEngine) -> Result<Box<dyn RadialEditor>> {
        Ok(Box::new(ReferenceRadialEditor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hades_core::{
        default_hrirs, Beamformer, DiffusenessEstimator, DoaEstimator, HrtfInterpolation,
        ImpulseResponseSet, FRAME_SIZE,
    };

    fn array(num_mics: usize) -> ImpulseResponseSet {
        let len = 8;
        let mut data = vec![0.0; 2 * num_mics * len];
        for ir in data.chunks_mut(len) {
            ir[0] = 1.0;
        }
        ImpulseResponseSet::new(48_000.0, len, num_mics, vec![[0.0, 0.0], [180.0, 0.0]], data)
            .unwrap()
    }

    fn analysis_settings(array: &ImpulseResponseSet) -> AnalysisSettings<'_> {
        AnalysisSettings {
            sample_rate: 48_000.0,
            hop_size: HOP_SIZE,
            frame_size: FRAME_SIZE,
            hybrid_mode: true,
            array,
            diffuseness_estimator: DiffusenessEstimator::Comedie,
            doa_estimator: DoaEstimator::Music,
            covariance_averaging: 0.77,
        }
    }

    #[test]
    fn test_factory_builds_all_stages() {
        let array = array(4);
        let binaural = default_hrirs();
        let analysis = ReferenceEngines
            .create_analysis(&analysis_settings(&array))
            .unwrap();
        assert_eq!(analysis.num_bands(), 129);
        assert_eq!(analysis.num_time_slots(), 4);

        let synthesis = ReferenceEngines
            .create_synthesis(
                analysis.as_ref(),
                &SynthesisSettings {
                    sample_rate: 48_000.0,
                    beamformer: Beamformer::Bmvdr,
                    enable_cov_matching: true,
                    reference_sensors: [0, 2],
                    array: &array,
                    binaural: &binaural,
                    interpolation: HrtfInterpolation::Nearest,
                    averaging: 0.77,
                },
            )
            .unwrap();
        assert_eq!(synthesis.controls().num_bands(), analysis.num_bands());
        assert!(ReferenceEngines.create_radial_editor(analysis.as_ref()).is_ok());
    }

    #[test]
    fn test_factory_rejects_bad_reference_sensor() {
        let array = array(2);
        let binaural = default_hrirs();
        let analysis = ReferenceEngines
            .create_analysis(&analysis_settings(&array))
            .unwrap();
        let result = ReferenceEngines.create_synthesis(
            analysis.as_ref(),
            &SynthesisSettings {
                sample_rate: 48_000.0,
                beamformer: Beamformer::FilterAndSum,
                enable_cov_matching: false,
                reference_sensors: [0, 5],
                array: &array,
                binaural: &binaural,
                interpolation: HrtfInterpolation::Nearest,
                averaging: 0.77,
            },
        );
        assert!(matches!(
            result,
            Err(Error::InvalidSensorIndex { index: 5, num_mics: 2 })
        ));
    }

    #[test]
    fn test_factory_rejects_bad_hop() {
        let array = array(2);
        let mut settings = analysis_settings(&array);
        settings.hop_size = 64;
        assert!(ReferenceEngines.create_analysis(&settings).is_err());
    }
}
