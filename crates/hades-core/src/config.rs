//! Renderer configuration and fixed processing constants.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Samples consumed and produced by every `process()` call.
pub const FRAME_SIZE: usize = 512;

/// Filterbank hop size; `FRAME_SIZE` is an integer multiple of it.
pub const HOP_SIZE: usize = 128;

/// Hard cap on input/output channels.
pub const MAX_NUM_CHANNELS: usize = 64;

/// Binaural output channels.
pub const NUM_EARS: usize = 2;

/// One radial gain entry per integer degree of azimuth.
pub const RADIAL_RESOLUTION: usize = 360;

pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Averaging coefficient given to freshly configured engines.
pub const DEFAULT_AVERAGING: f32 = 0.77;

const _: () = assert!(FRAME_SIZE % HOP_SIZE == 0);

/// Direction-of-arrival estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DoaEstimator {
    #[default]
    Music,
}

/// Diffuseness estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiffusenessEstimator {
    #[default]
    Comedie,
}

/// Beamformer used to estimate the direct-stream source signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Beamformer {
    None,
    #[default]
    FilterAndSum,
    /// Binaural minimum-variance distortionless response.
    Bmvdr,
}

/// HRTF lookup used by the synthesis engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HrtfInterpolation {
    #[default]
    Nearest,
}

/// Left or right side of the listener / head-worn array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ear {
    Left = 0,
    Right = 1,
}

impl Ear {
    pub const BOTH: [Ear; NUM_EARS] = [Ear::Left, Ear::Right];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

// Host-facing integer codes.

impl TryFrom<i32> for DoaEstimator {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            1 => Ok(Self::Music),
            _ => Err(Error::InvalidEnumValue {
                kind: "DoA estimator",
                value,
            }),
        }
    }
}

impl TryFrom<i32> for DiffusenessEstimator {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            1 => Ok(Self::Comedie),
            _ => Err(Error::InvalidEnumValue {
                kind: "diffuseness estimator",
                value,
            }),
        }
    }
}

impl TryFrom<i32> for Beamformer {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            1 => Ok(Self::None),
            2 => Ok(Self::FilterAndSum),
            3 => Ok(Self::Bmvdr),
            _ => Err(Error::InvalidEnumValue {
                kind: "beamformer",
                value,
            }),
        }
    }
}

impl TryFrom<i32> for Ear {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Left),
            1 => Ok(Self::Right),
            _ => Err(Error::InvalidEnumValue { kind: "ear", value }),
        }
    }
}

impl From<DoaEstimator> for i32 {
    fn from(value: DoaEstimator) -> Self {
        match value {
            DoaEstimator::Music => 1,
        }
    }
}

impl From<DiffusenessEstimator> for i32 {
    fn from(value: DiffusenessEstimator) -> Self {
        match value {
            DiffusenessEstimator::Comedie => 1,
        }
    }
}

impl From<Beamformer> for i32 {
    fn from(value: Beamformer) -> Self {
        match value {
            Beamformer::None => 1,
            Beamformer::FilterAndSum => 2,
            Beamformer::Bmvdr => 3,
        }
    }
}

/// User-selected renderer settings.
///
/// Every field except the two averaging coefficients affects the engine
/// topology: changing it invalidates the current codec build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererConfig {
    pub doa_estimator: DoaEstimator,
    pub diffuseness_estimator: DiffusenessEstimator,
    pub beamformer: Beamformer,
    pub enable_cov_matching: bool,
    /// Indexed by [`Ear::index`]. `None` until set or defaulted by a build.
    pub reference_sensors: [Option<usize>; NUM_EARS],
    pub analysis_averaging: f32,
    pub synthesis_averaging: f32,
    pub array_ir_path: Option<PathBuf>,
    pub hrir_path: Option<PathBuf>,
    pub use_default_hrirs: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            doa_estimator: DoaEstimator::default(),
            diffuseness_estimator: DiffusenessEstimator::default(),
            beamformer: Beamformer::default(),
            enable_cov_matching: false,
            reference_sensors: [None; NUM_EARS],
            analysis_averaging: DEFAULT_AVERAGING,
            synthesis_averaging: DEFAULT_AVERAGING,
            array_ir_path: None,
            hrir_path: None,
            use_default_hrirs: true,
        }
    }
}

impl RendererConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("analysis_averaging", self.analysis_averaging),
            ("synthesis_averaging", self.synthesis_averaging),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "{name} {value} out of range (0-1)"
                )));
            }
        }
        Ok(())
    }

    /// Reference sensors valid for an array of `num_mics` microphones.
    ///
    /// Unset or out-of-range indices fall back to the first microphone on the
    /// left and the middle one on the right, assuming the first half of the
    /// sensors belongs to the left device.
    pub fn resolved_reference_sensors(&self, num_mics: usize) -> [usize; NUM_EARS] {
        match self.reference_sensors {
            [Some(left), Some(right)] if left < num_mics && right < num_mics => [left, right],
            _ => [0, num_mics / 2],
        }
    }
}
