//! Persisted renderer state for host save/restore.

use crate::config::{Beamformer, DiffusenessEstimator, DoaEstimator, DEFAULT_AVERAGING, NUM_EARS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_true() -> bool {
    true
}

fn default_averaging() -> f32 {
    DEFAULT_AVERAGING
}

/// Everything a host needs to bring a renderer back to where it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererState {
    /// Per-band stream balance of the build the state was captured from.
    #[serde(default)]
    pub stream_balance: Vec<f32>,
    pub doa_estimator: DoaEstimator,
    pub diffuseness_estimator: DiffusenessEstimator,
    pub beamformer: Beamformer,
    pub enable_cov_matching: bool,
    #[serde(default = "default_averaging")]
    pub analysis_averaging: f32,
    #[serde(default = "default_averaging")]
    pub synthesis_averaging: f32,
    pub reference_sensors: [Option<usize>; NUM_EARS],
    pub array_ir_path: Option<PathBuf>,
    pub hrir_path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub use_default_hrirs: bool,
}

impl RendererState {
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
