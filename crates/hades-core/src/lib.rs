//! Renderer core: codec lifecycle, hot reconfiguration and live parameters
//! for binaural rendering of microphone-array captures.
//!
//! # Primary API
//!
//! - [`Renderer`] / [`RendererBuilder`]: owns the engines, processes frames,
//!   exposes the parameter surface
//! - [`CodecFactory`]: plug-in point for analysis, radial editor and synthesis
//!   engines
//! - [`IrLoader`]: source of array and HRIR impulse-response sets
//! - [`RadialGainMap`]: per-degree direct-stream gains edited from a UI
//!
//! # Threading
//!
//! [`Renderer::process`] runs on the audio thread and never blocks. Rebuilds
//! run on a background thread via [`Renderer::spawn_init_codec`]; any setter
//! that changes the engine topology marks the codec stale, and the audio
//! thread outputs silence until the rebuild completes.
//!
//! # Example
//!
//! ```ignore
//! use hades_core::prelude::*;
//!
//! let renderer = Renderer::builder(factory)
//!     .array_ir_path("array.json")
//!     .build()?;
//!
//! renderer.set_beamformer(Beamformer::Bmvdr);
//! renderer.spawn_init_codec();
//!
//! // audio thread
//! renderer.process(&inputs, &mut outputs, FRAME_SIZE);
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{
    Beamformer, DiffusenessEstimator, DoaEstimator, Ear, HrtfInterpolation, RendererConfig,
    DEFAULT_AVERAGING, DEFAULT_SAMPLE_RATE, FRAME_SIZE, HOP_SIZE, MAX_NUM_CHANNELS, NUM_EARS,
    RADIAL_RESOLUTION,
};

pub(crate) mod lockfree;
pub use lockfree::{atomic_table, AtomicFlag, AtomicFloat};

mod status;
pub use status::{CodecState, CodecStatus, ProcStatus, POLL_INTERVAL};

pub mod ir;
pub use ir::{angular_distance, nearest_direction, ImpulseResponseSet};

pub mod loader;
pub use loader::{IrLoader, JsonIrLoader, MemoryIrLoader};

mod default_hrirs;
pub use default_hrirs::{
    default_hrirs, DEFAULT_HRIR_AZIMUTH_STEP, DEFAULT_HRIR_LENGTH, DEFAULT_HRIR_SAMPLE_RATE,
};

pub mod containers;
pub use containers::{ParamContainer, SignalContainer};

pub mod controls;
pub use controls::{AnalysisControls, SynthesisControls, DEFAULT_STREAM_BALANCE, MAX_STREAM_BALANCE};

mod radial;
pub use radial::{RadialGainMap, MAX_RADIAL_GAIN_DB, MIN_RADIAL_GAIN_DB};

mod bands;
pub use bands::StreamBalanceSnapshot;

pub mod engine;
pub use engine::{
    AnalysisEngine, AnalysisSettings, CodecFactory, RadialEditor, SynthesisEngine,
    SynthesisSettings,
};

mod progress;
pub use progress::{BuildPhase, BuildProgress};

mod state;
pub use state::RendererState;

mod renderer;
pub use renderer::{Renderer, RendererBuilder, RendererInfo};

pub use num_complex::Complex32;

pub mod prelude {
    pub use crate::{
        Beamformer, CodecFactory, CodecStatus, DiffusenessEstimator, DoaEstimator, Ear,
        ImpulseResponseSet, IrLoader, JsonIrLoader, MemoryIrLoader, RadialGainMap, Renderer,
        RendererBuilder, RendererConfig, RendererState, Result, FRAME_SIZE,
    };
}
