//! # Hades - Binaural Rendering of Microphone-Array Captures
//!
//! Parametric spatial audio: an analysis stage estimates direction of arrival
//! and diffuseness per time-frequency tile, a synthesis stage re-renders the
//! direct and ambient streams to two ears through HRIRs.
//!
//! ## Architecture
//!
//! Hades is an umbrella crate that coordinates:
//! - **hades-core** - Renderer core (codec lifecycle, hot reconfiguration,
//!   frame processing, live parameters, IR loading)
//! - **hades-dsp** - Reference analysis, radial editor and synthesis engines
//!
//! ## Quick Start
//!
//! ```ignore
//! use hades::prelude::*;
//!
//! let engine = HadesEngine::builder()
//!     .sample_rate(48_000)
//!     .array_ir_path("array.json")
//!     .build()?;
//!
//! // UI thread
//! engine.renderer().set_enable_cov_matching(true);
//! engine.renderer().radial_gains().paint(90, -6.0);
//!
//! // Audio thread
//! engine.process_block(&mut channels, num_inputs, num_outputs);
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Reference engines
//! - `reference-engines` - `hades-dsp` as the default engine factory

/// Re-export of hades-core for direct access
pub use hades_core as core;

/// Re-export of hades-dsp
#[cfg(feature = "reference-engines")]
pub use hades_dsp as dsp;

pub use hades_core::{
    AnalysisEngine, Beamformer, BuildPhase, CodecFactory, CodecStatus, DiffusenessEstimator,
    DoaEstimator, Ear, ImpulseResponseSet, IrLoader, JsonIrLoader, MemoryIrLoader, ProcStatus,
    RadialEditor, RadialGainMap, Renderer, RendererConfig, RendererInfo, RendererState,
    StreamBalanceSnapshot, SynthesisEngine, FRAME_SIZE,
};

#[cfg(feature = "reference-engines")]
pub use hades_dsp::ReferenceEngines;

mod builder;
mod engine;
mod error;

pub use builder::{HadesEngineBuilder, DEFAULT_TICK_INTERVAL};
pub use engine::HadesEngine;
pub use error::{Error, Result};

pub mod prelude {
    pub use crate::{
        Beamformer, CodecStatus, DiffusenessEstimator, DoaEstimator, Ear, Error,
        HadesEngine, HadesEngineBuilder, ImpulseResponseSet, IrLoader, JsonIrLoader,
        MemoryIrLoader, RadialGainMap, Renderer, RendererConfig, RendererState, Result,
        FRAME_SIZE,
    };
}
