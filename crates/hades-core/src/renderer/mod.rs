//! The renderer: codec lifecycle, frame processing and parameter surface.
//!
//! A [`Renderer`] is shared as `Arc<Renderer>` between three kinds of caller:
//!
//! - the audio thread, which calls [`Renderer::process`] once per 512-sample
//!   frame and never blocks,
//! - a short-lived build thread ([`Renderer::spawn_init_codec`]) that rebuilds
//!   the engines after a configuration change,
//! - UI / host threads that read and write parameters.
//!
//! Engine instances live in [`Codec`], which exists only while the codec
//! status is `Initialised` (or a build has failed and left it empty).

mod builder;
mod codec;
mod params;
mod process;

pub use builder::RendererBuilder;

use codec::PreviousBands;

use crate::bands::BandState;
use crate::config::{RendererConfig, FRAME_SIZE, MAX_NUM_CHANNELS, NUM_EARS};
use crate::containers::{ParamContainer, SignalContainer};
use crate::controls::AnalysisControls;
use crate::engine::{AnalysisEngine, CodecFactory, RadialEditor, SynthesisEngine};
use crate::ir::ImpulseResponseSet;
use crate::loader::IrLoader;
use crate::lockfree::AtomicFlag;
use crate::progress::BuildProgress;
use crate::radial::RadialGainMap;
use crate::status::CodecState;
use arc_swap::{ArcSwap, ArcSwapOption};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::AtomicU32;
use std::sync::Arc;

/// Read-only telemetry of the last build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RendererInfo {
    pub num_bands: usize,
    pub num_mics: usize,
    pub num_array_directions: usize,
    pub array_ir_length: usize,
    pub array_sample_rate: f32,
    pub num_hrir_directions: usize,
    pub hrir_length: usize,
    pub hrir_sample_rate: f32,
    /// Analysis plus synthesis delay, in samples.
    pub processing_delay: usize,
    /// True once the array IR set loaded and every engine was built.
    pub array_loaded: bool,
}

/// One build's engines. Fields drop in declaration order, which is the
/// reverse of the order they are built in.
pub(crate) struct Codec {
    editor: Box<dyn RadialEditor>,
    synthesis: Box<dyn SynthesisEngine>,
    signals: SignalContainer,
    params: ParamContainer,
    analysis: Box<dyn AnalysisEngine>,
    _binaural: Arc<ImpulseResponseSet>,
    _array: Arc<ImpulseResponseSet>,
    num_mics: usize,
}

/// State touched by the audio thread. Guarded by a mutex the audio thread
/// only ever `try_lock`s.
pub(crate) struct RtState {
    codec: Option<Codec>,
    input_frame: Vec<Vec<f32>>,
    output_frame: Vec<Vec<f32>>,
}

impl RtState {
    fn new() -> Self {
        Self {
            codec: None,
            input_frame: vec![vec![0.0; FRAME_SIZE]; MAX_NUM_CHANNELS],
            output_frame: vec![vec![0.0; FRAME_SIZE]; NUM_EARS],
        }
    }
}

/// Binaural renderer for microphone-array input.
pub struct Renderer {
    factory: Arc<dyn CodecFactory>,
    loader: Arc<dyn IrLoader>,
    state: CodecState,
    config: RwLock<RendererConfig>,
    sample_rate: AtomicU32,
    progress: BuildProgress,
    rt: Mutex<RtState>,
    analysis_controls: ArcSwapOption<AnalysisControls>,
    bands: ArcSwapOption<BandState>,
    /// Per-band values of the last good build while a failed build is live.
    held_bands: Mutex<Option<PreviousBands>>,
    radial_gains: Arc<RadialGainMap>,
    info: ArcSwap<RendererInfo>,
    build_pending: AtomicFlag,
}

impl Renderer {
    pub fn builder(factory: Arc<dyn CodecFactory>) -> RendererBuilder {
        RendererBuilder::new(factory)
    }

    fn new(
        factory: Arc<dyn CodecFactory>,
        loader: Arc<dyn IrLoader>,
        config: RendererConfig,
        sample_rate: u32,
    ) -> Self {
        Self {
            factory,
            loader,
            state: CodecState::new(),
            config: RwLock::new(config),
            sample_rate: AtomicU32::new(sample_rate),
            progress: BuildProgress::default(),
            rt: Mutex::new(RtState::new()),
            analysis_controls: ArcSwapOption::empty(),
            bands: ArcSwapOption::empty(),
            held_bands: Mutex::new(None),
            radial_gains: Arc::new(RadialGainMap::new()),
            info: ArcSwap::from_pointee(RendererInfo::default()),
            build_pending: AtomicFlag::new(false),
        }
    }

    /// Block until no build and no frame is in flight.
    pub fn wait_until_idle(&self) {
        self.state.wait_until_idle();
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.state.wait_until_idle();
        tracing::debug!("Renderer dropped");
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("codec_status", &self.state.codec_status())
            .field("proc_status", &self.state.proc_status())
            .field("config", &*self.config.read())
            .field("info", &**self.info.load())
            .finish()
    }
}
