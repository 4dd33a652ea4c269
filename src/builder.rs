//! Builder for configuring and constructing a [`HadesEngine`].

use crate::{HadesEngine, Result};
use hades_core::{CodecFactory, IrLoader, RendererConfig, DEFAULT_SAMPLE_RATE};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Interval of the host maintenance tick that starts pending rebuilds.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(40);

/// The array IR set is the only thing a working engine needs; without it the
/// engine builds but stays silent.
///
/// # Example
///
/// ```ignore
/// use hades::prelude::*;
///
/// let engine = HadesEngine::builder()
///     .sample_rate(48_000)
///     .array_ir_path("array.json")
///     .build()?;
///
/// engine.renderer().set_beamformer(Beamformer::Bmvdr);
/// ```
pub struct HadesEngineBuilder {
    sample_rate: u32,
    config: RendererConfig,
    loader: Option<Arc<dyn IrLoader>>,
    factory: Option<Arc<dyn CodecFactory>>,
    auto_rebuild: bool,
    tick_interval: Duration,
}

impl Default for HadesEngineBuilder {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            config: RendererConfig::default(),
            loader: None,
            factory: None,
            auto_rebuild: true,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl HadesEngineBuilder {
    /// Default: 48000
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn config(mut self, config: RendererConfig) -> Self {
        self.config = config;
        self
    }

    pub fn array_ir_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.array_ir_path = Some(path.into());
        self
    }

    /// Use a measured HRIR set instead of the built-in one.
    pub fn hrir_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.hrir_path = Some(path.into());
        self.config.use_default_hrirs = false;
        self
    }

    /// Default: [`JsonIrLoader`](hades_core::JsonIrLoader)
    pub fn loader(mut self, loader: Arc<dyn IrLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Default: the reference engines (feature `reference-engines`).
    pub fn factory(mut self, factory: Arc<dyn CodecFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Rebuild automatically after configuration changes. Default: true.
    ///
    /// With this off, call [`HadesEngine::rebuild`] yourself.
    pub fn auto_rebuild(mut self, enabled: bool) -> Self {
        self.auto_rebuild = enabled;
        self
    }

    /// Default: 40 ms
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn build(self) -> Result<HadesEngine> {
        let factory = match self.factory {
            Some(factory) => factory,
            None => default_factory()?,
        };

        let mut renderer = hades_core::Renderer::builder(factory)
            .sample_rate(self.sample_rate)
            .config(self.config);
        if let Some(loader) = self.loader {
            renderer = renderer.loader(loader);
        }
        let renderer = renderer.build()?;

        HadesEngine::start(renderer, self.auto_rebuild.then_some(self.tick_interval))
    }
}

#[cfg(feature = "reference-engines")]
fn default_factory() -> Result<Arc<dyn CodecFactory>> {
    Ok(Arc::new(hades_dsp::ReferenceEngines))
}

#[cfg(not(feature = "reference-engines"))]
fn default_factory() -> Result<Arc<dyn CodecFactory>> {
    Err(crate::Error::NoFactory)
}
