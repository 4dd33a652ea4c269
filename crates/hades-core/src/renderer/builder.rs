//! Builder for configuring and constructing a [`Renderer`].

use super::Renderer;
use crate::config::{RendererConfig, DEFAULT_SAMPLE_RATE};
use crate::engine::CodecFactory;
use crate::loader::{IrLoader, JsonIrLoader};
use crate::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// The engines come from `factory`; impulse responses are read through
/// [`JsonIrLoader`] unless another loader is given.
///
/// # Example
///
/// ```ignore
/// let renderer = Renderer::builder(factory)
///     .sample_rate(48_000)
///     .array_ir_path("array.json")
///     .build()?;
/// ```
pub struct RendererBuilder {
    factory: Arc<dyn CodecFactory>,
    loader: Option<Arc<dyn IrLoader>>,
    config: RendererConfig,
    sample_rate: u32,
    initial_build: bool,
}

impl RendererBuilder {
    pub fn new(factory: Arc<dyn CodecFactory>) -> Self {
        Self {
            factory,
            loader: None,
            config: RendererConfig::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            initial_build: true,
        }
    }

    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn loader(mut self, loader: Arc<dyn IrLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Replace the whole configuration.
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

    /// Skip the synchronous build in [`build`](Self::build). The renderer then
    /// stays silent until the first [`Renderer::spawn_init_codec`].
    pub fn defer_build(mut self) -> Self {
        self.initial_build = false;
        self
    }

    pub fn build(self) -> Result<Arc<Renderer>> {
        if self.sample_rate == 0 {
            return Err(Error::InvalidConfig("sample rate must be positive".into()));
        }
        self.config.validate()?;

        let loader = self.loader.unwrap_or_else(|| Arc::new(JsonIrLoader));
        let renderer = Arc::new(Renderer::new(
            self.factory,
            loader,
            self.config,
            self.sample_rate,
        ));
        if self.initial_build {
            renderer.init_codec();
        }
        Ok(renderer)
    }
}
