//! HadesEngine: renderer plus the host-side maintenance tick.

use crate::{Error, HadesEngineBuilder, Result};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use hades_core::{CodecStatus, Renderer, FRAME_SIZE, MAX_NUM_CHANNELS};
use smallvec::SmallVec;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Maintenance thread handle.
struct Maintenance {
    shutdown: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

/// Binaural renderer wired for a host.
///
/// Wraps an `Arc<Renderer>` and, unless disabled, runs a maintenance thread
/// that starts a background rebuild whenever the configuration has changed.
/// The renderer's parameter surface is reached through [`renderer`](Self::renderer).
///
/// # Example
///
/// ```ignore
/// let engine = HadesEngine::builder()
///     .array_ir_path("array.json")
///     .build()?;
///
/// // audio callback
/// engine.process_block(&mut channels, num_inputs, num_outputs);
/// ```
pub struct HadesEngine {
    renderer: Arc<Renderer>,
    maintenance: Option<Maintenance>,
}

impl HadesEngine {
    pub fn builder() -> HadesEngineBuilder {
        HadesEngineBuilder::default()
    }

    pub(crate) fn start(renderer: Arc<Renderer>, tick: Option<Duration>) -> Result<Self> {
        let maintenance = match tick {
            Some(interval) => Some(spawn_maintenance(Arc::clone(&renderer), interval)?),
            None => None,
        };
        Ok(Self {
            renderer,
            maintenance,
        })
    }

    pub fn renderer(&self) -> &Arc<Renderer> {
        &self.renderer
    }

    pub fn sample_rate(&self) -> u32 {
        self.renderer.sample_rate()
    }

    /// Host sample rate change.
    pub fn prepare(&self, sample_rate: u32) {
        self.renderer.set_sample_rate(sample_rate);
    }

    /// Processing delay in samples.
    pub fn latency(&self) -> usize {
        self.renderer.processing_delay()
    }

    /// Rebuild on the calling thread if the configuration changed. Returns
    /// whether a build ran.
    pub fn rebuild(&self) -> bool {
        self.renderer.init_codec()
    }

    /// Block until no rebuild is pending or running.
    pub fn wait_for_rebuild(&self) {
        while self.renderer.codec_status() != CodecStatus::Initialised {
            if self.maintenance.is_none() {
                self.renderer.init_codec();
            }
            thread::sleep(hades_core::POLL_INTERVAL);
        }
    }

    /// Render exactly one frame. See [`Renderer::process`].
    pub fn process(&self, inputs: &[&[f32]], outputs: &mut [&mut [f32]]) {
        let num_samples = outputs.first().map_or(FRAME_SIZE, |c| c.len());
        self.renderer.process(inputs, outputs, num_samples);
    }

    /// Render a host block in place.
    ///
    /// The block is cut into frames of [`FRAME_SIZE`] samples; a block whose
    /// length is not a multiple of the frame size is cleared instead.
    pub fn process_block(&self, channels: &mut [&mut [f32]], num_inputs: usize, num_outputs: usize) {
        let num_samples = channels.iter().map(|c| c.len()).min().unwrap_or(0);
        let num_outputs = num_outputs.min(channels.len());

        if num_samples % FRAME_SIZE != 0 {
            for channel in &mut channels[..num_outputs] {
                channel[..num_samples].fill(0.0);
            }
            return;
        }

        let num_channels = num_inputs.max(num_outputs).min(channels.len()).min(MAX_NUM_CHANNELS);
        for frame in 0..num_samples / FRAME_SIZE {
            let range = frame * FRAME_SIZE..(frame + 1) * FRAME_SIZE;
            let mut frame_channels: SmallVec<[&mut [f32]; MAX_NUM_CHANNELS]> = channels
                [..num_channels]
                .iter_mut()
                .map(|c| &mut c[range.clone()])
                .collect();
            self.renderer
                .process_in_place(&mut frame_channels, num_inputs, num_outputs, FRAME_SIZE);
        }
    }
}

impl Drop for HadesEngine {
    fn drop(&mut self) {
        if let Some(mut maintenance) = self.maintenance.take() {
            let _ = maintenance.shutdown.send(());
            if let Some(thread) = maintenance.thread.take() {
                if thread.join().is_err() {
                    warn!("Maintenance thread panicked");
                }
            }
        }
        self.renderer.wait_until_idle();
    }
}

fn spawn_maintenance(renderer: Arc<Renderer>, interval: Duration) -> Result<Maintenance> {
    let (shutdown, shutdown_rx) = bounded::<()>(1);
    let thread = thread::Builder::new()
        .name("hades-maintenance".into())
        .spawn(move || {
            let mut build: Option<JoinHandle<bool>> = None;
            loop {
                match shutdown_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }

                if build.as_ref().is_some_and(JoinHandle::is_finished) {
                    if let Some(handle) = build.take() {
                        match handle.join() {
                            Ok(built) => debug!(built, "Codec build thread finished"),
                            Err(_) => warn!("Codec build thread panicked"),
                        }
                    }
                }
                if build.is_none() {
                    build = renderer.spawn_init_codec();
                }
            }

            if let Some(handle) = build {
                let _ = handle.join();
            }
        })
        .map_err(Error::Thread)?;

    Ok(Maintenance {
        shutdown,
        thread: Some(thread),
    })
}
