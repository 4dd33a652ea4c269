//! Test helpers and fixtures for Hades integration tests
//!
//! Synthetic impulse-response sets stand in for measured ones: a small
//! circular array with pure-delay responses and a two-direction binaural set.

#![allow(dead_code)]

use hades::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;
use std::sync::Arc;

pub const TEST_SAMPLE_RATE: u32 = 48_000;

pub const ARRAY_PATH: &str = "test/array_4mic_16dir.json";
pub const BINAURAL_PATH: &str = "test/binaural_2dir.json";

/// Speed of sound in m/s.
const SPEED_OF_SOUND: f32 = 343.0;

/// Pure-delay responses of `num_mics` omnis on a 5 cm circle for
/// `num_dirs` horizontal directions.
pub fn test_array(num_mics: usize, num_dirs: usize) -> ImpulseResponseSet {
    let radius = 0.05;
    let length = 32;
    let base_delay = 8.0;
    let fs = TEST_SAMPLE_RATE as f32;

    let directions: Vec<[f32; 2]> = (0..num_dirs)
        .map(|d| [d as f32 * 360.0 / num_dirs as f32, 0.0])
        .collect();
    let mut data = vec![0.0; num_dirs * num_mics * length];
    for (d, dir) in directions.iter().enumerate() {
        let azimuth = dir[0].to_radians();
        for mic in 0..num_mics {
            let mic_angle = 2.0 * PI * (mic as f32 + 0.5) / num_mics as f32;
            let delay = base_delay - radius * (azimuth - mic_angle).cos() / SPEED_OF_SOUND * fs;
            let tap = delay.round().clamp(0.0, (length - 1) as f32) as usize;
            data[(d * num_mics + mic) * length + tap] = 1.0;
        }
    }
    ImpulseResponseSet::new(fs, length, num_mics, directions, data)
        .expect("synthetic array set is valid")
}

/// Left at +90, right at -90 degrees; the far ear is delayed and attenuated.
pub fn test_binaural() -> ImpulseResponseSet {
    let length = 16;
    let mut data = vec![0.0; 2 * 2 * length];
    // +90: left near, right far
    data[2] = 1.0;
    data[length + 6] = 0.5;
    // -90: left far, right near
    data[2 * length + 6] = 0.5;
    data[3 * length + 2] = 1.0;
    ImpulseResponseSet::new(
        TEST_SAMPLE_RATE as f32,
        length,
        2,
        vec![[90.0, 0.0], [-90.0, 0.0]],
        data,
    )
    .expect("synthetic binaural set is valid")
}

pub fn test_loader() -> Arc<MemoryIrLoader> {
    let loader = MemoryIrLoader::new();
    loader
        .insert(ARRAY_PATH, test_array(4, 16))
        .insert(BINAURAL_PATH, test_binaural());
    Arc::new(loader)
}

/// Engine with the synthetic sets and no maintenance thread.
pub fn test_engine() -> HadesEngine {
    HadesEngine::builder()
        .sample_rate(TEST_SAMPLE_RATE)
        .loader(test_loader())
        .array_ir_path(ARRAY_PATH)
        .hrir_path(BINAURAL_PATH)
        .auto_rebuild(false)
        .build()
        .expect("Failed to create test engine")
}

/// Route renderer logs to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn test_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Uniform noise in -1..1.
pub fn generate_noise(rng: &mut StdRng, num_samples: usize) -> Vec<f32> {
    (0..num_samples).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

pub fn noise_frame(rng: &mut StdRng, num_channels: usize, num_samples: usize) -> Vec<Vec<f32>> {
    (0..num_channels)
        .map(|_| generate_noise(rng, num_samples))
        .collect()
}

/// Run one frame through `renderer`, returning the two output channels.
pub fn render(renderer: &Renderer, inputs: &[Vec<f32>], num_samples: usize) -> Vec<Vec<f32>> {
    let inputs: Vec<&[f32]> = inputs.iter().map(Vec::as_slice).collect();
    let mut output = vec![vec![f32::NAN; num_samples]; 2];
    {
        let mut outputs: Vec<&mut [f32]> = output.iter_mut().map(Vec::as_mut_slice).collect();
        renderer.process(&inputs, &mut outputs, num_samples);
    }
    output
}

pub fn is_silent(buffers: &[Vec<f32>]) -> bool {
    buffers.iter().flatten().all(|&s| s == 0.0)
}

pub fn all_finite(buffers: &[Vec<f32>]) -> bool {
    buffers.iter().flatten().all(|s| s.is_finite())
}

pub fn energy(buffers: &[Vec<f32>]) -> f32 {
    buffers.iter().flatten().map(|s| s * s).sum()
}
