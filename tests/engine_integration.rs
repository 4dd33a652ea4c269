//! HadesEngine: host block splitting, maintenance tick and persisted state.

mod helpers;

use approx::assert_relative_eq;
use hades::prelude::*;
use helpers::*;
use std::time::{Duration, Instant};

fn wait_initialised(engine: &HadesEngine) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while engine.renderer().codec_status() != CodecStatus::Initialised {
        assert!(Instant::now() < deadline, "rebuild never completed");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_process_block_splits_into_frames() {
    let engine = test_engine();
    let mut rng = test_rng(1);
    let mut buffers = noise_frame(&mut rng, 4, 3 * FRAME_SIZE);
    {
        let mut channels: Vec<&mut [f32]> = buffers.iter_mut().map(Vec::as_mut_slice).collect();
        engine.process_block(&mut channels, 4, 2);
    }
    assert!(all_finite(&buffers));
    assert!(energy(&buffers[..2]) > 0.0);
}

#[test]
fn test_process_block_rejects_partial_frames() {
    let engine = test_engine();
    let mut rng = test_rng(2);
    let mut buffers = noise_frame(&mut rng, 4, FRAME_SIZE + 100);
    let untouched = buffers[3].clone();
    {
        let mut channels: Vec<&mut [f32]> = buffers.iter_mut().map(Vec::as_mut_slice).collect();
        engine.process_block(&mut channels, 4, 2);
    }
    assert!(is_silent(&buffers[..2]));
    assert_eq!(buffers[3], untouched);
}

#[test]
fn test_latency_and_prepare() {
    let engine = test_engine();
    assert_eq!(engine.latency(), 128);
    engine.prepare(TEST_SAMPLE_RATE);
    assert_eq!(engine.renderer().codec_status(), CodecStatus::Initialised);

    engine.prepare(44_100);
    assert_eq!(engine.renderer().codec_status(), CodecStatus::NotInitialised);
    assert!(engine.rebuild());
    assert_eq!(engine.sample_rate(), 44_100);
}

#[test]
fn test_maintenance_tick_rebuilds() {
    init_tracing();
    let engine = HadesEngine::builder()
        .loader(test_loader())
        .array_ir_path(ARRAY_PATH)
        .tick_interval(Duration::from_millis(5))
        .build()
        .unwrap();
    wait_initialised(&engine);

    engine.renderer().set_beamformer(Beamformer::Bmvdr);
    wait_initialised(&engine);
    assert_eq!(engine.renderer().beamformer(), Beamformer::Bmvdr);
    assert!(engine.renderer().array_loaded());
}

#[test]
fn test_state_round_trip_through_json() {
    let source = test_engine();
    let renderer = source.renderer();
    renderer.set_beamformer(Beamformer::None);
    renderer.set_enable_cov_matching(true);
    renderer.set_analysis_averaging(0.25);
    source.wait_for_rebuild();
    renderer.set_stream_balance(10, 1.8);

    let json = renderer.save_state().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["enable_cov_matching"], true);
    assert_eq!(value["stream_balance"].as_array().unwrap().len(), 129);
    let state = RendererState::from_json(&json).unwrap();

    let target = test_engine();
    target.renderer().restore_state(&state);
    target.wait_for_rebuild();

    let restored = target.renderer();
    assert_eq!(restored.beamformer(), Beamformer::None);
    assert!(restored.enable_cov_matching());
    assert_relative_eq!(restored.analysis_averaging(), 0.25);
    assert_relative_eq!(restored.stream_balance(10), 1.8);
    assert_eq!(restored.config(), renderer.config());
}

#[test]
fn test_json_loader_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let array_path = dir.path().join("array.json");
    JsonIrLoader::save(&test_array(4, 8), &array_path).unwrap();

    let engine = HadesEngine::builder()
        .array_ir_path(&array_path)
        .auto_rebuild(false)
        .build()
        .unwrap();
    let info = engine.renderer().info();
    assert!(info.array_loaded);
    assert_eq!(info.num_array_directions, 8);
    // Built-in HRIRs
    assert_eq!(info.num_hrir_directions, 36);
}

#[test]
fn test_missing_array_file_stays_silent() {
    let engine = HadesEngine::builder()
        .array_ir_path("/nonexistent/array.json")
        .auto_rebuild(false)
        .build()
        .unwrap();
    assert!(!engine.renderer().array_loaded());

    let mut rng = test_rng(9);
    let input = noise_frame(&mut rng, 4, FRAME_SIZE);
    assert!(is_silent(&render(engine.renderer(), &input, FRAME_SIZE)));
}
