//! Renderer core driven by the reference engines.

mod helpers;

use hades::core::Renderer;
use hades::prelude::*;
use hades::ReferenceEngines;
use helpers::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn test_renderer() -> Arc<Renderer> {
    Renderer::builder(Arc::new(ReferenceEngines))
        .sample_rate(TEST_SAMPLE_RATE)
        .loader(test_loader())
        .array_ir_path(ARRAY_PATH)
        .hrir_path(BINAURAL_PATH)
        .build()
        .unwrap()
}

#[test]
fn test_build_reports_telemetry() {
    let renderer = test_renderer();
    let info = renderer.info();
    assert!(info.array_loaded);
    assert_eq!(info.num_mics, 4);
    assert_eq!(info.num_array_directions, 16);
    assert_eq!(info.num_hrir_directions, 2);
    assert_eq!(info.num_bands, 129);
    assert_eq!(info.processing_delay, 128);
    assert_eq!(renderer.stream_balance_snapshot().frequencies.len(), 129);
    assert!(!renderer.use_default_hrirs());
}

#[test]
fn test_end_to_end_with_cov_matching_toggles() {
    let renderer = test_renderer();
    let mut rng = test_rng(42);
    let mut build: Option<thread::JoinHandle<bool>> = None;
    let mut rendered_frames = 0;

    for frame in 0..100 {
        if frame % 10 == 0 && frame > 0 {
            if let Some(handle) = build.take() {
                handle.join().unwrap();
            }
            renderer.set_enable_cov_matching(!renderer.enable_cov_matching());
            build = renderer.spawn_init_codec();
        }

        let input = noise_frame(&mut rng, 4, FRAME_SIZE);
        let before = renderer.codec_status();
        let output = render(&renderer, &input, FRAME_SIZE);
        let after = renderer.codec_status();

        assert!(all_finite(&output), "frame {frame} produced NaN/Inf");
        if before != CodecStatus::Initialised && after != CodecStatus::Initialised {
            assert!(is_silent(&output), "frame {frame} not silent while rebuilding");
        }
        if before == CodecStatus::Initialised && after == CodecStatus::Initialised {
            rendered_frames += 1;
        }
    }

    if let Some(handle) = build {
        handle.join().unwrap();
    }
    assert!(rendered_frames > 0);
    assert!(renderer.enable_cov_matching());
}

#[test]
fn test_output_is_not_silent_once_built() {
    let renderer = test_renderer();
    let mut rng = test_rng(7);
    let mut total = 0.0;
    for _ in 0..4 {
        let input = noise_frame(&mut rng, 4, FRAME_SIZE);
        total += energy(&render(&renderer, &input, FRAME_SIZE));
    }
    assert!(total > 0.0);
}

#[test]
fn test_missing_inputs_are_zero_padded() {
    let renderer = test_renderer();
    let mut rng = test_rng(3);
    let input = noise_frame(&mut rng, 1, FRAME_SIZE);
    let output = render(&renderer, &input, FRAME_SIZE);
    assert!(all_finite(&output));
}

#[test]
fn test_wrong_frame_size_is_silent() {
    let renderer = test_renderer();
    let mut rng = test_rng(5);
    let input = noise_frame(&mut rng, 4, 480);
    assert!(is_silent(&render(&renderer, &input, 480)));
}

#[test]
fn test_stress_interleaved_invalidation() {
    init_tracing();
    let renderer = test_renderer();
    let running = Arc::new(AtomicBool::new(true));

    let audio = {
        let renderer = Arc::clone(&renderer);
        let running = Arc::clone(&running);
        thread::spawn(move || {
            let mut rng = test_rng(11);
            let input = noise_frame(&mut rng, 4, FRAME_SIZE);
            let mut frames = 0usize;
            while running.load(Ordering::SeqCst) {
                let output = render(&renderer, &input, FRAME_SIZE);
                assert!(all_finite(&output));
                frames += 1;
            }
            frames
        })
    };

    let beamformers = [Beamformer::None, Beamformer::FilterAndSum, Beamformer::Bmvdr];
    for i in 0..12 {
        renderer.set_beamformer(beamformers[i % beamformers.len()]);
        renderer.set_stream_balance(i, 0.5);
        renderer.radial_gains().paint((i * 30) as i32, -6.0);
        if let Some(handle) = renderer.spawn_init_codec() {
            if i % 3 == 0 {
                handle.join().unwrap();
            }
        }
        thread::sleep(Duration::from_millis(2));
    }

    // Detached builds may still hold the claim
    while renderer.codec_status() != CodecStatus::Initialised {
        renderer.init_codec();
        thread::sleep(hades::core::POLL_INTERVAL);
    }
    running.store(false, Ordering::SeqCst);
    let frames = audio.join().unwrap();
    assert!(frames > 0);
    assert_eq!(renderer.codec_status(), CodecStatus::Initialised);
}

#[test]
fn test_reference_sensor_bounds() {
    let renderer = test_renderer();
    assert_eq!(renderer.reference_sensor(Ear::Left), Some(0));
    assert_eq!(renderer.reference_sensor(Ear::Right), Some(2));

    renderer.set_reference_sensor(Ear::Right, 3).unwrap();
    assert_eq!(renderer.codec_status(), CodecStatus::NotInitialised);
    assert!(renderer.set_reference_sensor(Ear::Left, 4).is_err());
    assert_eq!(renderer.reference_sensor(Ear::Left), Some(0));

    assert!(renderer.init_codec());
    assert_eq!(renderer.reference_sensor(Ear::Right), Some(3));
}

#[test]
fn test_radial_gain_map_is_shared_and_hot() {
    let renderer = test_renderer();
    let gains = renderer.radial_gains();
    gains.paint(0, -30.0);
    assert_eq!(renderer.radial_gains().gain_db(-7), -12.0);
    assert_eq!(renderer.radial_gains().gain_db(7), 0.0);
    assert_eq!(renderer.codec_status(), CodecStatus::Initialised);
}
