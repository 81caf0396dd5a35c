// tests/runtime.rs

mod common;

use std::sync::{Arc, Mutex};

use approx::assert_abs_diff_eq;
use deck_mixer::audio::ManualStage;
use deck_mixer::decoder::DecodedAudio;
use deck_mixer::engine::{equal_power_gains, Source};
use deck_mixer::{AudioRuntime, ChannelId, Engine, EngineConfig, LoadError, PlayOutcome};

use common::{headless, render, url, write_sine, RATE};

#[tokio::test]
async fn reloading_a_deck_leaves_only_the_newest_source() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_sine(dir.path(), "first.wav", 220.0, 0.5, RATE);
    let second = write_sine(dir.path(), "second.wav", 330.0, 0.25, RATE);
    let runtime = headless();

    let h1 = runtime.load_track(ChannelId::A, &url(&first)).await.unwrap();
    let h2 = runtime.load_track(ChannelId::A, &url(&second)).await.unwrap();
    assert_ne!(h1.id, h2.id);

    let state = runtime.channel_state(ChannelId::A);
    assert_eq!(state.source_id, Some(h2.id));
    assert_eq!(state.url.as_deref(), Some(url(&second).as_str()));
    assert_abs_diff_eq!(state.duration.as_secs_f64(), 0.25, epsilon = 1e-3);
    assert!(!state.playing);
}

#[tokio::test]
async fn reloading_a_playing_deck_does_not_overlap() {
    let dir = tempfile::tempdir().unwrap();
    // bins 6 and 12 of a 256-point transform at 44.1 kHz
    let low = write_sine(dir.path(), "low.wav", 6.0 * RATE as f32 / 256.0, 1.0, RATE);
    let high = write_sine(dir.path(), "high.wav", 12.0 * RATE as f32 / 256.0, 1.0, RATE);
    let runtime = headless();
    runtime.set_crossfader(-1.0);

    runtime.load_track(ChannelId::A, &url(&low)).await.unwrap();
    let mut old_tap = runtime.analysis_tap(ChannelId::A);
    assert_eq!(runtime.play(ChannelId::A), PlayOutcome::Applied);
    render(&runtime, 1024);
    assert_eq!(loudest_bin(&old_tap.frequency_data()), 6);

    let newer = runtime.load_track(ChannelId::A, &url(&high)).await.unwrap();
    assert!(!old_tap.is_connected());
    let mut tap = runtime.analysis_tap(ChannelId::A);
    assert_eq!(runtime.play(ChannelId::A), PlayOutcome::Applied);
    let out = render(&runtime, 2048);

    let spectrum = tap.frequency_data();
    assert_eq!(loudest_bin(&spectrum), 12);
    assert!(spectrum[6] < spectrum[12] - 40.0, "old tone still audible: {} dB", spectrum[6]);
    assert_eq!(runtime.channel_state(ChannelId::A).source_id, Some(newer.id));

    // One half-scale sine reaches the output, not two summed.
    let peak = out.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(peak > 0.3 && peak < 0.6, "peak {peak}");
}

fn loudest_bin(spectrum: &[f32]) -> usize {
    spectrum
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap()
}

#[tokio::test]
async fn transport_on_an_empty_deck_does_nothing() {
    let runtime = headless();

    assert_eq!(runtime.play(ChannelId::B), PlayOutcome::NoSource);
    assert_eq!(runtime.pause(ChannelId::B), PlayOutcome::NoSource);
    runtime.set_speed(ChannelId::B, 1.05);
    runtime.set_loop(ChannelId::B, false);

    let state = runtime.channel_state(ChannelId::B);
    assert!(state.source_id.is_none());
    assert!(!state.playing);
    assert_eq!(state.playback_rate, None);
    // Nothing tried to start the device either.
    assert!(runtime.stage_suspended());
}

#[tokio::test]
async fn failed_load_only_affects_its_own_deck() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_sine(dir.path(), "good.wav", 440.0, 0.2, RATE);
    let runtime = headless();

    let a = runtime.load_track(ChannelId::A, &url(&good)).await.unwrap();
    runtime.load_track(ChannelId::B, &url(&good)).await.unwrap();

    let missing = dir.path().join("missing.wav");
    let err = runtime.load_track(ChannelId::B, &url(&missing)).await.unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }), "{err}");

    assert_eq!(runtime.channel_state(ChannelId::A).source_id, Some(a.id));
    assert!(runtime.channel_state(ChannelId::B).source_id.is_none());
    assert_eq!(runtime.play(ChannelId::A), PlayOutcome::Applied);
}

#[tokio::test]
async fn unsupported_and_undecodable_urls_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let junk = dir.path().join("junk.mp3");
    std::fs::write(&junk, b"this is not an mp3 file at all").unwrap();
    let runtime = headless();

    let err = runtime.load_track(ChannelId::A, "blob:http://localhost/123").await.unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedUrl(_)));

    let err = runtime.load_track(ChannelId::A, &url(&junk)).await.unwrap_err();
    assert!(matches!(err, LoadError::Decode { .. }), "{err}");
    assert!(runtime.channel_state(ChannelId::A).source_id.is_none());
}

#[tokio::test]
async fn a_newer_load_supersedes_one_in_flight() {
    let dir = tempfile::tempdir().unwrap();
    let slow = write_sine(dir.path(), "slow.wav", 220.0, 2.0, RATE);
    let fast = write_sine(dir.path(), "fast.wav", 330.0, 0.1, RATE);
    let runtime = headless();

    let (slow_url, fast_url) = (url(&slow), url(&fast));
    let (older, newer) = tokio::join!(
        runtime.load_track(ChannelId::A, &slow_url),
        runtime.load_track(ChannelId::A, &fast_url),
    );

    assert!(matches!(older, Err(LoadError::Superseded { channel: ChannelId::A })));
    let newer = newer.unwrap();
    assert_eq!(runtime.channel_state(ChannelId::A).source_id, Some(newer.id));
}

#[tokio::test]
async fn speed_is_passed_through_unclamped() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sine(dir.path(), "t.wav", 440.0, 0.2, RATE);
    let runtime = headless();
    runtime.load_track(ChannelId::A, &url(&path)).await.unwrap();

    runtime.set_speed(ChannelId::A, 1.08);
    assert_eq!(runtime.channel_state(ChannelId::A).playback_rate, Some(1.08));

    runtime.set_speed(ChannelId::A, 2.5);
    assert_eq!(runtime.channel_state(ChannelId::A).playback_rate, Some(2.5));
}

#[tokio::test]
async fn resampled_source_keeps_its_length() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sine(dir.path(), "low.wav", 440.0, 0.5, 22_050);
    let runtime = headless();

    let handle = runtime.load_track(ChannelId::B, &url(&path)).await.unwrap();
    assert_abs_diff_eq!(handle.duration.as_secs_f64(), 0.5, epsilon = 0.01);
}

#[tokio::test]
async fn crossfader_writes_both_gains_from_the_law() {
    let runtime = headless();
    for pos in [-1.0, -0.5, 0.0, 0.5, 1.0] {
        runtime.set_crossfader(pos);
        let (ga, gb) = equal_power_gains(pos);
        assert_eq!(runtime.channel_state(ChannelId::A).fader_gain, ga);
        assert_eq!(runtime.channel_state(ChannelId::B).fader_gain, gb);
        assert_abs_diff_eq!(ga * ga + gb * gb, 1.0, epsilon = 1e-6);
    }
}

#[tokio::test]
async fn playback_reaches_the_output_and_the_meters() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sine(dir.path(), "t.wav", 440.0, 0.5, RATE);
    let runtime = headless();
    runtime.load_track(ChannelId::A, &url(&path)).await.unwrap();
    runtime.set_crossfader(-1.0);

    assert_eq!(runtime.play(ChannelId::A), PlayOutcome::Applied);
    assert!(!runtime.stage_suspended());

    let out = render(&runtime, 2048);
    assert!(out.iter().any(|s| s.abs() > 0.1));
    assert!(runtime.meters(ChannelId::A).peak[0] > 0.1);
    assert!(runtime.channel_state(ChannelId::A).position.as_secs_f64() > 0.04);

    assert_eq!(runtime.pause(ChannelId::A), PlayOutcome::Applied);
    let position = runtime.channel_state(ChannelId::A).position;
    let out = render(&runtime, 512);
    assert!(out.iter().all(|s| *s == 0.0));
    assert_eq!(runtime.channel_state(ChannelId::A).position, position);
}

#[tokio::test]
async fn blocked_stage_is_reported_not_raised() {
    let engine = Arc::new(Mutex::new(Engine::new(RATE)));
    let audio = DecodedAudio::from_stereo(vec![0.25; 2 * 1024], RATE);
    engine
        .lock()
        .unwrap()
        .attach_source(ChannelId::A, Source::new("mem://dc", Arc::new(audio)));

    let runtime = AudioRuntime::with_stage(
        engine,
        Box::new(ManualStage::blocked("no user gesture yet")),
        EngineConfig::default(),
    );

    match runtime.play(ChannelId::A) {
        PlayOutcome::Blocked(reason) => assert!(reason.contains("no user gesture")),
        other => panic!("expected Blocked, got {other:?}"),
    }
    assert!(!runtime.channel_state(ChannelId::A).playing);

    let err = runtime.load_track(ChannelId::A, "song.wav").await.unwrap_err();
    assert!(matches!(err, LoadError::Stage(_)));
    assert!(runtime.channel_state(ChannelId::A).source_id.is_none());
}

#[tokio::test]
async fn shutdown_releases_both_decks() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sine(dir.path(), "t.wav", 440.0, 0.2, RATE);
    let runtime = headless();
    runtime.load_track(ChannelId::A, &url(&path)).await.unwrap();
    runtime.load_track(ChannelId::B, &url(&path)).await.unwrap();
    let _ = runtime.play(ChannelId::A);

    runtime.shutdown();
    for ch in ChannelId::ALL {
        assert!(runtime.channel_state(ch).source_id.is_none());
    }
    assert!(runtime.stage_suspended());
}
