//! End-to-end runs of the transport against a headless output.
//!
//! Each test renders one display frame of audio (735 samples at 44.1kHz,
//! i.e. 60fps) and then ticks the transport, the same cadence the TUI uses.

use std::f32::consts::TAU;
use std::io::Cursor;

use retimbre::{
    config::PipelineConfig,
    dsp::OscillatorWaveform,
    error::{PlaybackGraphError, TransportError},
    runtime::{
        FrameOutcome, HeadlessOutput, PreviewPlayer, SessionState, TransportController, Upload,
    },
    synth::Instrument,
};

const RATE: u32 = 44_100;
const FRAME: usize = 735;

/// Encode mono `samples` as 16-bit WAV, duplicated across `channels`.
fn wav(samples: &[f32], rate: u32, channels: u16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate: rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            for _ in 0..channels {
                writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn sine(hz: f32, secs: f32, rate: u32) -> Vec<f32> {
    (0..(secs * rate as f32) as usize)
        .map(|n| 0.5 * (TAU * hz * n as f32 / rate as f32).sin())
        .collect()
}

/// Linear sweep from `from` to `to` Hz, phase continuous.
fn sweep(from: f32, to: f32, secs: f32, rate: u32) -> Vec<f32> {
    let slope = (to - from) / secs;
    (0..(secs * rate as f32) as usize)
        .map(|n| {
            let t = n as f32 / rate as f32;
            0.5 * (TAU * (from * t + 0.5 * slope * t * t)).sin()
        })
        .collect()
}

fn transport(instrument: Instrument) -> (TransportController<HeadlessOutput>, HeadlessOutput) {
    let output = HeadlessOutput::new(RATE);
    let config = PipelineConfig::new().instrument(instrument);
    let transport = TransportController::new(output.clone(), config).unwrap();
    (transport, output)
}

fn frame(
    transport: &mut TransportController<HeadlessOutput>,
    output: &HeadlessOutput,
) -> FrameOutcome {
    output.render(FRAME);
    transport.tick()
}

#[test]
fn sweep_is_followed_by_a_single_sine_voice() {
    let (mut transport, output) = transport(Instrument::Flute);
    let bytes = wav(&sweep(220.0, 440.0, 3.0, RATE), RATE, 1);
    transport.upload(Upload::new("sweep.wav", bytes)).unwrap();

    let mut tracked = Vec::new();
    let mut frames = 0;
    loop {
        let outcome = frame(&mut transport, &output);
        frames += 1;
        if outcome != FrameOutcome::Continued {
            assert_eq!(outcome, FrameOutcome::Ended);
            break;
        }
        assert!(frames < 400, "source never ended");

        // Skip frames whose window still holds the initial zeros
        if frames <= 3 {
            continue;
        }
        let voice = transport.voice().expect("sweep is always pitched");
        assert_eq!(voice.waveform, OscillatorWaveform::Sine);
        assert_eq!(voice.instrument, Instrument::Flute);
        assert_eq!(voice.gain, 0.5);
        tracked.push((voice.frequency_hz, voice.started_at));
    }

    assert!(tracked.len() > 150, "only {} frames tracked", tracked.len());
    let started_at = tracked[0].1;
    assert!(tracked.iter().all(|&(_, s)| s == started_at), "voice was recreated");

    for pair in tracked.windows(2) {
        let (prev, next) = (pair[0].0, pair[1].0);
        assert!(next >= prev * 0.99, "pitch fell from {prev} to {next}");
    }
    let first = tracked[0].0;
    let last = tracked[tracked.len() - 1].0;
    assert!((200.0..260.0).contains(&first), "first {first}");
    assert!((400.0..445.0).contains(&last), "last {last}");

    assert_eq!(transport.state(), SessionState::Stopped);
    assert!(transport.voice().is_none());
    assert!(!output.is_open());
}

#[test]
fn voice_is_mixed_over_the_source() {
    let (mut transport, output) = transport(Instrument::Bass);
    let bytes = wav(&sine(220.0, 1.0, RATE), RATE, 1);
    let source = retimbre::io::decode(&bytes).unwrap();
    transport.upload(Upload::new("a.wav", bytes)).unwrap();

    for _ in 0..5 {
        frame(&mut transport, &output);
    }
    assert_eq!(transport.voice().unwrap().waveform, OscillatorWaveform::Square);

    // Whatever is not the source is the voice: a square wave at gain 0.5
    let played = &source.channel(0).unwrap()[5 * FRAME..6 * FRAME];
    let block = output.render(FRAME);
    for (mixed, original) in block.iter().zip(played) {
        let voice = mixed - original;
        assert!((voice.abs() - 0.5).abs() < 1e-4, "voice sample {voice}");
    }
}

#[test]
fn stop_ends_all_frame_work() {
    let (mut transport, output) = transport(Instrument::Piano);
    transport
        .upload(Upload::new("a.wav", wav(&sine(440.0, 2.0, RATE), RATE, 1)))
        .unwrap();
    for _ in 0..10 {
        frame(&mut transport, &output);
    }
    assert!(transport.voice().is_some());

    assert!(transport.user_stop());
    let frames_run = transport.frames_run();
    let estimate = transport.last_estimate();

    for _ in 0..10 {
        assert_eq!(frame(&mut transport, &output), FrameOutcome::Halted);
    }
    assert_eq!(transport.frames_run(), frames_run);
    assert_eq!(transport.last_estimate(), estimate);
    assert!(transport.voice().is_none());
    assert!(output.render(FRAME).iter().all(|&s| s == 0.0));
}

#[test]
fn reupload_mid_playback_never_overlaps_sessions() {
    let (mut transport, output) = transport(Instrument::Violin);
    transport
        .upload(Upload::new("a.wav", wav(&sine(440.0, 2.0, RATE), RATE, 1)))
        .unwrap();
    for _ in 0..10 {
        frame(&mut transport, &output);
    }
    let first = transport.voice().unwrap();

    transport
        .upload(Upload::new("b.wav", wav(&sine(220.0, 2.0, RATE), RATE, 1)))
        .unwrap();
    assert_eq!(output.peak_live_streams(), 1);
    assert_eq!(output.live_streams(), 1);
    assert!(transport.voice().is_none());

    for _ in 0..10 {
        frame(&mut transport, &output);
    }
    let second = transport.voice().unwrap();
    assert!((first.frequency_hz - 440.0).abs() < 4.4);
    assert!((second.frequency_hz - 220.0).abs() < 2.2);
    assert!(
        second.started_at < 10 * FRAME as u64,
        "second session has its own clock"
    );
}

#[test]
fn stereo_at_another_rate_is_resampled_and_tracked() {
    let (mut transport, output) = transport(Instrument::Synth);
    let bytes = wav(&sine(330.0, 1.0, 48_000), 48_000, 2);
    transport.upload(Upload::new("stereo.wav", bytes)).unwrap();

    let info = transport.source_info().unwrap().clone();
    assert_eq!(info.sample_rate, 48_000);
    assert_eq!(info.channels, 2);
    assert_eq!(info.output_rate, RATE);

    for _ in 0..10 {
        frame(&mut transport, &output);
    }
    let voice = transport.voice().unwrap();
    assert!((voice.frequency_hz - 330.0).abs() < 3.3, "{}", voice.frequency_hz);
}

#[test]
fn silence_never_starts_a_voice() {
    let (mut transport, output) = transport(Instrument::Piano);
    transport
        .upload(Upload::new("quiet.wav", wav(&vec![0.0; RATE as usize], RATE, 1)))
        .unwrap();

    for _ in 0..20 {
        frame(&mut transport, &output);
        assert!(transport.voice().is_none());
        let estimate = transport.last_estimate().unwrap();
        assert_eq!(estimate.frequency_hz, None);
    }
}

#[test]
fn failed_decode_after_a_session_leaves_nothing_running() {
    let (mut transport, output) = transport(Instrument::Piano);
    transport
        .upload(Upload::new("a.wav", wav(&sine(440.0, 1.0, RATE), RATE, 1)))
        .unwrap();
    frame(&mut transport, &output);

    let err = transport
        .upload(Upload::new("broken.mp3", b"definitely not audio".to_vec()))
        .unwrap_err();
    assert!(matches!(err, TransportError::Decode(_)));
    assert_eq!(transport.state(), SessionState::Idle);
    assert_eq!(output.live_streams(), 0);
    assert!(transport.source_info().is_none());
}

#[test]
fn output_failure_is_reported_and_recoverable_by_reupload() {
    let output = HeadlessOutput::failing(RATE, PlaybackGraphError::BuildStream("busy".into()));
    let mut transport = TransportController::new(output, PipelineConfig::new()).unwrap();

    let err = transport
        .upload(Upload::new("a.wav", wav(&sine(440.0, 0.5, RATE), RATE, 1)))
        .unwrap_err();
    assert!(matches!(err, TransportError::Playback(PlaybackGraphError::BuildStream(_))));
    assert_eq!(transport.state(), SessionState::Idle);
    assert_eq!(transport.tick(), FrameOutcome::Halted);
}

#[test]
fn preview_plays_on_its_own_output_without_touching_the_session() {
    let (mut transport, output) = transport(Instrument::Piano);
    let speaker = HeadlessOutput::new(RATE);
    let mut player = PreviewPlayer::new(speaker.clone());

    let first = wav(&sine(330.0, 2.0, RATE), RATE, 1);
    transport.upload(Upload::new("first.wav", first)).unwrap();
    let href = transport.preview().unwrap().href().to_owned();

    assert!(player.toggle(transport.previews(), &href).unwrap());
    for _ in 0..5 {
        assert_eq!(frame(&mut transport, &output), FrameOutcome::Continued);
        assert!(speaker.render(FRAME).iter().any(|&s| s != 0.0));
    }
    assert_eq!(transport.state(), SessionState::Playing);
    assert_eq!(output.live_streams(), 1);

    // Stopping the session leaves the preview alone, and the other way round
    assert!(transport.user_stop());
    assert!(!player.sync(transport.previews()));
    assert!(speaker.is_open());
    assert!(!player.toggle(transport.previews(), &href).unwrap());
    assert_eq!(transport.state(), SessionState::Stopped);
    assert!(player.toggle(transport.previews(), &href).unwrap());

    // A new upload revokes the old preview
    let second = wav(&sine(440.0, 2.0, RATE), RATE, 1);
    transport.upload(Upload::new("second.wav", second)).unwrap();
    assert!(player.sync(transport.previews()));
    assert!(!speaker.is_open());
    assert!(!player.is_playing());
    assert_eq!(transport.state(), SessionState::Playing);
    assert!(matches!(
        player.play(transport.previews(), &href),
        Err(TransportError::PreviewRevoked(_))
    ));
}
