//! End-to-end checks of the note engine driving the realtime graph.

use hueboard::{
    config::EngineConfig,
    graph::{
        realtime::{channel, ControlGraph, Renderer},
        AudioGraph, GainControl,
    },
    pitch::{KeyId, PitchTable},
    synth::{ColorState, Dispatch, EnvelopePhase, InputDispatcher, InputEvent},
};

const SAMPLE_RATE: f32 = 48_000.0;

type Engine = InputDispatcher<ControlGraph, ColorState>;

fn setup() -> (Engine, Renderer) {
    let config = EngineConfig::default();
    let (graph, renderer) = channel(SAMPLE_RATE, config.master_gain);
    let dispatcher = InputDispatcher::new(
        graph,
        PitchTable::default(),
        ColorState::default(),
        &config,
    );
    (dispatcher, renderer)
}

/// Render `seconds` of audio and return it.
fn advance(renderer: &mut Renderer, seconds: f64) -> Vec<f32> {
    let frames = (seconds * SAMPLE_RATE as f64).round() as usize;
    let mut out = vec![0.0; frames];
    for chunk in out.chunks_mut(hueboard::MAX_BLOCK_SIZE) {
        renderer.render_block(chunk);
    }
    out
}

fn press(key: u32) -> InputEvent {
    InputEvent::Press {
        key: KeyId(key),
        repeat: false,
    }
}

fn release(key: u32) -> InputEvent {
    InputEvent::Release { key: KeyId(key) }
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
}

fn gain_now(engine: &Engine, key: u32) -> Option<f32> {
    let now = engine.graph().current_time();
    engine
        .registry()
        .voice(KeyId(key))
        .map(|voice| voice.gain().value_at(now))
}

#[test]
fn two_note_chord_lifecycle() {
    let (mut engine, mut renderer) = setup();

    // C4 alone takes the full headroom and paints hue 90
    assert!(matches!(engine.handle(press(90)), Dispatch::Started(_)));
    let balance = engine.balance();
    assert_eq!(balance.voices, 1);
    assert!((balance.target_gain - 0.9).abs() < 1e-6);
    assert!((balance.average_frequency.unwrap() - 261.625_58).abs() < 1e-3);
    let hue = engine.backdrop().current.unwrap().hue;
    assert!((hue - 90.0).abs() < 0.01, "hue {hue}");

    let out = advance(&mut renderer, 0.1);
    assert!((gain_now(&engine, 90).unwrap() - 0.9).abs() < 1e-4);
    // Settled tail: 0.9 voice gain through the 0.8 bus
    let tail = peak(&out[out.len() / 2..]);
    assert!(tail > 0.7 && tail <= 0.72 + 1e-4, "tail peak {tail}");

    // Adding E4 halves both voices
    engine.handle(press(67));
    let balance = engine.balance();
    assert_eq!(balance.voices, 2);
    assert!((balance.target_gain - 0.45).abs() < 1e-6);
    assert!((balance.average_frequency.unwrap() - 295.626_57).abs() < 1e-3);

    advance(&mut renderer, 0.1);
    assert!((gain_now(&engine, 90).unwrap() - 0.45).abs() < 1e-4);
    assert!((gain_now(&engine, 67).unwrap() - 0.45).abs() < 1e-4);

    // Releasing C4 keeps it registered until the graph reports it stopped
    assert_eq!(engine.handle(release(90)), Dispatch::Released);
    assert!(engine.registry().contains(KeyId(90)));
    assert_eq!(engine.balance().voices, 2);
    assert!(engine.poll().is_empty());

    advance(&mut renderer, 0.1);
    assert_eq!(engine.poll(), vec![KeyId(90)]);
    assert_eq!(engine.registry().active_keys(), vec![KeyId(67)]);

    let balance = engine.balance();
    assert_eq!(balance.voices, 1);
    assert!((balance.target_gain - 0.9).abs() < 1e-6);
    let hue = engine.backdrop().current.unwrap().hue;
    assert!((hue - 210.0).abs() < 0.01, "hue {hue}");

    advance(&mut renderer, 0.1);
    assert!((gain_now(&engine, 67).unwrap() - 0.9).abs() < 1e-4);

    // Last release clears the backdrop once the voice is gone
    engine.handle(release(67));
    advance(&mut renderer, 0.1);
    assert_eq!(engine.poll(), vec![KeyId(67)]);
    assert!(engine.registry().is_empty());
    assert_eq!(engine.backdrop().current, None);
    assert_eq!(engine.balance().average_frequency, None);

    let silence = advance(&mut renderer, 0.05);
    assert!(silence.iter().all(|&s| s == 0.0));
    assert_eq!(renderer.voice_count(), 0);
}

#[test]
fn every_mapped_key_sounds_its_pitch() {
    let table = PitchTable::default();
    let (mut engine, _renderer) = setup();

    for key in table.keys() {
        assert!(
            matches!(engine.press(key, false), Dispatch::Started(_)),
            "key {key}"
        );
        let voice = engine.registry().voice(key).unwrap();
        assert_eq!(Some(voice.frequency()), table.frequency_for(key));
    }

    let all = table.len();
    assert_eq!(engine.registry().len(), all);
    let expected = 0.9 / all as f32;
    for voice in engine.registry().active_voices() {
        assert!((voice.target_gain() - expected).abs() < 1e-6);
    }
}

#[test]
fn full_chord_stays_within_headroom() {
    let (mut engine, mut renderer) = setup();
    for key in PitchTable::default().keys().collect::<Vec<_>>() {
        engine.press(key, false);
    }

    advance(&mut renderer, 0.1);
    let settled = advance(&mut renderer, 0.1);
    let bound = 0.9 * EngineConfig::default().master_gain + 1e-4;
    assert!(peak(&settled) <= bound, "peak {}", peak(&settled));
}

#[test]
fn held_key_ignores_auto_repeat() {
    let (mut engine, mut renderer) = setup();
    let Dispatch::Started(first) = engine.handle(press(78)) else {
        panic!("A4 did not start");
    };

    for _ in 0..5 {
        advance(&mut renderer, 0.03);
        let repeat = InputEvent::Press {
            key: KeyId(78),
            repeat: true,
        };
        assert_eq!(engine.handle(repeat), Dispatch::Ignored);
    }
    assert_eq!(engine.registry().voice(KeyId(78)).map(|v| v.id()), Some(first));
    assert_eq!(renderer.voice_count(), 1);
}

#[test]
fn unmapped_key_changes_nothing() {
    let (mut engine, mut renderer) = setup();
    engine.handle(press(90));
    let before = engine.balance();

    assert_eq!(engine.handle(press(65)), Dispatch::Ignored);
    assert_eq!(engine.handle(release(65)), Dispatch::Ignored);
    assert_eq!(engine.balance(), before);
    assert_eq!(engine.registry().active_keys(), vec![KeyId(90)]);

    advance(&mut renderer, 0.01);
    assert_eq!(renderer.voice_count(), 1);
}

#[test]
fn key_can_be_replayed_after_completion() {
    let (mut engine, mut renderer) = setup();
    let Dispatch::Started(first) = engine.handle(press(90)) else {
        panic!("C4 did not start");
    };
    engine.handle(release(90));

    // Still fading out: a new press is dropped
    assert_eq!(engine.handle(press(90)), Dispatch::Ignored);
    let now = engine.graph().current_time();
    let phase = engine.registry().voice(KeyId(90)).map(|v| v.phase(now));
    assert_eq!(phase, Some(EnvelopePhase::Releasing));

    advance(&mut renderer, 0.1);
    assert_eq!(engine.poll(), vec![KeyId(90)]);

    let Dispatch::Started(second) = engine.handle(press(90)) else {
        panic!("C4 did not restart");
    };
    assert_ne!(first, second);
    assert_eq!(engine.registry().len(), 1);
}
