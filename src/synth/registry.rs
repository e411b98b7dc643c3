use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::graph::node::{AudioGraph, ToneGenerator, VoiceId};
use crate::graph::oscillator::Waveform;
use crate::pitch::{KeyId, PitchTable};
use crate::synth::envelope::VoiceEnvelope;
use crate::synth::voice::Voice;

/// Why a start request was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRejection {
    /// The key has no pitch.
    UnknownKey,
    /// The key already has a voice, sounding or still releasing.
    DuplicateStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    /// No voice for the key, or it is already releasing.
    Ignored,
}

/// The live set of voices, at most one per key.
///
/// A released voice stays registered until its generator reports that it
/// stopped, so a quick re-press of the same key cannot stack a second
/// generator on top of the fading one.
pub struct VoiceRegistry<G: AudioGraph> {
    pitches: PitchTable,
    envelope: VoiceEnvelope,
    voices: HashMap<KeyId, Voice<G>>,
}

impl<G: AudioGraph> VoiceRegistry<G> {
    pub fn new(pitches: PitchTable, envelope: VoiceEnvelope) -> Self {
        Self {
            pitches,
            envelope,
            voices: HashMap::with_capacity(32),
        }
    }

    pub fn pitches(&self) -> &PitchTable {
        &self.pitches
    }

    pub fn envelope(&self) -> &VoiceEnvelope {
        &self.envelope
    }

    /// Start a voice for `key` with the given waveform.
    ///
    /// The generator starts immediately at the silence floor; ramping it up
    /// is left to the balancer.
    pub fn start_voice(
        &mut self,
        graph: &mut G,
        key: KeyId,
        waveform: Waveform,
    ) -> Result<&Voice<G>, StartRejection> {
        let frequency = self
            .pitches
            .frequency_for(key)
            .ok_or(StartRejection::UnknownKey)?;

        let slot = match self.voices.entry(key) {
            Entry::Occupied(_) => return Err(StartRejection::DuplicateStart),
            Entry::Vacant(slot) => slot,
        };

        let now = graph.current_time();
        let floor = self.envelope.silence_floor;
        let (mut generator, mut gain) = graph.create_voice(frequency, waveform, floor);
        generator.start(now);
        self.envelope.attack(&mut gain, now);

        log::debug!(
            "voice {} started: key {key} at {frequency:.2} Hz ({waveform})",
            generator.id()
        );
        Ok(slot.insert(Voice::new(key, frequency, generator, gain, floor)))
    }

    /// Fade out the voice for `key` and schedule its generator to stop.
    ///
    /// The voice stays registered until [`VoiceRegistry::complete`] is called
    /// with its id.
    pub fn release_voice(&mut self, graph: &G, key: KeyId) -> ReleaseOutcome {
        let Some(voice) = self.voices.get_mut(&key) else {
            return ReleaseOutcome::Ignored;
        };
        if voice.is_releasing() {
            return ReleaseOutcome::Ignored;
        }

        let now = graph.current_time();
        self.envelope.release(voice.gain_mut(), now);
        if let Some(stop_at) = self.envelope.schedule_stop(voice.generator_mut(), now) {
            voice.mark_released(self.envelope.silence_floor, stop_at);
        }

        log::debug!("voice {} releasing: key {key}", voice.id());
        ReleaseOutcome::Released
    }

    /// Remove the voice whose generator `id` has stopped.
    ///
    /// Returns the key it was registered under. Notices for unknown or stale
    /// ids are ignored.
    pub fn complete(&mut self, id: VoiceId) -> Option<KeyId> {
        let key = self
            .voices
            .iter()
            .find(|(_, voice)| voice.id() == id)
            .map(|(&key, _)| key)?;
        self.voices.remove(&key);
        log::debug!("voice {id} finished: key {key}");
        Some(key)
    }

    pub fn voice(&self, key: KeyId) -> Option<&Voice<G>> {
        self.voices.get(&key)
    }

    pub fn contains(&self, key: KeyId) -> bool {
        self.voices.contains_key(&key)
    }

    /// Every registered voice, releasing ones included.
    pub fn active_voices(&self) -> impl Iterator<Item = &Voice<G>> + '_ {
        self.voices.values()
    }

    pub(crate) fn active_voices_mut(&mut self) -> impl Iterator<Item = &mut Voice<G>> + '_ {
        self.voices.values_mut()
    }

    /// Keys with a registered voice, sorted.
    pub fn active_keys(&self) -> Vec<KeyId> {
        let mut keys: Vec<KeyId> = self.voices.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::GainControl;
    use crate::graph::realtime::{channel, ControlGraph, Renderer};
    use crate::synth::balancer::{ColorState, PolyphonyBalancer, HEADROOM};

    fn setup() -> (ControlGraph, Renderer, VoiceRegistry<ControlGraph>) {
        let (graph, renderer) = channel(1_000.0, 0.8);
        let registry = VoiceRegistry::new(PitchTable::default(), VoiceEnvelope::default());
        (graph, renderer, registry)
    }

    fn advance(renderer: &mut Renderer, frames: usize) {
        let mut out = vec![0.0; frames];
        renderer.render_block(&mut out);
    }

    #[test]
    fn start_registers_one_voice_at_key_pitch() {
        let (mut graph, _renderer, mut registry) = setup();
        let table = PitchTable::default();
        for key in table.keys() {
            let voice = registry
                .start_voice(&mut graph, key, Waveform::Sine)
                .unwrap();
            assert_eq!(voice.frequency(), table.frequency_for(key).unwrap());
            assert_eq!(voice.key(), key);
        }
        assert_eq!(registry.len(), table.len());
    }

    #[test]
    fn new_voice_sits_at_silence_floor() {
        let (mut graph, _renderer, mut registry) = setup();
        let voice = registry
            .start_voice(&mut graph, KeyId(90), Waveform::Triangle)
            .unwrap();
        assert_eq!(voice.gain().value_at(0.0), VoiceEnvelope::default().silence_floor);
        assert_eq!(voice.generator().waveform(), Waveform::Triangle);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let (mut graph, _renderer, mut registry) = setup();
        let result = registry.start_voice(&mut graph, KeyId(65), Waveform::Sine);
        assert_eq!(result.err(), Some(StartRejection::UnknownKey));
        assert!(registry.is_empty());
    }

    #[test]
    fn second_start_is_rejected() {
        let (mut graph, _renderer, mut registry) = setup();
        let first = registry
            .start_voice(&mut graph, KeyId(90), Waveform::Sine)
            .map(|v| v.id())
            .unwrap();
        let second = registry.start_voice(&mut graph, KeyId(90), Waveform::Sine);
        assert_eq!(second.err(), Some(StartRejection::DuplicateStart));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.voice(KeyId(90)).map(|v| v.id()), Some(first));
    }

    #[test]
    fn second_release_is_ignored() {
        let (mut graph, _renderer, mut registry) = setup();
        registry
            .start_voice(&mut graph, KeyId(90), Waveform::Sine)
            .unwrap();
        assert_eq!(
            registry.release_voice(&graph, KeyId(90)),
            ReleaseOutcome::Released
        );
        assert_eq!(
            registry.release_voice(&graph, KeyId(90)),
            ReleaseOutcome::Ignored
        );
        assert_eq!(
            registry.release_voice(&graph, KeyId(67)),
            ReleaseOutcome::Ignored
        );
    }

    #[test]
    fn released_voice_stays_until_generator_stops() {
        let (mut graph, mut renderer, mut registry) = setup();
        registry
            .start_voice(&mut graph, KeyId(90), Waveform::Sine)
            .unwrap();
        advance(&mut renderer, 100);
        registry.release_voice(&graph, KeyId(90));

        // Re-press while releasing is blocked.
        assert_eq!(
            registry
                .start_voice(&mut graph, KeyId(90), Waveform::Sine)
                .err(),
            Some(StartRejection::DuplicateStart)
        );

        advance(&mut renderer, 20);
        assert!(graph.poll_ended().is_empty());
        assert!(registry.contains(KeyId(90)));

        advance(&mut renderer, 30);
        let ended = graph.poll_ended();
        assert_eq!(ended.len(), 1);
        assert_eq!(registry.complete(ended[0]), Some(KeyId(90)));
        assert!(registry.is_empty());
    }

    #[test]
    fn stale_completion_leaves_newer_voice() {
        let (mut graph, _renderer, mut registry) = setup();
        let old = registry
            .start_voice(&mut graph, KeyId(90), Waveform::Sine)
            .map(|v| v.id())
            .unwrap();
        registry.complete(old);
        let new = registry
            .start_voice(&mut graph, KeyId(90), Waveform::Sine)
            .map(|v| v.id())
            .unwrap();

        assert_eq!(registry.complete(old), None);
        assert_eq!(registry.voice(KeyId(90)).map(|v| v.id()), Some(new));
    }

    #[test]
    fn completions_may_arrive_out_of_release_order() {
        let (mut graph, _renderer, mut registry) = setup();
        let mut balancer = PolyphonyBalancer::new(HEADROOM, ColorState::default());
        let mut start = |registry: &mut VoiceRegistry<ControlGraph>, key| {
            registry
                .start_voice(&mut graph, KeyId(key), Waveform::Sine)
                .map(|v| v.id())
                .unwrap()
        };
        let c4 = start(&mut registry, 90);
        let e4 = start(&mut registry, 67);
        start(&mut registry, 78);

        registry.release_voice(&graph, KeyId(90));
        registry.release_voice(&graph, KeyId(67));

        assert_eq!(registry.complete(e4), Some(KeyId(67)));
        assert!(registry.contains(KeyId(90)));
        assert!(registry.contains(KeyId(78)));

        assert_eq!(registry.complete(c4), Some(KeyId(90)));
        assert_eq!(registry.active_keys(), vec![KeyId(78)]);

        let balance = balancer.rebalance(&mut registry, 0.0);
        assert_eq!(balance.voices, 1);
        let survivor = registry.voice(KeyId(78)).unwrap();
        assert!((survivor.target_gain() - 0.9).abs() < 1e-6);
    }
}
