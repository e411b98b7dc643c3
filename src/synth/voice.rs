use crate::graph::node::{AudioGraph, ToneGenerator, VoiceId};
use crate::pitch::KeyId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopePhase {
    Attacking, // Ramping toward the target gain
    Steady,    // Holding the target gain
    Releasing, // Key released, fading to the silence floor
    Stopped,   // Generator halted, waiting for the completion notice
}

/// One sounding note: a tone generator and its gain control, owned by the
/// registry under the key that started it.
pub struct Voice<G: AudioGraph> {
    key: KeyId,
    frequency: f32,
    generator: G::Generator,
    gain: G::Gain,
    target_gain: f32,
    settles_at: f64,
    stop_at: Option<f64>,
}

impl<G: AudioGraph> Voice<G> {
    pub(crate) fn new(
        key: KeyId,
        frequency: f32,
        generator: G::Generator,
        gain: G::Gain,
        initial_gain: f32,
    ) -> Self {
        Self {
            key,
            frequency,
            generator,
            gain,
            target_gain: initial_gain,
            settles_at: f64::NEG_INFINITY,
            stop_at: None,
        }
    }

    pub fn id(&self) -> VoiceId {
        self.generator.id()
    }

    pub fn key(&self) -> KeyId {
        self.key
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Level the gain is currently heading toward.
    ///
    /// Once released this is the silence floor, even though the voice still
    /// counts toward the shared target reported in `Balance::target_gain`.
    pub fn target_gain(&self) -> f32 {
        self.target_gain
    }

    pub fn generator(&self) -> &G::Generator {
        &self.generator
    }

    pub fn gain(&self) -> &G::Gain {
        &self.gain
    }

    pub fn is_releasing(&self) -> bool {
        self.stop_at.is_some()
    }

    /// Envelope phase at audio time `now`.
    pub fn phase(&self, now: f64) -> EnvelopePhase {
        match self.stop_at {
            Some(stop) if now >= stop => EnvelopePhase::Stopped,
            Some(_) => EnvelopePhase::Releasing,
            None if now < self.settles_at => EnvelopePhase::Attacking,
            None => EnvelopePhase::Steady,
        }
    }

    pub(crate) fn gain_mut(&mut self) -> &mut G::Gain {
        &mut self.gain
    }

    pub(crate) fn generator_mut(&mut self) -> &mut G::Generator {
        &mut self.generator
    }

    pub(crate) fn retarget(&mut self, target: f32, settles_at: f64) {
        self.target_gain = target;
        self.settles_at = settles_at;
    }

    pub(crate) fn mark_released(&mut self, floor: f32, stop_at: f64) {
        self.target_gain = floor;
        self.stop_at = Some(stop_at);
    }
}
