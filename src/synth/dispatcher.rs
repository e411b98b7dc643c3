use crate::config::EngineConfig;
use crate::graph::node::{AudioGraph, VoiceId};
use crate::graph::oscillator::Waveform;
use crate::pitch::{KeyId, PitchTable};
use crate::synth::balancer::{Backdrop, Balance, PolyphonyBalancer};
use crate::synth::registry::{ReleaseOutcome, StartRejection, VoiceRegistry};

/// Raw input from the key event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Press { key: KeyId, repeat: bool },
    Release { key: KeyId },
}

/// What an input event did to the voice set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Started(VoiceId),
    Released,
    Ignored,
}

/// Single-threaded front door of the note engine.
///
/// Owns the graph handle, the voice registry and the balancer. Every change
/// to the voice set (start, release, completion) is followed by a rebalance.
pub struct InputDispatcher<G: AudioGraph, D: Backdrop> {
    graph: G,
    registry: VoiceRegistry<G>,
    balancer: PolyphonyBalancer<D>,
    waveform: Waveform,
}

impl<G: AudioGraph, D: Backdrop> InputDispatcher<G, D> {
    pub fn new(graph: G, pitches: PitchTable, backdrop: D, config: &EngineConfig) -> Self {
        Self {
            graph,
            registry: VoiceRegistry::new(pitches, config.envelope()),
            balancer: PolyphonyBalancer::new(config.headroom, backdrop),
            waveform: config.waveform,
        }
    }

    pub fn handle(&mut self, event: InputEvent) -> Dispatch {
        match event {
            InputEvent::Press { key, repeat } => self.press(key, repeat),
            InputEvent::Release { key } => self.release(key),
        }
    }

    pub fn press(&mut self, key: KeyId, repeat: bool) -> Dispatch {
        if repeat {
            return Dispatch::Ignored;
        }
        if !self.registry.pitches().contains(key) {
            log::trace!("press on unmapped key {key}");
            return Dispatch::Ignored;
        }

        let started = self
            .registry
            .start_voice(&mut self.graph, key, self.waveform)
            .map(|voice| voice.id());
        match started {
            Ok(id) => {
                self.rebalance();
                Dispatch::Started(id)
            }
            Err(StartRejection::DuplicateStart) => {
                log::trace!("key {key} already sounding");
                Dispatch::Ignored
            }
            Err(StartRejection::UnknownKey) => Dispatch::Ignored,
        }
    }

    pub fn release(&mut self, key: KeyId) -> Dispatch {
        if !self.registry.pitches().contains(key) {
            log::trace!("release on unmapped key {key}");
            return Dispatch::Ignored;
        }
        match self.registry.release_voice(&self.graph, key) {
            ReleaseOutcome::Released => {
                self.rebalance();
                Dispatch::Released
            }
            ReleaseOutcome::Ignored => {
                log::trace!("key {key} not sounding");
                Dispatch::Ignored
            }
        }
    }

    /// Retire voices whose generators have stopped.
    ///
    /// Call regularly from the control loop. Returns the keys freed.
    pub fn poll(&mut self) -> Vec<KeyId> {
        let freed: Vec<KeyId> = self
            .graph
            .poll_ended()
            .into_iter()
            .filter_map(|id| self.registry.complete(id))
            .collect();
        if !freed.is_empty() {
            self.rebalance();
        }
        freed
    }

    fn rebalance(&mut self) -> Balance {
        let now = self.graph.current_time();
        self.balancer.rebalance(&mut self.registry, now)
    }

    /// Waveform for voices started from now on.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        if waveform != self.waveform {
            log::debug!("waveform set to {waveform}");
        }
        self.waveform = waveform;
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn registry(&self) -> &VoiceRegistry<G> {
        &self.registry
    }

    pub fn balance(&self) -> Balance {
        self.balancer.last()
    }

    pub fn backdrop(&self) -> &D {
        self.balancer.backdrop()
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }
}
