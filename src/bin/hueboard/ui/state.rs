//! Per-frame snapshot of the engine for drawing
//!
//! Captured once per frame so widgets never touch the dispatcher directly.

use hueboard::{
    color::Hsl,
    graph::{AudioGraph, Waveform},
    pitch::KeyId,
    synth::{Balance, ColorState, EnvelopePhase, InputDispatcher},
};

/// Everything the widgets need for one frame
#[derive(Clone, Debug)]
pub struct UiState {
    /// Waveform for new voices
    pub waveform: Waveform,
    /// Result of the last rebalance
    pub balance: Balance,
    /// Registered voices and their envelope phase, sorted by key
    pub sounding: Vec<(KeyId, EnvelopePhase)>,
    /// Current background override
    pub backdrop: Option<Hsl>,
    /// Whether the terminal reports key releases
    pub release_events: bool,
}

impl UiState {
    pub fn capture<G: AudioGraph>(
        dispatcher: &InputDispatcher<G, ColorState>,
        release_events: bool,
    ) -> Self {
        let now = dispatcher.graph().current_time();
        let registry = dispatcher.registry();
        let sounding = registry
            .active_keys()
            .into_iter()
            .filter_map(|key| registry.voice(key).map(|v| (key, v.phase(now))))
            .collect();

        Self {
            waveform: dispatcher.waveform(),
            balance: dispatcher.balance(),
            sounding,
            backdrop: dispatcher.backdrop().current,
            release_events,
        }
    }

    /// Envelope phase of the voice on `key`, if any
    pub fn phase(&self, key: KeyId) -> Option<EnvelopePhase> {
        self.sounding
            .iter()
            .find(|(k, _)| *k == key)
            .map(|&(_, phase)| phase)
    }
}
