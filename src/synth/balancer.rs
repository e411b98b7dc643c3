use crate::color::{color_for, Hsl};
use crate::graph::node::AudioGraph;
use crate::synth::registry::VoiceRegistry;

/// Default fraction of full scale shared between all voices.
pub const HEADROOM: f32 = 0.9;

/// Display surface whose background follows the chord.
pub trait Backdrop {
    fn set_color(&mut self, color: Hsl);

    /// Remove any color override.
    fn clear(&mut self);
}

/// Backdrop that only remembers the last request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColorState {
    pub current: Option<Hsl>,
}

impl Backdrop for ColorState {
    fn set_color(&mut self, color: Hsl) {
        self.current = Some(color);
    }

    fn clear(&mut self) {
        self.current = None;
    }
}

/// Steady-state gain of each voice when `active` voices sound together.
#[inline]
pub fn target_gain(active: usize, headroom: f32) -> f32 {
    (1.0 / active.max(1) as f32) * headroom
}

/// Snapshot of the last rebalance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Balance {
    /// Registered voices, releasing ones included.
    pub voices: usize,
    pub target_gain: f32,
    /// Mean frequency of registered voices, if any.
    pub average_frequency: Option<f32>,
    pub color: Option<Hsl>,
}

/// Keeps the summed loudness of all voices bounded and the backdrop in step
/// with the chord.
pub struct PolyphonyBalancer<D: Backdrop> {
    headroom: f32,
    backdrop: D,
    last: Balance,
}

impl<D: Backdrop> PolyphonyBalancer<D> {
    pub fn new(headroom: f32, backdrop: D) -> Self {
        Self {
            headroom,
            backdrop,
            last: Balance {
                voices: 0,
                target_gain: target_gain(0, headroom),
                average_frequency: None,
                color: None,
            },
        }
    }

    pub fn backdrop(&self) -> &D {
        &self.backdrop
    }

    pub fn backdrop_mut(&mut self) -> &mut D {
        &mut self.backdrop
    }

    pub fn last(&self) -> Balance {
        self.last
    }

    /// Re-aim every held voice at the shared target gain and recolor.
    ///
    /// Releasing voices still count toward the divisor and the color, but
    /// keep their fade-out.
    pub fn rebalance<G: AudioGraph>(&mut self, registry: &mut VoiceRegistry<G>, now: f64) -> Balance {
        let voices = registry.len();
        let target = target_gain(voices, self.headroom);
        let envelope = *registry.envelope();

        let mut frequency_sum = 0.0;
        for voice in registry.active_voices_mut() {
            frequency_sum += voice.frequency();
            if voice.is_releasing() {
                continue;
            }
            let settles_at = envelope.ramp_to(voice.gain_mut(), target, now);
            voice.retarget(target, settles_at);
        }

        let average_frequency = (voices > 0).then(|| frequency_sum / voices as f32);
        let color = average_frequency.map(color_for);
        match color {
            Some(color) => self.backdrop.set_color(color),
            None => self.backdrop.clear(),
        }

        self.last = Balance {
            voices,
            target_gain: target,
            average_frequency,
            color,
        };
        log::trace!("rebalanced {voices} voices to {target:.3}");
        self.last
    }
}
