use crate::graph::node::{GainControl, ToneGenerator};

/*
Voice Envelope
==============

Every voice uses the same attack/release shape, applied by scheduling gain
automation rather than computing levels sample by sample:

  gain
 target ┤     ╭────────────────╮
        │    ╱                  ╲
        │   ╱                    ╲
  floor ┼──╯                      ╰──┤ stop
        └──┬─────┬──────────────┬────┬──┬──→ time
         press  +60ms        release +30ms +40ms

  attack   start at the silence floor; the balancer then ramps toward the
           voice's target gain over `attack` (exponential)
  release  anchor at the current level, ramp to the floor over `release`
  stop     halt the generator `stop_after` past release, once silent

Exponential ramps cannot start or end at zero, so "silent" is a small
positive floor. Every ramp is preceded by cancel + anchor: pending changes
are dropped and the current instantaneous level (clamped to the floor) is
pinned at the start time, so retriggering mid-ramp never jumps.
*/

/// Default silence floor for gain ramps.
pub const SILENCE_FLOOR: f32 = 0.0001;
/// Default attack ramp, seconds.
pub const ATTACK_TIME: f64 = 0.06;
/// Default release ramp, seconds.
pub const RELEASE_TIME: f64 = 0.03;
/// Default delay from release to generator stop, seconds.
pub const STOP_AFTER: f64 = 0.04;

/// Amplitude-over-time contract for a single voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceEnvelope {
    pub silence_floor: f32,
    pub attack: f64,
    pub release: f64,
    /// Must be longer than `release`.
    pub stop_after: f64,
}

impl Default for VoiceEnvelope {
    fn default() -> Self {
        Self {
            silence_floor: SILENCE_FLOOR,
            attack: ATTACK_TIME,
            release: RELEASE_TIME,
            stop_after: STOP_AFTER,
        }
    }
}

impl VoiceEnvelope {
    /// Drop pending changes and pin the current level (clamped to the floor)
    /// at `at`. Returns the pinned level.
    fn anchor<G: GainControl>(&self, gain: &mut G, at: f64) -> f32 {
        let level = gain.value_at(at).max(self.silence_floor);
        gain.cancel_scheduled_values(at);
        gain.set_value_at_time(level, at);
        level
    }

    /// Put a fresh voice at the silence floor.
    pub fn attack<G: GainControl>(&self, gain: &mut G, at: f64) {
        gain.cancel_scheduled_values(at);
        gain.set_value_at_time(self.silence_floor, at);
    }

    /// Glide from the current level to `target` over the attack time.
    ///
    /// Returns when the ramp settles.
    pub fn ramp_to<G: GainControl>(&self, gain: &mut G, target: f32, at: f64) -> f64 {
        self.anchor(gain, at);
        let settles_at = at + self.attack;
        gain.exponential_ramp_to_value_at_time(target.max(self.silence_floor), settles_at);
        settles_at
    }

    /// Fade from the current level to the floor over the release time.
    pub fn release<G: GainControl>(&self, gain: &mut G, at: f64) {
        self.anchor(gain, at);
        gain.exponential_ramp_to_value_at_time(self.silence_floor, at + self.release);
    }

    /// Ask the generator to halt once the release has gone silent.
    ///
    /// Returns the stop time, or `None` if a stop was already requested.
    pub fn schedule_stop<T: ToneGenerator>(&self, generator: &mut T, at: f64) -> Option<f64> {
        if generator.is_stopping() {
            return None;
        }
        let stop_at = at + self.stop_after;
        generator.stop(stop_at);
        Some(stop_at)
    }
}
