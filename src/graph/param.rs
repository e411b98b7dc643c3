/*
Parameter Automation
====================

An AudioParam is a value scheduled over continuous time. Instead of setting
the value "now", callers describe its future as a timeline of events:

  SetValue { v, t }          jump to v at time t, hold until the next event
  ExponentialRamp { v, t }   glide from the previous event's value, arriving
                             at v exactly at time t

      value
        │          ramp ╭────────── set
   0.9  │        ╭──────╯
        │      ╭─╯
        │     ╱
  floor ├────╯
        └────┬──────────┬───────────→ time
            set        ramp end

Exponential Ramps
-----------------

Between (v0, t0) and (v1, t1):

    v(t) = v0 * (v1 / v0) ^ ((t - t0) / (t1 - t0))

Equal time steps multiply the value by the same ratio, which the ear hears as
a linear change in loudness. The catch: the curve can never touch zero or
cross it. A ramp whose endpoints are zero or have different signs holds v0
until its end time and then jumps. Envelopes therefore use a tiny positive
"silence floor" instead of 0.0.

Cancellation
------------

cancel_scheduled_values(t) removes every event whose time (a ramp's end time)
is at or after t. The usual retrigger pattern is:

    let now_value = param.value_at(now);
    param.cancel_scheduled_values(now);
    param.set_value_at_time(now_value, now);     // anchor, no discontinuity
    param.exponential_ramp_to_value_at_time(target, now + duration);
*/

use crate::graph::node::GainControl;

/// One scheduled change on an [`AudioParam`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamEvent {
    SetValue { value: f32, time: f64 },
    ExponentialRamp { value: f32, end_time: f64 },
}

impl ParamEvent {
    /// Time at which the event's value is reached.
    #[inline]
    pub fn time(&self) -> f64 {
        match *self {
            ParamEvent::SetValue { time, .. } => time,
            ParamEvent::ExponentialRamp { end_time, .. } => end_time,
        }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        match *self {
            ParamEvent::SetValue { value, .. } | ParamEvent::ExponentialRamp { value, .. } => value,
        }
    }
}

/// A value automated over continuous time.
#[derive(Debug, Clone)]
pub struct AudioParam {
    default_value: f32,
    /// Sorted by [`ParamEvent::time`]; equal times keep insertion order.
    events: Vec<ParamEvent>,
}

impl AudioParam {
    pub fn new(default_value: f32) -> Self {
        Self {
            default_value,
            events: Vec::with_capacity(8),
        }
    }

    pub fn events(&self) -> &[ParamEvent] {
        &self.events
    }

    /// Insert an event, keeping the timeline sorted.
    pub fn schedule(&mut self, event: ParamEvent) {
        let time = event.time();
        let index = self.events.partition_point(|e| e.time() <= time);
        self.events.insert(index, event);
    }

    /// Drop every event at or after `time`.
    pub fn cancel_from(&mut self, time: f64) {
        self.events.retain(|e| e.time() < time);
    }

    /// Value of the parameter at `time`.
    pub fn value_at(&self, time: f64) -> f32 {
        // First event still in the future.
        let next = self.events.partition_point(|e| e.time() <= time);
        let previous = next.checked_sub(1).map(|i| self.events[i]);

        match self.events.get(next) {
            Some(&ParamEvent::ExponentialRamp { value, end_time }) => {
                let (v0, t0) = previous
                    .map(|e| (e.value(), e.time()))
                    .unwrap_or((self.default_value, 0.0));
                exponential_interpolate(v0, t0, value, end_time, time)
            }
            _ => previous.map_or(self.default_value, |e| e.value()),
        }
    }

    /// Forget history before `time` without changing any value at or after it.
    ///
    /// The event in effect at `time` is kept as a plain `SetValue` anchor.
    pub fn prune_before(&mut self, time: f64) {
        let in_effect = self.events.partition_point(|e| e.time() <= time);
        if in_effect < 2 {
            return;
        }
        let anchor = self.events[in_effect - 1];
        self.events.drain(..in_effect - 1);
        self.events[0] = ParamEvent::SetValue {
            value: anchor.value(),
            time: anchor.time(),
        };
    }
}

impl GainControl for AudioParam {
    fn value_at(&self, time: f64) -> f32 {
        AudioParam::value_at(self, time)
    }

    fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.schedule(ParamEvent::SetValue { value, time });
    }

    fn exponential_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) {
        self.schedule(ParamEvent::ExponentialRamp { value, end_time });
    }

    fn cancel_scheduled_values(&mut self, time: f64) {
        self.cancel_from(time);
    }
}

#[inline]
fn exponential_interpolate(v0: f32, t0: f64, v1: f32, t1: f64, time: f64) -> f32 {
    if t1 <= t0 || time >= t1 {
        return v1;
    }
    if time <= t0 {
        return v0;
    }
    // Not representable as an exponential curve: hold until the end.
    if v0 == 0.0 || v1 == 0.0 || (v0 < 0.0) != (v1 < 0.0) {
        return v0;
    }
    let progress = (time - t0) / (t1 - t0);
    (v0 as f64 * (v1 as f64 / v0 as f64).powf(progress)) as f32
}
