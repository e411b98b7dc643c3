use crate::graph::oscillator::Waveform;

/// Identity of one tone generator, unique for the lifetime of a graph.
pub type VoiceId = u64;

/// A gain value schedulable in continuous time (seconds).
pub trait GainControl {
    /// The control's value at `time`, given everything scheduled so far.
    fn value_at(&self, time: f64) -> f32;

    /// Jump to `value` at `time`.
    fn set_value_at_time(&mut self, value: f32, time: f64);

    /// Ramp exponentially from the previous scheduled value to `value`,
    /// arriving at `end_time`.
    fn exponential_ramp_to_value_at_time(&mut self, value: f32, end_time: f64);

    /// Drop every change scheduled at or after `time`.
    fn cancel_scheduled_values(&mut self, time: f64);
}

/// An oscillator that runs between a start and a stop time.
pub trait ToneGenerator {
    fn id(&self) -> VoiceId;

    fn frequency(&self) -> f32;

    fn waveform(&self) -> Waveform;

    fn start(&mut self, time: f64);

    /// Request the generator halt at `time`. Once it has actually stopped, the
    /// graph reports its id through [`AudioGraph::poll_ended`].
    fn stop(&mut self, time: f64);

    /// Whether a stop has been requested.
    fn is_stopping(&self) -> bool;
}

/// The audio synthesis graph a voice is built on.
///
/// Every voice chain is generator → gain → the shared output bus.
pub trait AudioGraph {
    type Gain: GainControl;
    type Generator: ToneGenerator;

    /// Current position of the audio clock, in seconds.
    fn current_time(&self) -> f64;

    /// Create a generator and its gain control, wired to the output bus.
    ///
    /// The gain starts at `initial_gain`; the generator is not started.
    fn create_voice(
        &mut self,
        frequency: f32,
        waveform: Waveform,
        initial_gain: f32,
    ) -> (Self::Generator, Self::Gain);

    /// Ids of generators that have stopped since the last poll, in the order
    /// they stopped.
    fn poll_ended(&mut self) -> Vec<VoiceId>;
}
