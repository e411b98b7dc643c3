//! Lock-free audio graph split across the control and audio threads.
//!
//! [`ControlGraph`] lives on the control thread and implements [`AudioGraph`].
//! Every scheduling call is applied to a local copy of the timeline (so the
//! control thread can read instantaneous values without locking) and mirrored
//! to the [`Renderer`] through an `rtrb` ring buffer. The renderer runs in the
//! audio callback, owns the oscillators, and reports stopped generators back
//! through a second ring buffer.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rtrb::{Consumer, Producer, RingBuffer};

use crate::graph::node::{AudioGraph, GainControl, ToneGenerator, VoiceId};
use crate::graph::oscillator::{Oscillator, Waveform};
use crate::graph::param::{AudioParam, ParamEvent};

/// Capacity of the control → audio command queue.
pub const COMMAND_QUEUE_CAPACITY: usize = 4096;
/// Capacity of the audio → control completion queue.
pub const ENDED_QUEUE_CAPACITY: usize = 256;

/// Messages from the control thread to the renderer.
#[derive(Debug, Clone, Copy)]
pub enum GraphCommand {
    Create {
        id: VoiceId,
        frequency: f32,
        waveform: Waveform,
        initial_gain: f32,
    },
    Start {
        id: VoiceId,
        time: f64,
    },
    Stop {
        id: VoiceId,
        time: f64,
    },
    Schedule {
        id: VoiceId,
        event: ParamEvent,
    },
    Cancel {
        id: VoiceId,
        time: f64,
    },
}

type CommandLink = Rc<RefCell<Producer<GraphCommand>>>;

fn send(link: &CommandLink, command: GraphCommand) {
    if link.borrow_mut().push(command).is_err() {
        log::warn!("graph command queue full, dropped {command:?}");
    }
}

/// Build a connected control/render pair.
///
/// `master_gain` is the level of the shared output bus; it is fixed for the
/// lifetime of the graph.
pub fn channel(sample_rate: f32, master_gain: f32) -> (ControlGraph, Renderer) {
    let (command_tx, command_rx) = RingBuffer::new(COMMAND_QUEUE_CAPACITY);
    let (ended_tx, ended_rx) = RingBuffer::new(ENDED_QUEUE_CAPACITY);
    let clock = Arc::new(AtomicU64::new(0));

    let control = ControlGraph {
        commands: Rc::new(RefCell::new(command_tx)),
        ended: ended_rx,
        clock: clock.clone(),
        sample_rate,
        next_id: 0,
    };
    let renderer = Renderer {
        commands: command_rx,
        ended: ended_tx,
        clock,
        sample_rate,
        master_gain,
        frames: 0,
        voices: Vec::with_capacity(64),
        finished: Vec::with_capacity(16),
        pending_ended: Vec::with_capacity(16),
    };
    (control, renderer)
}

/// Control-thread side of the graph.
pub struct ControlGraph {
    commands: CommandLink,
    ended: Consumer<VoiceId>,
    clock: Arc<AtomicU64>,
    sample_rate: f32,
    next_id: VoiceId,
}

impl ControlGraph {
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

impl AudioGraph for ControlGraph {
    type Gain = RealtimeGain;
    type Generator = RealtimeGenerator;

    fn current_time(&self) -> f64 {
        self.clock.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    fn create_voice(
        &mut self,
        frequency: f32,
        waveform: Waveform,
        initial_gain: f32,
    ) -> (RealtimeGenerator, RealtimeGain) {
        let id = self.next_id;
        self.next_id += 1;

        send(
            &self.commands,
            GraphCommand::Create {
                id,
                frequency,
                waveform,
                initial_gain,
            },
        );

        let generator = RealtimeGenerator {
            id,
            frequency,
            waveform,
            stop_time: None,
            link: self.commands.clone(),
        };
        let gain = RealtimeGain {
            id,
            param: AudioParam::new(initial_gain),
            link: self.commands.clone(),
        };
        (generator, gain)
    }

    fn poll_ended(&mut self) -> Vec<VoiceId> {
        let mut ended = Vec::new();
        while let Ok(id) = self.ended.pop() {
            ended.push(id);
        }
        ended
    }
}

/// Control-thread handle to a voice's gain.
pub struct RealtimeGain {
    id: VoiceId,
    param: AudioParam,
    link: CommandLink,
}

impl RealtimeGain {
    /// The control-side copy of the timeline.
    pub fn param(&self) -> &AudioParam {
        &self.param
    }

    fn schedule(&mut self, event: ParamEvent) {
        self.param.schedule(event);
        send(&self.link, GraphCommand::Schedule { id: self.id, event });
    }
}

impl GainControl for RealtimeGain {
    fn value_at(&self, time: f64) -> f32 {
        self.param.value_at(time)
    }

    fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.schedule(ParamEvent::SetValue { value, time });
    }

    fn exponential_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) {
        self.schedule(ParamEvent::ExponentialRamp { value, end_time });
    }

    fn cancel_scheduled_values(&mut self, time: f64) {
        // Callers read the anchor value before cancelling, so history behind
        // `time` is no longer needed.
        self.param.prune_before(time);
        self.param.cancel_from(time);
        send(&self.link, GraphCommand::Cancel { id: self.id, time });
    }
}

/// Control-thread handle to a voice's oscillator.
pub struct RealtimeGenerator {
    id: VoiceId,
    frequency: f32,
    waveform: Waveform,
    stop_time: Option<f64>,
    link: CommandLink,
}

impl ToneGenerator for RealtimeGenerator {
    fn id(&self) -> VoiceId {
        self.id
    }

    fn frequency(&self) -> f32 {
        self.frequency
    }

    fn waveform(&self) -> Waveform {
        self.waveform
    }

    fn start(&mut self, time: f64) {
        send(&self.link, GraphCommand::Start { id: self.id, time });
    }

    fn stop(&mut self, time: f64) {
        if self.stop_time.is_some() {
            return;
        }
        self.stop_time = Some(time);
        send(&self.link, GraphCommand::Stop { id: self.id, time });
    }

    fn is_stopping(&self) -> bool {
        self.stop_time.is_some()
    }
}

struct RenderVoice {
    id: VoiceId,
    osc: Oscillator,
    gain: AudioParam,
    start: Option<f64>,
    stop: Option<f64>,
}

impl RenderVoice {
    #[inline]
    fn is_sounding(&self, time: f64) -> bool {
        self.start.is_some_and(|start| time >= start) && self.stop.map_or(true, |stop| time < stop)
    }
}

/// Audio-thread side of the graph. Call [`Renderer::render_block`] from the
/// audio callback.
pub struct Renderer {
    commands: Consumer<GraphCommand>,
    ended: Producer<VoiceId>,
    clock: Arc<AtomicU64>,
    sample_rate: f32,
    master_gain: f32,
    frames: u64,
    voices: Vec<RenderVoice>,
    /// Scratch: (stop time, id) of voices finishing this block.
    finished: Vec<(f64, VoiceId)>,
    /// Completions that did not fit in the ended queue yet.
    pending_ended: Vec<VoiceId>,
}

impl Renderer {
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Number of generators that exist on the audio side.
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Audio clock position in seconds.
    pub fn current_time(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    /// Render the output bus into `out` and advance the clock by `out.len()`.
    pub fn render_block(&mut self, out: &mut [f32]) {
        self.apply_commands();

        let block_start = self.current_time();
        let sample_period = 1.0 / self.sample_rate as f64;
        out.fill(0.0);

        for voice in &mut self.voices {
            voice.gain.prune_before(block_start);
            for (i, sample) in out.iter_mut().enumerate() {
                let time = block_start + i as f64 * sample_period;
                if voice.is_sounding(time) {
                    *sample += voice.osc.next_sample(self.sample_rate) * voice.gain.value_at(time);
                }
            }
        }

        for sample in out.iter_mut() {
            *sample *= self.master_gain;
        }

        self.frames += out.len() as u64;
        let block_end = self.current_time();
        self.collect_finished(block_end);
        self.clock.store(self.frames, Ordering::Release);
    }

    fn apply_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            match command {
                GraphCommand::Create {
                    id,
                    frequency,
                    waveform,
                    initial_gain,
                } => self.voices.push(RenderVoice {
                    id,
                    osc: Oscillator::new(waveform, frequency),
                    gain: AudioParam::new(initial_gain),
                    start: None,
                    stop: None,
                }),
                GraphCommand::Start { id, time } => {
                    if let Some(voice) = self.voice_mut(id) {
                        voice.start.get_or_insert(time);
                    }
                }
                GraphCommand::Stop { id, time } => {
                    if let Some(voice) = self.voice_mut(id) {
                        voice.stop.get_or_insert(time);
                    }
                }
                GraphCommand::Schedule { id, event } => {
                    if let Some(voice) = self.voice_mut(id) {
                        voice.gain.schedule(event);
                    }
                }
                GraphCommand::Cancel { id, time } => {
                    if let Some(voice) = self.voice_mut(id) {
                        voice.gain.cancel_from(time);
                    }
                }
            }
        }
    }

    /// Commands for generators that already stopped fall through as no-ops.
    fn voice_mut(&mut self, id: VoiceId) -> Option<&mut RenderVoice> {
        self.voices.iter_mut().find(|v| v.id == id)
    }

    fn collect_finished(&mut self, block_end: f64) {
        self.finished.clear();
        self.voices.retain(|voice| match voice.stop {
            Some(stop) if stop <= block_end => {
                self.finished.push((stop, voice.id));
                false
            }
            _ => true,
        });
        self.finished.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.pending_ended
            .extend(self.finished.iter().map(|&(_, id)| id));

        let mut sent = 0;
        for &id in &self.pending_ended {
            if self.ended.push(id).is_err() {
                break;
            }
            sent += 1;
        }
        self.pending_ended.drain(..sent);
    }
}
