//! The audio graph voices are built on.
//!
//! The note engine only sees the traits in [`node`]: a graph that creates
//! tone generators and gain controls schedulable in continuous time. The
//! [`realtime`] module implements them on top of [`param`] automation and
//! [`oscillator`] waveforms, split between the control and audio threads.

/// Traits the note engine schedules against.
pub mod node;
/// Tone generator waveforms.
pub mod oscillator;
/// Continuous-time automation timeline.
pub mod param;
/// Control-thread handle and audio-thread renderer joined by ring buffers.
pub mod realtime;

pub use node::{AudioGraph, GainControl, ToneGenerator, VoiceId};
pub use oscillator::Waveform;
