// Purpose: note lifecycle, from key press to silence
// This layer sits above the audio graph and decides what sounds and how loud

pub mod balancer;
pub mod dispatcher;
pub mod envelope;
pub mod registry;
pub mod voice;

pub use balancer::{Backdrop, Balance, ColorState, PolyphonyBalancer};
pub use dispatcher::{Dispatch, InputDispatcher, InputEvent};
pub use envelope::VoiceEnvelope;
pub use registry::{ReleaseOutcome, StartRejection, VoiceRegistry};
pub use voice::{EnvelopePhase, Voice};
