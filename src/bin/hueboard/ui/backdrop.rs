//! Backdrop color with a short linear fade between chords

use std::time::{Duration, Instant};

use hueboard::color::Hsl;

/// Time taken to fade from one chord color to the next.
pub const FADE_DURATION: Duration = Duration::from_millis(80);

type Rgb = (u8, u8, u8);

/// Tracks the painted backdrop as it moves toward the engine's color.
#[derive(Debug, Clone, Default)]
pub struct BackdropFade {
    target: Option<Hsl>,
    from: Option<Rgb>,
    started: Option<Instant>,
}

impl BackdropFade {
    /// Point the fade at `target`. A no-op if it is already the target.
    pub fn retarget(&mut self, target: Option<Hsl>, now: Instant) {
        if target == self.target {
            return;
        }
        self.from = self.color_at(now);
        self.target = target;
        self.started = Some(now);
    }

    /// Color to paint at `now`. `None` means the terminal default.
    ///
    /// Clearing the override snaps back to the default, since there is no
    /// color to blend toward.
    pub fn color_at(&self, now: Instant) -> Option<Rgb> {
        let to = self.target?.to_rgb();
        let (Some(from), Some(started)) = (self.from, self.started) else {
            return Some(to);
        };
        let t = (now.saturating_duration_since(started).as_secs_f32()
            / FADE_DURATION.as_secs_f32())
        .min(1.0);
        Some((lerp(from.0, to.0, t), lerp(from.1, to.1, t), lerp(from.2, to.2, t)))
    }
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}
