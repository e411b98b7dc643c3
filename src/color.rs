/*
Frequency to Color
==================

Pitch is circular in octaves: A3 (220 Hz) and A4 (440 Hz) sound like "the
same note". Hue is circular too. Mapping one octave onto the full color wheel
gives every pitch class a stable color:

    hue = log2(f / 220) * 360      (wrapped into 0..360)

  220 Hz  → 0°    (A, red)
  311 Hz  → 180°  (D#, cyan; half an octave up)
  440 Hz  → 0°    (A again, one octave up)

A chord is colored by the mean frequency of its notes, rendered at full
saturation and 70% lightness.
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Frequency that maps to hue 0.
pub const BASE_FREQUENCY: f32 = 220.0;
/// Saturation of every rendered color, in percent.
pub const SATURATION: f32 = 100.0;
/// Lightness of every rendered color, in percent.
pub const LIGHTNESS: f32 = 70.0;

/// Hue/saturation/lightness color. Hue in degrees, the rest in percent.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Hsl {
    pub fn new(hue: f32, saturation: f32, lightness: f32) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    /// Convert to 8-bit RGB.
    pub fn to_rgb(self) -> (u8, u8, u8) {
        let s = (self.saturation / 100.0).clamp(0.0, 1.0);
        let l = (self.lightness / 100.0).clamp(0.0, 1.0);
        let h = self.hue.rem_euclid(360.0) / 60.0;

        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        let to_byte = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        (to_byte(r), to_byte(g), to_byte(b))
    }
}

/// Hue in `[0, 360)` for an average frequency. Wraps every octave.
#[inline]
pub fn hue_for(average_frequency: f32) -> f32 {
    let hue = ((average_frequency / BASE_FREQUENCY).log2() * 360.0) % 360.0;
    // `% 360.0` keeps the sign; fold negatives back, and squash the -0.0/360.0
    // edge cases rounding can produce.
    let hue = (hue + 360.0) % 360.0;
    if hue >= 360.0 {
        0.0
    } else {
        hue
    }
}

/// Background color for an average frequency.
pub fn color_for(average_frequency: f32) -> Hsl {
    Hsl::new(hue_for(average_frequency), SATURATION, LIGHTNESS)
}
