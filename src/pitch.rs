use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Identifier of a physical input key.
///
/// Stable across the press and release of the same key. The default layout
/// uses legacy key codes: the uppercase ASCII code of the key's character, so
/// `Z` is `90` and `2` is `50`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(pub u32);

impl KeyId {
    /// Key code for a typed character. Letters are case-insensitive.
    pub fn from_char(c: char) -> Option<Self> {
        let upper = c.to_ascii_uppercase();
        if upper.is_ascii_uppercase() || upper.is_ascii_digit() {
            Some(KeyId(upper as u32))
        } else {
            None
        }
    }

    /// The character this key code stands for, if printable.
    pub fn as_char(self) -> Option<char> {
        char::from_u32(self.0).filter(|c| c.is_ascii_graphic())
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for KeyId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(KeyId)
    }
}

/// Two chromatic octaves from C4, on the bottom two letter rows.
///
/// (key code, frequency in Hz, note name)
pub const DEFAULT_LAYOUT: &[(u32, f32, &str)] = &[
    (90, 261.625_58, "C4"),  // Z
    (83, 277.182_62, "C#4"), // S
    (88, 293.664_76, "D4"),  // X
    (68, 311.126_98, "D#4"), // D
    (67, 329.627_56, "E4"),  // C
    (86, 349.228_23, "F4"),  // V
    (71, 369.994_42, "F#4"), // G
    (66, 391.995_43, "G4"),  // B
    (72, 415.304_7, "G#4"),  // H
    (78, 440.0, "A4"),       // N
    (74, 466.163_76, "A#4"), // J
    (77, 493.883_3, "B4"),   // M
    (81, 523.251_1, "C5"),   // Q
    (50, 554.365_26, "C#5"), // 2
    (87, 587.329_5, "D5"),   // W
    (51, 622.253_96, "D#5"), // 3
    (69, 659.255_1, "E5"),   // E
    (82, 698.456_46, "F5"),  // R
    (53, 739.988_85, "F#5"), // 5
    (84, 783.990_84, "G5"),  // T
    (54, 830.609_4, "G#5"),  // 6
    (89, 880.0, "A5"),       // Y
    (55, 932.327_5, "A#5"),  // 7
    (85, 987.766_6, "B5"),   // U
];

/// Immutable key → frequency mapping, built once at startup.
#[derive(Debug, Clone)]
pub struct PitchTable {
    frequencies: HashMap<KeyId, f32>,
    /// Keys in layout order, for display.
    order: Vec<KeyId>,
}

impl PitchTable {
    /// Build a table from `(key, frequency)` pairs.
    ///
    /// A key listed twice keeps its last frequency. Non-positive or non-finite
    /// frequencies are skipped.
    pub fn new(entries: impl IntoIterator<Item = (KeyId, f32)>) -> Self {
        let mut frequencies = HashMap::new();
        let mut order = Vec::new();
        for (key, freq) in entries {
            if !(freq.is_finite() && freq > 0.0) {
                continue;
            }
            if frequencies.insert(key, freq).is_none() {
                order.push(key);
            }
        }
        Self { frequencies, order }
    }

    /// Frequency for `key`, or `None` if it is not a musical key.
    pub fn frequency_for(&self, key: KeyId) -> Option<f32> {
        self.frequencies.get(&key).copied()
    }

    pub fn contains(&self, key: KeyId) -> bool {
        self.frequencies.contains_key(&key)
    }

    /// Keys in the order they were declared.
    pub fn keys(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for PitchTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_LAYOUT
                .iter()
                .map(|&(code, freq, _)| (KeyId(code), freq)),
        )
    }
}

/// Note name for a key in the default layout.
pub fn note_name(key: KeyId) -> Option<&'static str> {
    DEFAULT_LAYOUT
        .iter()
        .find(|(code, _, _)| *code == key.0)
        .map(|(_, _, name)| *name)
}
