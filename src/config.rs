//! Engine settings.
//!
//! Defaults reproduce the stock instrument: 0.8 master level, 0.9 headroom,
//! 60 ms attack, 30 ms release, generator stop 40 ms after release. A TOML
//! file may override any subset:
//!
//! ```toml
//! waveform = "triangle"
//! release_ms = 80.0
//! stop_after_ms = 100.0
//! ```

use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::graph::oscillator::Waveform;
use crate::synth::balancer::HEADROOM;
use crate::synth::envelope::{VoiceEnvelope, ATTACK_TIME, RELEASE_TIME, SILENCE_FLOOR, STOP_AFTER};

/// Level of the shared output bus.
pub const MASTER_GAIN: f32 = 0.8;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Shared output bus level, set once.
    pub master_gain: f32,
    /// Total level shared by all voices.
    pub headroom: f32,
    /// Smallest gain an envelope ramps from or to.
    pub silence_floor: f32,
    pub attack_ms: f64,
    pub release_ms: f64,
    /// Delay from release to generator stop. Must exceed `release_ms`.
    pub stop_after_ms: f64,
    /// Waveform selected at startup.
    pub waveform: Waveform,
    /// Release a key after this long without a press or repeat, on terminals
    /// that never report key releases.
    pub hold_timeout_ms: u64,
    pub log_file: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            master_gain: MASTER_GAIN,
            headroom: HEADROOM,
            silence_floor: SILENCE_FLOOR,
            attack_ms: ATTACK_TIME * 1000.0,
            release_ms: RELEASE_TIME * 1000.0,
            stop_after_ms: STOP_AFTER * 1000.0,
            waveform: Waveform::Sine,
            hold_timeout_ms: 650,
            log_file: PathBuf::from("hueboard.log"),
        }
    }
}

impl EngineConfig {
    /// Read, parse and validate a TOML config file.
    #[cfg(feature = "serde")]
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::read_file(&path, e))?;
        Self::from_toml(&text)
    }

    #[cfg(feature = "serde")]
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.master_gain > 0.0 && self.master_gain <= 1.0) {
            return Err(ConfigError::invalid("master_gain", "must be in (0, 1]"));
        }
        if !(self.headroom > 0.0 && self.headroom <= 1.0) {
            return Err(ConfigError::invalid("headroom", "must be in (0, 1]"));
        }
        if !(self.silence_floor > 0.0 && self.silence_floor < self.headroom) {
            return Err(ConfigError::invalid(
                "silence_floor",
                "must be positive and below headroom",
            ));
        }
        for (field, value) in [
            ("attack_ms", self.attack_ms),
            ("release_ms", self.release_ms),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::invalid(field, "must be positive"));
            }
        }
        if !(self.stop_after_ms.is_finite() && self.stop_after_ms > self.release_ms) {
            return Err(ConfigError::invalid(
                "stop_after_ms",
                format!("must be longer than release_ms ({})", self.release_ms),
            ));
        }
        if self.hold_timeout_ms == 0 {
            return Err(ConfigError::invalid("hold_timeout_ms", "must be positive"));
        }
        Ok(())
    }

    pub fn envelope(&self) -> VoiceEnvelope {
        VoiceEnvelope {
            silence_floor: self.silence_floor,
            attack: self.attack_ms / 1000.0,
            release: self.release_ms / 1000.0,
            stop_after: self.stop_after_ms / 1000.0,
        }
    }
}
