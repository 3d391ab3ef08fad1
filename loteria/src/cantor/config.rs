//! Cantor configuration models.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};

use crate::config::ConfigError;

/// Card calls cannot come faster than this.
pub const MIN_INTERVAL_MS: u64 = 100;

/// Named call cadences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CantorPreset {
    Slow,
    Normal,
    Fast,
    Rapid,
}

impl CantorPreset {
    pub fn interval_ms(self) -> u64 {
        match self {
            CantorPreset::Slow => 8000,
            CantorPreset::Normal => 5000,
            CantorPreset::Fast => 3000,
            CantorPreset::Rapid => 1500,
        }
    }
}

impl fmt::Display for CantorPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CantorPreset::Slow => write!(f, "slow"),
            CantorPreset::Normal => write!(f, "normal"),
            CantorPreset::Fast => write!(f, "fast"),
            CantorPreset::Rapid => write!(f, "rapid"),
        }
    }
}

impl FromStr for CantorPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow" => Ok(CantorPreset::Slow),
            "normal" => Ok(CantorPreset::Normal),
            "fast" => Ok(CantorPreset::Fast),
            "rapid" => Ok(CantorPreset::Rapid),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }
}

/// Cantor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CantorConfig {
    /// Milliseconds between two automatic calls
    pub interval_ms: u64,

    /// Shuffle the deck on reset and on refill
    pub shuffle: bool,

    /// Refill the deck from the called cards once it runs out
    pub repeat_on_exhaustion: bool,
}

impl Default for CantorConfig {
    fn default() -> Self {
        Self::from(CantorPreset::Normal)
    }
}

impl From<CantorPreset> for CantorConfig {
    fn from(preset: CantorPreset) -> Self {
        Self {
            interval_ms: preset.interval_ms(),
            shuffle: true,
            repeat_on_exhaustion: false,
        }
    }
}

impl CantorConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms < MIN_INTERVAL_MS {
            return Err(ConfigError::DegenerateInterval {
                interval_ms: self.interval_ms,
                min_ms: MIN_INTERVAL_MS,
            });
        }

        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Copy of this configuration with `update` applied on top.
    #[must_use]
    pub fn merged(&self, update: CantorConfigUpdate) -> Self {
        Self {
            interval_ms: update.interval_ms.unwrap_or(self.interval_ms),
            shuffle: update.shuffle.unwrap_or(self.shuffle),
            repeat_on_exhaustion: update
                .repeat_on_exhaustion
                .unwrap_or(self.repeat_on_exhaustion),
        }
    }
}

/// Partial Cantor configuration. `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CantorConfigUpdate {
    pub interval_ms: Option<u64>,
    pub shuffle: Option<bool>,
    pub repeat_on_exhaustion: Option<bool>,
}

impl From<CantorPreset> for CantorConfigUpdate {
    fn from(preset: CantorPreset) -> Self {
        let config = CantorConfig::from(preset);
        Self {
            interval_ms: Some(config.interval_ms),
            shuffle: Some(config.shuffle),
            repeat_on_exhaustion: Some(config.repeat_on_exhaustion),
        }
    }
}
