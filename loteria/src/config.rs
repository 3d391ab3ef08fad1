//! Round configuration models.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cantor::CantorConfig,
    game::{Difficulty, MAX_PLAYERS},
};

/// Configuration errors. These indicate a programming or setup mistake and
/// are reported before a round is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown cantor preset: {0}")]
    UnknownPreset(String),

    #[error("unknown bot difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("call interval of {interval_ms} ms is below the {min_ms} ms minimum")]
    DegenerateInterval { interval_ms: u64, min_ms: u64 },

    #[error("{requested} bots requested but a round seats at most {max}")]
    TooManyBots { requested: usize, max: usize },

    #[error("catalog holds {available} cards but a board needs {required}")]
    CatalogTooSmall { available: usize, required: usize },

    #[error("invalid bot profile: {0}")]
    InvalidBotProfile(String),
}

/// Round configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Display name of the human player
    pub player_name: String,

    /// Number of bot opponents (at most 3)
    pub bot_count: usize,

    /// Base difficulty handed to the bot roster
    pub bot_difficulty: Difficulty,

    /// Card calling cadence
    pub cantor: CantorConfig,

    /// Whether `start_new_game` also starts the Cantor
    pub auto_start_cantor: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_name: "Jugador".to_string(),
            bot_count: 2,
            bot_difficulty: Difficulty::Easy,
            cantor: CantorConfig::default(),
            auto_start_cantor: true,
        }
    }
}

impl GameConfig {
    /// Maximum number of bots that fit next to the human player.
    pub const MAX_BOTS: usize = MAX_PLAYERS - 1;

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_count > Self::MAX_BOTS {
            return Err(ConfigError::TooManyBots {
                requested: self.bot_count,
                max: Self::MAX_BOTS,
            });
        }

        self.cantor.validate()
    }
}
