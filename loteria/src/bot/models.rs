//! Bot player models and configuration.

use serde::{Deserialize, Serialize};

use crate::game::{BotProfile, CelebrationStyle, Difficulty, Personality};

/// Traditional names handed out to bots.
pub const BOT_NAMES: [&str; 16] = [
    "María Elena",
    "José Luis",
    "Carmen Rosa",
    "Francisco Javier",
    "Ana Sofía",
    "Miguel Ángel",
    "Rosa María",
    "Carlos Alberto",
    "Guadalupe",
    "Antonio",
    "Esperanza",
    "Roberto",
    "Dolores",
    "Manuel",
    "Concepción",
    "Alejandro",
];

/// (name, reaction speed multiplier, error probability, celebration)
const PERSONALITIES: [(&str, f64, f64, CelebrationStyle); 6] = [
    ("Rápido", 0.8, 0.05, CelebrationStyle::Enthusiastic),
    ("Cauteloso", 1.5, 0.02, CelebrationStyle::Subtle),
    ("Distraído", 2.0, 0.15, CelebrationStyle::Animated),
    ("Competitivo", 0.6, 0.08, CelebrationStyle::Enthusiastic),
    ("Relajado", 2.5, 0.12, CelebrationStyle::Subtle),
    ("Nervioso", 1.2, 0.20, CelebrationStyle::Animated),
];

/// Combined error probability never exceeds this.
pub const MAX_ERROR_PROBABILITY: f64 = 0.3;

/// Share of erroneous reactions that simply miss the card.
pub const MISS_SHARE: f64 = 0.7;

/// Number of personality presets.
pub fn personality_count() -> usize {
    PERSONALITIES.len()
}

/// Personality preset `index`, wrapping around the six presets.
pub fn personality(index: usize) -> Personality {
    let (name, reaction_speed, error_probability, celebration_style) =
        PERSONALITIES[index % PERSONALITIES.len()];
    Personality {
        name: name.to_string(),
        reaction_speed,
        error_probability,
        celebration_style,
    }
}

/// Bot difficulty parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyParams {
    /// Inclusive reaction window in milliseconds
    pub reaction_time_range: (u64, u64),

    /// Chance that a reaction goes wrong
    pub error_rate: f64,

    /// Scale applied when difficulty adapts to the player
    pub adaptive_speed_multiplier: f64,
}

impl DifficultyParams {
    /// Slow and sloppy, leaves room for the player
    pub fn easy() -> Self {
        Self {
            reaction_time_range: (3000, 6000),
            error_rate: 0.25,
            adaptive_speed_multiplier: 1.2,
        }
    }

    pub fn medium() -> Self {
        Self {
            reaction_time_range: (2000, 4500),
            error_rate: 0.15,
            adaptive_speed_multiplier: 1.0,
        }
    }

    /// Quick and accurate
    pub fn hard() -> Self {
        Self {
            reaction_time_range: (1000, 3000),
            error_rate: 0.08,
            adaptive_speed_multiplier: 0.8,
        }
    }

    /// Get parameters for a given difficulty
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self::easy(),
            Difficulty::Medium => Self::medium(),
            Difficulty::Hard => Self::hard(),
        }
    }

    /// Profile of a bot with these parameters and `personality`.
    pub fn profile(&self, difficulty: Difficulty, personality: Personality) -> BotProfile {
        BotProfile {
            difficulty,
            reaction_time_range: self.reaction_time_range,
            error_rate: self.error_rate,
            personality,
        }
    }
}

/// Bot reaction statistics tracker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotStats {
    /// Reactions scheduled to called cards
    pub reactions: u32,

    /// Reactions that ended in a mark attempt
    pub marks: u32,

    /// Reactions that missed the card
    pub misses: u32,

    /// Reactions that reached for the wrong card
    pub wrong_cards: u32,

    /// Reactions cancelled or invalidated before firing
    pub stale: u32,
}

impl BotStats {
    /// Share of fired reactions that went wrong
    pub fn error_rate(&self) -> f64 {
        let fired = self.marks + self.misses + self.wrong_cards;
        if fired == 0 {
            0.0
        } else {
            (self.misses + self.wrong_cards) as f64 / fired as f64
        }
    }
}
