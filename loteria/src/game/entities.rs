//! Core round entities: cards, players, bot profiles and win patterns.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};

use crate::config::ConfigError;

/// Number of cards on every board (a 4x4 grid).
pub const BOARD_SIZE: usize = 16;

/// Side length of the board grid.
pub const BOARD_SIDE: usize = 4;

/// Maximum number of players in a round, human included.
pub const MAX_PLAYERS: usize = 4;

/// A round cannot be won with fewer called cards than this.
pub const MIN_CALLS_TO_WIN: usize = 4;

/// Id of the single human player of a round.
pub const HUMAN_PLAYER_ID: &str = "human_player";

/// Card identifier, 1..N within a catalog.
pub type CardId = u32;

/// An immutable catalog card. Identity is by `id`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    /// The traditional verse the caller recites with the card.
    pub phrase: String,
    pub cultural_note: Option<String>,
}

impl Card {
    pub fn new(id: CardId, name: &str, phrase: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            phrase: phrase.to_string(),
            cultural_note: None,
        }
    }

    #[must_use]
    pub fn with_note(mut self, note: &str) -> Self {
        self.cultural_note = Some(note.to_string());
        self
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(s: &str) -> Self {
        Self(s.trim().to_string())
    }

    pub fn human() -> Self {
        Self::new(HUMAN_PLAYER_ID)
    }

    /// Id of the n-th bot of a round, counting from 1.
    pub fn bot(n: usize) -> Self {
        Self(format!("bot_{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

/// Bot difficulty presets
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(ConfigError::UnknownDifficulty(other.to_string())),
        }
    }
}

/// How a bot shows off after marking a card
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CelebrationStyle {
    Subtle,
    Animated,
    Enthusiastic,
}

impl fmt::Display for CelebrationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CelebrationStyle::Subtle => write!(f, "subtle"),
            CelebrationStyle::Animated => write!(f, "animated"),
            CelebrationStyle::Enthusiastic => write!(f, "enthusiastic"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Personality {
    pub name: String,
    /// Multiplier applied to the bot's reaction time (lower is faster)
    pub reaction_speed: f64,
    /// Added on top of the difficulty's error rate
    pub error_probability: f64,
    pub celebration_style: CelebrationStyle,
}

/// Timing and accuracy parameters of a bot player
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BotProfile {
    pub difficulty: Difficulty,
    /// Inclusive reaction window in milliseconds
    pub reaction_time_range: (u64, u64),
    /// Probability in [0, 1] that a reaction goes wrong
    pub error_rate: f64,
    pub personality: Personality,
}

impl BotProfile {
    /// Build a custom profile, rejecting inverted windows and rates outside [0, 1].
    pub fn new(
        difficulty: Difficulty,
        reaction_time_range: (u64, u64),
        error_rate: f64,
        personality: Personality,
    ) -> Result<Self, ConfigError> {
        if reaction_time_range.0 > reaction_time_range.1 {
            return Err(ConfigError::InvalidBotProfile(format!(
                "reaction window {}..{} ms is inverted",
                reaction_time_range.0, reaction_time_range.1
            )));
        }
        if !(0.0..=1.0).contains(&error_rate) || !(0.0..=1.0).contains(&personality.error_probability)
        {
            return Err(ConfigError::InvalidBotProfile(
                "error probabilities must be within [0, 1]".to_string(),
            ));
        }
        if personality.reaction_speed <= 0.0 {
            return Err(ConfigError::InvalidBotProfile(
                "reaction speed multiplier must be positive".to_string(),
            ));
        }

        Ok(Self {
            difficulty,
            reaction_time_range,
            error_rate,
            personality,
        })
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlayerKind {
    Human,
    Bot(BotProfile),
}

/// A seat in the round: a board and the cards marked on it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub kind: PlayerKind,
    /// Positions 0..15, row-major on the 4x4 grid.
    pub board: Vec<Card>,
    pub marked: BTreeSet<CardId>,
    pub is_winner: bool,
}

impl Player {
    pub fn human(id: PlayerId, name: &str, board: Vec<Card>) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind: PlayerKind::Human,
            board,
            marked: BTreeSet::new(),
            is_winner: false,
        }
    }

    pub fn bot(id: PlayerId, name: &str, board: Vec<Card>, profile: BotProfile) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind: PlayerKind::Bot(profile),
            board,
            marked: BTreeSet::new(),
            is_winner: false,
        }
    }

    pub fn is_bot(&self) -> bool {
        matches!(self.kind, PlayerKind::Bot(_))
    }

    pub fn bot_profile(&self) -> Option<&BotProfile> {
        match &self.kind {
            PlayerKind::Bot(profile) => Some(profile),
            PlayerKind::Human => None,
        }
    }

    pub fn bot_profile_mut(&mut self) -> Option<&mut BotProfile> {
        match &mut self.kind {
            PlayerKind::Bot(profile) => Some(profile),
            PlayerKind::Human => None,
        }
    }

    pub fn has_card(&self, card_id: CardId) -> bool {
        self.board.iter().any(|card| card.id == card_id)
    }

    pub fn card(&self, card_id: CardId) -> Option<&Card> {
        self.board.iter().find(|card| card.id == card_id)
    }

    pub fn is_marked(&self, card_id: CardId) -> bool {
        self.marked.contains(&card_id)
    }

    /// A board is playable only with exactly 16 cards.
    pub fn has_valid_board(&self) -> bool {
        self.board.len() == BOARD_SIZE
    }

    pub fn clear_marks(&mut self) {
        self.marked.clear();
        self.is_winner = false;
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    #[default]
    Waiting,
    Playing,
    Finished,
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundStatus::Waiting => write!(f, "waiting"),
            RoundStatus::Playing => write!(f, "playing"),
            RoundStatus::Finished => write!(f, "finished"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Row,
    Column,
    Diagonal,
}

/// Four board positions that win the round once all are marked and called.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct WinPattern {
    pub kind: PatternKind,
    pub positions: [usize; BOARD_SIDE],
    pub name: &'static str,
}

impl fmt::Display for WinPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn personality() -> Personality {
        Personality {
            name: "Test".to_string(),
            reaction_speed: 1.0,
            error_probability: 0.0,
            celebration_style: CelebrationStyle::Subtle,
        }
    }

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(" easy ".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert!(matches!(
            "insane".parse::<Difficulty>(),
            Err(ConfigError::UnknownDifficulty(_))
        ));
    }

    #[test]
    fn test_bot_profile_rejects_inverted_window() {
        let err = BotProfile::new(Difficulty::Easy, (5000, 1000), 0.1, personality()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBotProfile(_)));
    }

    #[test]
    fn test_bot_profile_rejects_bad_error_rate() {
        assert!(BotProfile::new(Difficulty::Easy, (1000, 2000), 1.5, personality()).is_err());
        assert!(BotProfile::new(Difficulty::Easy, (1000, 2000), 0.5, personality()).is_ok());
    }

    #[test]
    fn test_player_card_lookup() {
        let board = vec![Card::new(7, "El Árbol", "El que a todos cobija")];
        let mut player = Player::human(PlayerId::human(), "Ana", board);

        assert!(player.has_card(7));
        assert!(!player.has_card(8));
        assert!(!player.has_valid_board());

        player.marked.insert(7);
        player.is_winner = true;
        player.clear_marks();
        assert!(player.marked.is_empty());
        assert!(!player.is_winner);
    }

    #[test]
    fn test_player_id_normalizes() {
        assert_eq!(PlayerId::new("  bot_1 "), PlayerId::bot(1));
        assert_eq!(PlayerId::human().as_str(), HUMAN_PLAYER_ID);
    }
}
