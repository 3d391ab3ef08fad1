//! Round entities, the card catalog and win detection.

pub mod catalog;
pub mod entities;
pub mod victory;

pub use catalog::Catalog;
pub use entities::{
    BOARD_SIDE, BOARD_SIZE, BotProfile, Card, CardId, CelebrationStyle, Difficulty,
    HUMAN_PLAYER_ID, MAX_PLAYERS, MIN_CALLS_TO_WIN, PatternKind, Personality, Player, PlayerId,
    PlayerKind, RoundStatus, WinPattern,
};
pub use victory::{
    VictoryError, VictoryProgress, WIN_PATTERNS, Winner, WinnerResolution, check_all,
    check_victory, players_near_victory, progress, required_cards,
    resolve_simultaneous_winners, validate_mark,
};
