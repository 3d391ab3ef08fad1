//! Round state and the plain data views derived from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    cantor::CantorSnapshot,
    game::{Card, CardId, Player, PlayerId, RoundStatus, WinPattern},
};

/// The single mutable structure of a round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    /// `None` until a round is started
    pub game_id: Option<Uuid>,

    pub status: RoundStatus,

    /// Human first, then bots
    pub players: Vec<Player>,

    pub current_card: Option<Card>,

    /// Every card called this round, in order
    pub called_cards: Vec<Card>,

    pub winner: Option<PlayerId>,

    /// Name of the winner's pattern
    pub winning_pattern: Option<String>,

    pub start_time: Option<DateTime<Utc>>,

    pub end_time: Option<DateTime<Utc>>,

    /// Round length in seconds, stamped when the round ends
    pub duration_secs: Option<u64>,
}

impl RoundState {
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| &player.id == id)
    }

    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| &player.id == id)
    }

    pub fn human(&self) -> Option<&Player> {
        self.players.iter().find(|player| !player.is_bot())
    }

    pub fn bots(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|player| player.is_bot())
    }

    pub fn is_called(&self, card_id: CardId) -> bool {
        self.called_cards.iter().any(|card| card.id == card_id)
    }

    /// Summary handed to statistics, `None` before a round starts.
    pub fn summary(&self) -> Option<RoundSummary> {
        let game_id = self.game_id?;
        let winner = self.winner.as_ref().and_then(|id| self.player(id));

        Some(RoundSummary {
            game_id,
            status: self.status,
            winner: winner.map(|player| player.id.clone()),
            winner_name: winner.map(|player| player.name.clone()),
            winning_pattern: self.winning_pattern.clone(),
            human_won: self.human().is_some_and(|human| human.is_winner),
            player_count: self.players.len(),
            cards_called: self.called_cards.len(),
            start_time: self.start_time,
            end_time: self.end_time,
            duration_secs: self.duration_secs.unwrap_or(0),
        })
    }
}

/// A finished (or abandoned) round as reported to collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub game_id: Uuid,
    pub status: RoundStatus,
    pub winner: Option<PlayerId>,
    pub winner_name: Option<String>,
    pub winning_pattern: Option<String>,
    pub human_won: bool,
    pub player_count: usize,
    pub cards_called: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_secs: u64,
}

/// Result of a mark attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkOutcome {
    pub success: bool,
    /// Whether the marking player is among the winners
    pub has_won: bool,
    pub win_pattern: Option<WinPattern>,
}

impl MarkOutcome {
    pub fn rejected() -> Self {
        Self {
            success: false,
            has_won: false,
            win_pattern: None,
        }
    }

    pub fn accepted(win_pattern: Option<WinPattern>) -> Self {
        Self {
            success: true,
            has_won: win_pattern.is_some(),
            win_pattern,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerProgress {
    pub player_id: PlayerId,
    pub name: String,
    pub marked: usize,
    /// Share of the board marked
    pub progress_percent: f64,
}

impl From<&Player> for PlayerProgress {
    fn from(player: &Player) -> Self {
        let progress_percent = if player.board.is_empty() {
            0.0
        } else {
            player.marked.len() as f64 / player.board.len() as f64 * 100.0
        };

        Self {
            player_id: player.id.clone(),
            name: player.name.clone(),
            marked: player.marked.len(),
            progress_percent,
        }
    }
}

/// Live view of the round in progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStats {
    pub game_id: Uuid,
    pub status: RoundStatus,
    pub elapsed_secs: u64,
    pub cards_called: usize,
    pub players: Vec<PlayerProgress>,
}

/// Round and Cantor state for external save/load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub round: RoundState,
    pub cantor: CantorSnapshot,
}

impl RoundSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
