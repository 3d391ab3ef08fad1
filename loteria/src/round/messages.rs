//! Round actor message types.

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::{
    events::RoundEvent,
    state::{MarkOutcome, RoundSnapshot},
};
use crate::{
    bot::DifficultyAdjustment,
    cantor::{CantorPreset, CantorStats},
    game::{Card, CardId, PlayerId, RoundStatus},
    stats::UserStatistics,
};

/// Messages that can be sent to a RoundActor
#[derive(Debug)]
pub enum RoundMessage {
    /// Deal new boards and start a round
    StartGame {
        player_name: String,
        response: oneshot::Sender<Uuid>,
    },

    /// Start the Cantor of the current round
    StartCantor { response: oneshot::Sender<bool> },

    /// Call the next card by hand
    CallNextCard {
        response: oneshot::Sender<Option<Card>>,
    },

    /// Mark a card for a player
    MarkCard {
        player_id: PlayerId,
        card_id: CardId,
        response: oneshot::Sender<MarkOutcome>,
    },

    /// Pause or resume the round
    TogglePause {
        response: oneshot::Sender<RoundStatus>,
    },

    /// Discard the round
    Reset {
        response: oneshot::Sender<RoundResponse>,
    },

    /// Switch the Cantor to a named interval
    SetPreset {
        preset: CantorPreset,
        response: oneshot::Sender<RoundResponse>,
    },

    /// Get a plain data copy of the round
    GetSnapshot {
        response: oneshot::Sender<RoundSnapshot>,
    },

    GetCantorStats {
        response: oneshot::Sender<CantorStats>,
    },

    /// Move the bots towards the human's level
    AdaptDifficulty {
        stats: Box<UserStatistics>,
        response: oneshot::Sender<Vec<DifficultyAdjustment>>,
    },

    /// Subscribe to round events
    Subscribe {
        subscriber_id: u64,
        sender: mpsc::Sender<RoundEvent>,
    },

    /// Unsubscribe from round events
    Unsubscribe { subscriber_id: u64 },

    /// Stop the actor
    Close {
        response: oneshot::Sender<RoundResponse>,
    },
}

/// Response from round operations without a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundResponse {
    /// Operation succeeded
    Success,

    /// Operation failed
    Error(String),
}

impl RoundResponse {
    /// Check if response is success
    pub fn is_success(&self) -> bool {
        matches!(self, RoundResponse::Success)
    }

    /// Get error message if response is error
    pub fn error_message(&self) -> Option<String> {
        match self {
            RoundResponse::Error(msg) => Some(msg.clone()),
            RoundResponse::Success => None,
        }
    }
}
