//! Round event stream.

use serde::Serialize;
use uuid::Uuid;

use crate::game::{Card, CardId, PlayerId};

/// Everything observable that happens in a round, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundEvent {
    GameStarted {
        game_id: Uuid,
        players: usize,
    },

    CardCalled {
        card: Card,
        /// 1-based position in the round's call log
        call_number: usize,
    },

    CardMarked {
        player_id: PlayerId,
        card_id: CardId,
    },

    BotMissed {
        bot_id: PlayerId,
        card_id: CardId,
    },

    /// A bot reached for a card that was not called. Nothing was marked.
    BotWrongCard {
        bot_id: PlayerId,
        card_id: CardId,
    },

    IntegrityRepaired {
        removed_marks: usize,
        status_reverted: bool,
    },

    PlayerWon {
        player_id: PlayerId,
        pattern: Option<String>,
    },

    GameEnded {
        game_id: Uuid,
        winner: Option<PlayerId>,
    },

    DeckRefilled,

    DeckExhausted,

    Paused,

    Resumed,

    Reset,
}
