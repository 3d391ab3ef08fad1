//! Self-healing consistency checks over a round.
//!
//! Two invariants are enforced:
//! - every marked card has been called
//! - a finished round has seen at least four calls
//!
//! Violations are logged and repaired in place. The audit never fails.

use std::collections::HashSet;

use super::state::RoundState;
use crate::game::{CardId, MIN_CALLS_TO_WIN, PlayerId, RoundStatus};

/// What an audit had to repair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    /// Marks removed because their card was never called
    pub removed_marks: Vec<(PlayerId, CardId)>,

    /// The round was finished too early and reopened
    pub status_reverted: bool,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.removed_marks.is_empty() && !self.status_reverted
    }
}

/// Audit `state` and repair what is broken.
pub fn audit(state: &mut RoundState) -> AuditReport {
    let mut report = AuditReport::default();
    let called: HashSet<CardId> = state.called_cards.iter().map(|card| card.id).collect();

    for player in &mut state.players {
        let stray: Vec<CardId> = player
            .marked
            .iter()
            .filter(|card_id| !called.contains(card_id))
            .copied()
            .collect();

        for card_id in stray {
            log::error!(
                "Player {} had card {} marked without it being called, removing the mark",
                player.id,
                card_id
            );
            player.marked.remove(&card_id);
            report.removed_marks.push((player.id.clone(), card_id));
        }
    }

    if state.status == RoundStatus::Finished && state.called_cards.len() < MIN_CALLS_TO_WIN {
        log::error!(
            "Round finished after only {} calls, reopening it",
            state.called_cards.len()
        );
        state.status = RoundStatus::Playing;
        state.winner = None;
        state.winning_pattern = None;
        for player in &mut state.players {
            player.is_winner = false;
        }
        report.status_reverted = true;
    }

    report
}

/// Audit `state`, returning whether it was already consistent.
pub fn verify(state: &mut RoundState) -> bool {
    audit(state).is_clean()
}
