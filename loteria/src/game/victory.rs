//! Win pattern detection.
//!
//! Pure functions evaluating boards against the ten fixed patterns of a 4x4
//! grid:
//! - Victory checks for one or all players
//! - Progress towards the closest pattern
//! - Mark validation
//! - Deterministic resolution of simultaneous winners

use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

use super::entities::{
    BOARD_SIDE, Card, CardId, MIN_CALLS_TO_WIN, PatternKind, Player, WinPattern,
};

/// The ten winning lines, in checking order.
pub const WIN_PATTERNS: [WinPattern; 10] = [
    WinPattern {
        kind: PatternKind::Row,
        positions: [0, 1, 2, 3],
        name: "Primera fila",
    },
    WinPattern {
        kind: PatternKind::Row,
        positions: [4, 5, 6, 7],
        name: "Segunda fila",
    },
    WinPattern {
        kind: PatternKind::Row,
        positions: [8, 9, 10, 11],
        name: "Tercera fila",
    },
    WinPattern {
        kind: PatternKind::Row,
        positions: [12, 13, 14, 15],
        name: "Cuarta fila",
    },
    WinPattern {
        kind: PatternKind::Column,
        positions: [0, 4, 8, 12],
        name: "Primera columna",
    },
    WinPattern {
        kind: PatternKind::Column,
        positions: [1, 5, 9, 13],
        name: "Segunda columna",
    },
    WinPattern {
        kind: PatternKind::Column,
        positions: [2, 6, 10, 14],
        name: "Tercera columna",
    },
    WinPattern {
        kind: PatternKind::Column,
        positions: [3, 7, 11, 15],
        name: "Cuarta columna",
    },
    WinPattern {
        kind: PatternKind::Diagonal,
        positions: [0, 5, 10, 15],
        name: "Diagonal principal",
    },
    WinPattern {
        kind: PatternKind::Diagonal,
        positions: [3, 6, 9, 12],
        name: "Diagonal secundaria",
    },
];

/// Players progressing at or above this percentage count as near victory.
pub const NEAR_VICTORY_PERCENT: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VictoryError {
    #[error("no winners to resolve")]
    NoWinners,
}

/// A player together with the pattern they completed.
#[derive(Debug, Clone, Copy)]
pub struct Winner<'a> {
    pub player: &'a Player,
    pub pattern: &'static WinPattern,
}

#[derive(Debug, Clone)]
pub struct WinnerResolution<'a> {
    pub primary: Winner<'a>,
    pub others: Vec<Winner<'a>>,
    pub all: Vec<Winner<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VictoryProgress {
    pub best_pattern: Option<&'static WinPattern>,
    pub progress_percent: f64,
    pub completed_positions: usize,
    pub total_positions: usize,
}

fn called_ids(called: &[Card]) -> HashSet<CardId> {
    called.iter().map(|card| card.id).collect()
}

/// Whether the card at `position` is both marked and called.
fn is_completed(player: &Player, position: usize, called: &HashSet<CardId>) -> bool {
    player
        .board
        .get(position)
        .is_some_and(|card| player.is_marked(card.id) && called.contains(&card.id))
}

/// First pattern, in declaration order, completed by `player`.
///
/// # Arguments
///
/// * `player` - Player whose board is checked
/// * `called` - Cards called so far this round
///
/// # Returns
///
/// * `Option<&'static WinPattern>` - The completed pattern, if any
pub fn check_victory(player: &Player, called: &[Card]) -> Option<&'static WinPattern> {
    if !player.has_valid_board() {
        log::warn!(
            "Player {} has an invalid board of {} cards",
            player.id,
            player.board.len()
        );
        return None;
    }

    if player.marked.len() < MIN_CALLS_TO_WIN {
        return None;
    }

    let called = called_ids(called);
    for pattern in &WIN_PATTERNS {
        let mut complete = true;
        for &position in &pattern.positions {
            let Some(card) = player.board.get(position) else {
                complete = false;
                break;
            };
            if !player.is_marked(card.id) {
                complete = false;
                break;
            }
            if !called.contains(&card.id) {
                log::warn!(
                    "Player {} has {} marked but it was never called",
                    player.id,
                    card.name
                );
                complete = false;
                break;
            }
        }

        if complete {
            log::info!("Player {} completed {}", player.id, pattern.name);
            return Some(pattern);
        }
    }

    None
}

/// Victory check for every player, in input order.
pub fn check_all<'a>(players: &'a [Player], called: &[Card]) -> Vec<Winner<'a>> {
    players
        .iter()
        .filter_map(|player| {
            check_victory(player, called).map(|pattern| Winner { player, pattern })
        })
        .collect()
}

/// Progress of `player` towards their closest pattern.
///
/// Only cards both marked and called count. Ties go to the pattern declared
/// first.
pub fn progress(player: &Player, called: &[Card]) -> VictoryProgress {
    let called = called_ids(called);
    let mut best: Option<&'static WinPattern> = None;
    let mut best_completed = 0;

    for pattern in &WIN_PATTERNS {
        let completed = pattern
            .positions
            .iter()
            .filter(|&&position| is_completed(player, position, &called))
            .count();
        if completed > best_completed {
            best = Some(pattern);
            best_completed = completed;
        }
    }

    VictoryProgress {
        best_pattern: best,
        progress_percent: best_completed as f64 / BOARD_SIDE as f64 * 100.0,
        completed_positions: best_completed,
        total_positions: BOARD_SIDE,
    }
}

/// Whether `player` may mark `card_id` while `current` is the called card.
pub fn validate_mark(player: &Player, card_id: CardId, current: Option<&Card>) -> bool {
    let Some(current) = current else {
        return false;
    };

    current.id == card_id && player.has_card(card_id) && !player.is_marked(card_id)
}

/// Pick the primary winner among simultaneous winners.
///
/// The first bot winner in input order takes precedence; with no bot among
/// the winners the first winner does. The remaining winners are listed bots
/// first, then humans.
pub fn resolve_simultaneous_winners<'a>(
    winners: &[Winner<'a>],
) -> Result<WinnerResolution<'a>, VictoryError> {
    if winners.is_empty() {
        return Err(VictoryError::NoWinners);
    }

    let primary_index = winners
        .iter()
        .position(|winner| winner.player.is_bot())
        .unwrap_or(0);

    let primary = winners[primary_index];
    let (mut others, humans): (Vec<Winner<'a>>, Vec<Winner<'a>>) = winners
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != primary_index)
        .map(|(_, winner)| *winner)
        .partition(|winner| winner.player.is_bot());
    others.extend(humans);

    if !others.is_empty() {
        log::info!(
            "{} simultaneous winners, {} takes the round",
            winners.len(),
            primary.player.id
        );
    }

    Ok(WinnerResolution {
        primary,
        others,
        all: winners.to_vec(),
    })
}

/// Distinct unmarked cards lying on any pattern, in board order.
pub fn required_cards(player: &Player) -> Vec<&Card> {
    let positions: BTreeSet<usize> = WIN_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.positions)
        .collect();

    positions
        .into_iter()
        .filter_map(|position| player.board.get(position))
        .filter(|card| !player.is_marked(card.id))
        .collect()
}

/// Players at or above 75% of their best pattern, closest first.
pub fn players_near_victory<'a>(
    players: &'a [Player],
    called: &[Card],
) -> Vec<(&'a Player, VictoryProgress)> {
    let mut near: Vec<_> = players
        .iter()
        .map(|player| (player, progress(player, called)))
        .filter(|(_, progress)| progress.progress_percent >= NEAR_VICTORY_PERCENT)
        .collect();

    near.sort_by(|a, b| b.1.progress_percent.total_cmp(&a.1.progress_percent));
    near
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        BotProfile, CelebrationStyle, Difficulty, Personality, PlayerId, catalog::Catalog,
    };

    fn board() -> Vec<Card> {
        Catalog::standard().cards()[..16].to_vec()
    }

    fn human() -> Player {
        Player::human(PlayerId::human(), "Ana", board())
    }

    fn bot(n: usize) -> Player {
        let profile = BotProfile::new(
            Difficulty::Medium,
            (1000, 2000),
            0.1,
            Personality {
                name: "Test".to_string(),
                reaction_speed: 1.0,
                error_probability: 0.0,
                celebration_style: CelebrationStyle::Subtle,
            },
        )
        .unwrap();
        Player::bot(PlayerId::bot(n), "Bot", board(), profile)
    }

    fn mark_positions(player: &mut Player, positions: &[usize]) -> Vec<Card> {
        let cards: Vec<Card> = positions.iter().map(|&p| player.board[p].clone()).collect();
        for card in &cards {
            player.marked.insert(card.id);
        }
        cards
    }

    #[test]
    fn test_three_marks_never_win() {
        let mut player = human();
        let called = mark_positions(&mut player, &[0, 1, 2]);
        assert!(check_victory(&player, &called).is_none());
    }

    #[test]
    fn test_fourth_mark_completes_row() {
        let mut player = human();
        let called = mark_positions(&mut player, &[0, 1, 2, 3]);
        let pattern = check_victory(&player, &called).expect("Row should win");
        assert_eq!(pattern.kind, PatternKind::Row);
        assert_eq!(pattern.positions, [0, 1, 2, 3]);
    }

    #[test]
    fn test_uncalled_marks_do_not_win() {
        let mut player = human();
        let called = mark_positions(&mut player, &[0, 1, 2, 3]);
        assert!(check_victory(&player, &called[..3]).is_none());
    }

    #[test]
    fn test_declaration_order_wins() {
        let mut player = human();
        // Position 0 sits on row 1, column 1 and the main diagonal.
        let called = mark_positions(&mut player, &[0, 1, 2, 3, 4, 8, 12]);
        assert_eq!(check_victory(&player, &called).unwrap().name, "Primera fila");
    }

    #[test]
    fn test_diagonals() {
        let mut player = human();
        let called = mark_positions(&mut player, &[3, 6, 9, 12]);
        assert_eq!(
            check_victory(&player, &called).unwrap().name,
            "Diagonal secundaria"
        );
    }

    #[test]
    fn test_every_line_wins_on_its_own() {
        for expected in &WIN_PATTERNS {
            let mut player = human();
            let called = mark_positions(&mut player, &expected.positions);
            assert_eq!(check_victory(&player, &called), Some(expected));
        }

        let count = |kind| {
            WIN_PATTERNS
                .iter()
                .filter(|pattern| pattern.kind == kind)
                .count()
        };
        assert_eq!(count(PatternKind::Row), 4);
        assert_eq!(count(PatternKind::Column), 4);
        assert_eq!(count(PatternKind::Diagonal), 2);
    }

    #[test]
    fn test_short_board_is_invalid() {
        let mut player = human();
        let called = mark_positions(&mut player, &[0, 1, 2, 3]);
        player.board.truncate(15);
        assert!(check_victory(&player, &called).is_none());
    }

    #[test]
    fn test_validate_mark() {
        let mut player = human();
        let card = player.board[5].clone();
        let other = Catalog::standard().get(25).unwrap().clone();

        assert!(!validate_mark(&player, card.id, None));
        assert!(!validate_mark(&player, card.id, Some(&other)));
        assert!(!validate_mark(&player, other.id, Some(&other)), "Card not on board");
        assert!(validate_mark(&player, card.id, Some(&card)));

        player.marked.insert(card.id);
        assert!(!validate_mark(&player, card.id, Some(&card)), "Already marked");
    }

    #[test]
    fn test_progress_ties_break_by_declaration() {
        let mut player = human();
        let called = mark_positions(&mut player, &[0, 1]);
        let progress = progress(&player, &called);
        assert_eq!(progress.best_pattern.unwrap().name, "Primera fila");
        assert_eq!(progress.completed_positions, 2);
        assert_eq!(progress.progress_percent, 50.0);
    }

    #[test]
    fn test_progress_empty() {
        let player = human();
        let progress = progress(&player, &[]);
        assert!(progress.best_pattern.is_none());
        assert_eq!(progress.progress_percent, 0.0);
        assert_eq!(progress.total_positions, 4);
    }

    #[test]
    fn test_bot_wins_simultaneous_tie() {
        let mut human = human();
        let mut bot = bot(1);
        let called = mark_positions(&mut human, &[0, 1, 2, 3]);
        mark_positions(&mut bot, &[0, 1, 2, 3]);
        let players = vec![human, bot];

        let winners = check_all(&players, &called);
        assert_eq!(winners.len(), 2);

        let resolution = resolve_simultaneous_winners(&winners).unwrap();
        assert_eq!(resolution.primary.player.id, PlayerId::bot(1));
        assert_eq!(resolution.others.len(), 1);
        assert_eq!(resolution.others[0].player.id, PlayerId::human());
        assert_eq!(resolution.all.len(), 2);
    }

    #[test]
    fn test_first_bot_is_primary() {
        let mut first = bot(1);
        let mut second = bot(2);
        let called = mark_positions(&mut first, &[4, 5, 6, 7]);
        mark_positions(&mut second, &[4, 5, 6, 7]);
        let players = vec![human(), second, first];

        let winners = check_all(&players, &called);
        let resolution = resolve_simultaneous_winners(&winners).unwrap();
        assert_eq!(resolution.primary.player.id, PlayerId::bot(2));
    }

    #[test]
    fn test_human_only_winner() {
        let mut human = human();
        let called = mark_positions(&mut human, &[0, 4, 8, 12]);
        let players = vec![human, bot(1)];

        let winners = check_all(&players, &called);
        let resolution = resolve_simultaneous_winners(&winners).unwrap();
        assert_eq!(resolution.primary.player.id, PlayerId::human());
        assert!(resolution.others.is_empty());
    }

    #[test]
    fn test_resolving_nothing_fails() {
        assert_eq!(
            resolve_simultaneous_winners(&[]).unwrap_err(),
            VictoryError::NoWinners
        );
    }

    #[test]
    fn test_required_cards() {
        let mut player = human();
        assert_eq!(required_cards(&player).len(), 16);
        mark_positions(&mut player, &[0, 5]);
        let required = required_cards(&player);
        assert_eq!(required.len(), 14);
        assert!(required.iter().all(|card| !player.is_marked(card.id)));
    }

    #[test]
    fn test_players_near_victory_sorted() {
        let mut close = bot(1);
        let mut done = bot(2);
        let mut far = human();
        let called = mark_positions(&mut done, &[0, 1, 2, 3]);
        mark_positions(&mut close, &[0, 1, 2]);
        mark_positions(&mut far, &[0]);
        let players = vec![far, close, done];

        let near = players_near_victory(&players, &called);
        assert_eq!(near.len(), 2);
        assert_eq!(near[0].0.id, PlayerId::bot(2));
        assert_eq!(near[0].1.progress_percent, 100.0);
        assert_eq!(near[1].0.id, PlayerId::bot(1));
        assert_eq!(near[1].1.progress_percent, 75.0);
    }
}
