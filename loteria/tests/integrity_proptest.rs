/// Property-based tests for boards, win detection and the integrity audit
///
/// These tests check the round invariants over randomly generated boards,
/// call logs, marks and interleavings of round operations.
use loteria::{
    GameConfig,
    cantor::CantorConfig,
    game::{BOARD_SIZE, Catalog, Player, PlayerId, RoundStatus, check_victory},
    round::{Round, RoundState, audit, verify},
};
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use std::{collections::HashSet, sync::Arc, time::Duration};

fn board(seed: u64) -> Vec<loteria::Card> {
    Catalog::standard().random_cards(BOARD_SIZE, &mut StdRng::seed_from_u64(seed))
}

// State with one human whose marks are taken from board positions
fn state_with_marks(seed: u64, positions: &[usize], calls: usize) -> RoundState {
    let catalog = Catalog::standard();
    let mut human = Player::human(PlayerId::human(), "Ana", board(seed));
    for &position in positions {
        human.marked.insert(human.board[position].id);
    }

    RoundState {
        status: RoundStatus::Playing,
        players: vec![human],
        called_cards: catalog.cards()[..calls].to_vec(),
        ..RoundState::default()
    }
}

#[derive(Debug, Clone)]
enum Op {
    Call,
    MarkCurrent,
    MarkAny(usize),
    Advance(u64),
    TogglePause,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Call),
        3 => Just(Op::MarkCurrent),
        1 => (0..BOARD_SIZE).prop_map(Op::MarkAny),
        3 => (0u64..8000).prop_map(Op::Advance),
        1 => Just(Op::TogglePause),
    ]
}

fn assert_invariants(state: &RoundState) -> Result<(), TestCaseError> {
    let called: HashSet<_> = state.called_cards.iter().map(|card| card.id).collect();
    for player in &state.players {
        prop_assert!(player.marked.iter().all(|id| called.contains(id)));
    }
    if state.status == RoundStatus::Finished && state.winner.is_some() {
        prop_assert!(state.called_cards.len() >= 4);
    }
    Ok(())
}

proptest! {
    #[test]
    fn test_boards_are_sixteen_distinct_cards(seed in any::<u64>()) {
        let board = board(seed);
        prop_assert_eq!(board.len(), BOARD_SIZE);

        let ids: HashSet<_> = board.iter().map(|card| card.id).collect();
        prop_assert_eq!(ids.len(), BOARD_SIZE);
    }

    #[test]
    fn test_audit_removes_exactly_uncalled_marks(
        seed in any::<u64>(),
        positions in prop::collection::vec(0..BOARD_SIZE, 0..BOARD_SIZE),
        calls in 0usize..=25,
    ) {
        let mut state = state_with_marks(seed, &positions, calls);
        let before = state.players[0].marked.clone();

        let report = audit(&mut state);
        let called: HashSet<_> = state.called_cards.iter().map(|card| card.id).collect();
        let expected: Vec<_> = before.iter().filter(|id| !called.contains(*id)).copied().collect();

        prop_assert_eq!(report.removed_marks.len(), expected.len());
        prop_assert!(state.players[0].marked.iter().all(|id| called.contains(id)));

        let after_first = state.clone();
        prop_assert!(verify(&mut state), "A second audit finds nothing");
        prop_assert_eq!(state, after_first);
    }

    #[test]
    fn test_fewer_than_four_marks_never_win(
        seed in any::<u64>(),
        positions in prop::collection::hash_set(0..BOARD_SIZE, 0..4),
    ) {
        let positions: Vec<_> = positions.into_iter().collect();
        let state = state_with_marks(seed, &positions, 25);
        prop_assert!(check_victory(&state.players[0], &state.called_cards).is_none());
    }

    #[test]
    fn test_finished_with_few_calls_is_reopened(calls in 0usize..4) {
        let mut state = state_with_marks(1, &[], calls);
        state.status = RoundStatus::Finished;
        state.winner = Some(PlayerId::human());

        let report = audit(&mut state);
        prop_assert!(report.status_reverted);
        prop_assert_eq!(state.status, RoundStatus::Playing);
        prop_assert!(state.winner.is_none());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_any_interleaving_keeps_invariants(
        seed in any::<u64>(),
        ops in prop::collection::vec(op_strategy(), 1..80),
    ) {
        let config = GameConfig {
            bot_count: 3,
            cantor: CantorConfig {
                interval_ms: 2000,
                ..CantorConfig::default()
            },
            ..GameConfig::default()
        };
        let mut round = Round::with_seed(config, Arc::new(Catalog::standard()), seed).unwrap();
        round.start_new_game("Ana");
        let human = PlayerId::human();

        for op in ops {
            match op {
                Op::Call => {
                    round.call_next_card();
                }
                Op::MarkCurrent => {
                    if let Some(card) = round.state().current_card.clone() {
                        round.mark_card(&human, card.id);
                    }
                }
                Op::MarkAny(position) => {
                    let card_id = round.state().players[0].board[position].id;
                    round.mark_card(&human, card_id);
                }
                Op::Advance(ms) => round.advance(Duration::from_millis(ms)),
                Op::TogglePause => {
                    round.toggle_pause();
                }
            }
            assert_invariants(round.state())?;
        }

        let winners = round.state().players.iter().filter(|player| player.is_winner).count();
        prop_assert!(winners <= 1);
        prop_assert_eq!(winners == 1, round.state().winner.is_some());
    }
}
