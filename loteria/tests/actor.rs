/// Integration tests for the round actor
///
/// These tests run the actor on a paused tokio clock, so timed calls happen
/// exactly when the clock is advanced.
use loteria::{
    GameConfig,
    cantor::{CantorConfig, CantorPreset},
    game::{Catalog, PlayerId, RoundStatus},
    round::{Round, RoundActor, RoundEvent, RoundHandle},
    stats::UserStatistics,
};
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;

fn spawn_round(bot_count: usize, auto_start_cantor: bool) -> (RoundHandle, JoinHandle<()>) {
    let config = GameConfig {
        bot_count,
        cantor: CantorConfig {
            interval_ms: 1000,
            shuffle: false,
            repeat_on_exhaustion: false,
        },
        auto_start_cantor,
        ..GameConfig::default()
    };
    let round = Round::with_seed(config, Arc::new(Catalog::standard()), 21).unwrap();
    let (actor, handle) = RoundActor::new(round);
    (handle, tokio::spawn(actor.run()))
}

#[tokio::test(start_paused = true)]
async fn test_calls_follow_the_clock() {
    let (handle, task) = spawn_round(0, true);
    let mut events = handle.subscribe(1, 64).await.unwrap();
    let game_id = handle.start_game("Ana").await.unwrap();

    match events.recv().await {
        Some(RoundEvent::GameStarted { game_id: id, players }) => {
            assert_eq!(id, game_id);
            assert_eq!(players, 1);
        }
        other => panic!("Expected GameStarted, got {:?}", other),
    }
    assert!(matches!(
        events.recv().await,
        Some(RoundEvent::CardCalled { call_number: 1, .. })
    ));

    tokio::time::sleep(Duration::from_millis(2500)).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.round.called_cards.len(), 3);

    assert!(matches!(
        events.recv().await,
        Some(RoundEvent::CardCalled { call_number: 2, .. })
    ));

    assert!(handle.close().await.unwrap().is_success());
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_pause_stops_the_clock() {
    let (handle, task) = spawn_round(0, true);
    handle.start_game("Ana").await.unwrap();

    assert_eq!(handle.toggle_pause().await.unwrap(), RoundStatus::Waiting);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(handle.cantor_stats().await.unwrap().called_count, 1);

    assert_eq!(handle.toggle_pause().await.unwrap(), RoundStatus::Playing);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(handle.cantor_stats().await.unwrap().called_count, 2);

    handle.close().await.unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_manual_calls_and_marks() {
    let (handle, task) = spawn_round(1, false);
    handle.start_game("Ana").await.unwrap();
    assert!(handle.call_next_card().await.unwrap().is_some());

    let snapshot = handle.snapshot().await.unwrap();
    let human = &snapshot.round.players[0];
    let current = snapshot.round.current_card.clone().unwrap();
    let outcome = handle
        .mark_card(PlayerId::human(), current.id)
        .await
        .unwrap();
    assert_eq!(outcome.success, human.has_card(current.id));

    assert!(handle.set_preset(CantorPreset::Fast).await.unwrap().is_success());
    assert!(handle.start_cantor().await.unwrap());
    assert!(!handle.start_cantor().await.unwrap(), "Already running");

    assert!(handle.reset().await.unwrap().is_success());
    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.round.players.is_empty());

    handle.close().await.unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_adapt_difficulty_needs_adaptive_round() {
    let (handle, task) = spawn_round(2, false);
    handle.start_game("Ana").await.unwrap();

    let stats = UserStatistics {
        total_games: 10,
        wins: 10,
        win_percentage: 100,
        ..UserStatistics::default()
    };
    assert!(handle.adapt_difficulty(stats).await.unwrap().is_empty());

    handle.close().await.unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_closed_round_rejects_messages() {
    let (handle, task) = spawn_round(0, false);
    handle.close().await.unwrap();
    task.await.unwrap();

    assert_eq!(
        handle.start_game("Ana").await.unwrap_err(),
        "Round is closed"
    );
}

#[tokio::test(start_paused = true)]
async fn test_dropping_every_handle_stops_the_actor() {
    let (handle, task) = spawn_round(2, true);
    handle.start_game("Ana").await.unwrap();
    drop(handle);

    task.await.unwrap();
}
