//! A headless Lotería round simulator.
//!
//! The simulator plays rounds in real time through the round actor, printing
//! every event as it happens, and prints the player's statistics at the end.

mod config;

use std::{collections::HashSet, sync::Arc};

use anyhow::{Context, Error};
use ctrlc::set_handler;
use log::info;
use loteria::{
    Catalog, PlayerId, RoundActor, RoundEvent, RoundHandle, RoundSnapshot, StatisticsRecorder,
    bot::{AdaptiveSettings, DifficultyAdjustment},
    game::CardId,
    stats::{StatisticsExport, milestones},
};
use tokio::sync::mpsc::Receiver;
use pico_args::Arguments;

use config::SimConfig;

const HELP: &str = "\
Simulate Lotería rounds against bots

USAGE:
  loteria_sim [OPTIONS]

OPTIONS:
  --name        NAME      Human player name       [default: env LOTERIA_PLAYER_NAME or Jugador]
  --bots        N         Number of bots (0-3)    [default: env LOTERIA_BOTS or 2]
  --difficulty  LEVEL     easy, medium or hard    [default: env LOTERIA_DIFFICULTY or easy]
  --preset      PRESET    slow, normal, fast or rapid  [default: env LOTERIA_PRESET or rapid]
  --rounds      N         Rounds to play          [default: env LOTERIA_ROUNDS or 1]
  --seed        N         Seed for reproducible rounds  [default: env LOTERIA_SEED]

FLAGS:
  --auto-mark             Mark the player's cards automatically [default: env LOTERIA_AUTO_MARK or false]
  --adaptive              Adjust bots to the player's level between rounds [default: env LOTERIA_ADAPTIVE or false]
  -h, --help              Print help information

ENVIRONMENT:
  RUST_LOG                Log level (e.g., info, loteria=debug)
  (A .env file in the working directory is read first)
";

/// Subscriber id of the simulator's event stream
const SUBSCRIBER_ID: u64 = 1;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let mut config = SimConfig::from_env().context("Failed to read LOTERIA_* settings")?;
    if let Some(name) = pargs.opt_value_from_str("--name")? {
        config.player_name = name;
    }
    if let Some(bots) = pargs.opt_value_from_str("--bots")? {
        config.bots = bots;
    }
    if let Some(difficulty) = pargs.opt_value_from_str("--difficulty")? {
        config.difficulty = difficulty;
    }
    if let Some(preset) = pargs.opt_value_from_str("--preset")? {
        config.preset = preset;
    }
    if let Some(rounds) = pargs.opt_value_from_str("--rounds")? {
        config.rounds = rounds;
    }
    if let Some(seed) = pargs.opt_value_from_str("--seed")? {
        config.seed = Some(seed);
    }
    if pargs.contains("--auto-mark") {
        config.auto_mark = true;
    }
    if pargs.contains("--adaptive") {
        config.adaptive = true;
    }

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    let game_config = config.game_config();
    game_config.validate().context("Invalid round settings")?;
    info!(
        "Simulating {} round(s) for {} against {} {} bot(s), {} calls",
        config.rounds, config.player_name, config.bots, config.difficulty, config.preset
    );

    let catalog = Arc::new(Catalog::standard());
    let recorder = Arc::new(StatisticsRecorder::new());

    let mut round = config
        .round(catalog)
        .context("Failed to build round")?
        .with_statistics(recorder.clone());
    if config.adaptive {
        round = round.with_adaptive_difficulty(AdaptiveSettings::default());
    }

    let (actor, handle) = RoundActor::new(round);
    let task = tokio::spawn(actor.run());
    let mut events = handle
        .subscribe(SUBSCRIBER_ID, 256)
        .await
        .map_err(Error::msg)?;

    for number in 0..config.rounds {
        println!("\n=== Round {} of {} ===", number + 1, config.rounds);
        play_round(&handle, &mut events, &config).await?;

        if config.adaptive {
            let adjustments = handle
                .adapt_difficulty(recorder.user_stats()?)
                .await
                .map_err(Error::msg)?;
            print_adjustments(&adjustments);
        }
    }

    handle.close().await.map_err(Error::msg)?;
    task.await.context("Round actor panicked")?;

    print_statistics(&recorder.export()?);
    Ok(())
}

/// Play one round to the end through the round actor.
async fn play_round(
    handle: &RoundHandle,
    events: &mut Receiver<RoundEvent>,
    config: &SimConfig,
) -> Result<(), Error> {
    handle
        .start_game(&config.player_name)
        .await
        .map_err(Error::msg)?;

    let snapshot = handle.snapshot().await.map_err(Error::msg)?;
    let human = PlayerId::human();
    let board = human_board(&snapshot);
    print_board(&snapshot);

    while let Some(event) = events.recv().await {
        print_event(&event);

        match event {
            RoundEvent::CardCalled { card, .. } if config.auto_mark && board.contains(&card.id) => {
                let outcome = handle
                    .mark_card(human.clone(), card.id)
                    .await
                    .map_err(Error::msg)?;
                if outcome.has_won {
                    println!("¡Lotería! {} completed a pattern", config.player_name);
                }
            }
            RoundEvent::GameEnded { .. } => break,
            _ => {}
        }
    }
    Ok(())
}

fn human_board(snapshot: &RoundSnapshot) -> HashSet<CardId> {
    snapshot
        .round
        .human()
        .map(|player| player.board.iter().map(|card| card.id).collect())
        .unwrap_or_default()
}

fn print_board(snapshot: &RoundSnapshot) {
    let Some(human) = snapshot.round.human() else {
        return;
    };

    println!("{}'s board:", human.name);
    for row in human.board.chunks(loteria::game::BOARD_SIDE) {
        let names: Vec<_> = row.iter().map(|card| format!("{:<14}", card.name)).collect();
        println!("  {}", names.join(""));
    }
}

fn print_event(event: &RoundEvent) {
    match event {
        RoundEvent::GameStarted { game_id, players } => {
            println!("Game {game_id} started with {players} players");
        }
        RoundEvent::CardCalled { card, call_number } => {
            println!("[{call_number:>2}] {}: {}", card.name, card.phrase);
        }
        RoundEvent::CardMarked { player_id, card_id } => {
            println!("     {player_id} marked #{card_id}");
        }
        RoundEvent::BotMissed { bot_id, card_id } => {
            println!("     {bot_id} missed #{card_id}");
        }
        RoundEvent::BotWrongCard { bot_id, card_id } => {
            println!("     {bot_id} reached for the wrong card (#{card_id})");
        }
        RoundEvent::IntegrityRepaired {
            removed_marks,
            status_reverted,
        } => {
            println!(
                "Integrity repaired: {removed_marks} mark(s) removed, reopened: {status_reverted}"
            );
        }
        RoundEvent::PlayerWon { player_id, pattern } => {
            println!(
                "{player_id} wins with {}",
                pattern.as_deref().unwrap_or("an unknown pattern")
            );
        }
        RoundEvent::GameEnded { game_id, winner } => match winner {
            Some(winner) => println!("Game {game_id} ended, winner: {winner}"),
            None => println!("Game {game_id} ended without a winner"),
        },
        RoundEvent::DeckRefilled => println!("The deck was refilled"),
        RoundEvent::DeckExhausted => println!("The deck ran out"),
        RoundEvent::Paused => println!("Paused"),
        RoundEvent::Resumed => println!("Resumed"),
        RoundEvent::Reset => println!("Round reset"),
    }
}

fn print_adjustments(adjustments: &[DifficultyAdjustment]) {
    for adjustment in adjustments {
        println!(
            "{} now plays {} (was {}): {}",
            adjustment.bot_id,
            adjustment.new_difficulty,
            adjustment.old_difficulty,
            adjustment.reason
        );
    }
}

fn print_statistics(export: &StatisticsExport) {
    let stats = &export.user_stats;

    println!("\n=== Statistics ===");
    println!(
        "Games: {}  Wins: {}  Losses: {}  Win rate: {}%",
        stats.total_games, stats.wins, stats.losses, stats.win_percentage
    );
    println!(
        "Average game: {} s  Longest win streak: {}  Rating: {}",
        stats.average_game_time,
        stats.longest_win_streak,
        stats.performance_rating()
    );
    println!(
        "This session: {} game(s), {} win(s)",
        export.session_stats.games_this_session, export.session_stats.wins_this_session
    );

    for milestone in milestones(stats) {
        let mark = if milestone.is_unlocked { "x" } else { " " };
        println!(
            "  [{mark}] {} ({}/{}): {}",
            milestone.name, milestone.progress, milestone.max_progress, milestone.description
        );
    }
}
