//! # Lotería
//!
//! A Lotería round engine: a timed card caller, simulated bot opponents and
//! win detection over 4×4 boards.
//!
//! Time is virtual. Every timer of a round lives in a [`timer::TimerQueue`]
//! that only moves when the round is advanced, so a round is deterministic
//! under test and can be driven in real time by a [`round::RoundActor`].
//!
//! ## Round Lifecycle
//!
//! - **Waiting**: no round yet, or a round on pause
//! - **Playing**: the Cantor calls cards and bots react to them
//! - **Finished**: a player completed a pattern or the deck ran out
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, players, the catalog and win patterns
//! - [`cantor`]: The card caller
//! - [`bot`]: Bot roster, delayed reactions and adaptive difficulty
//! - [`round`]: The round state machine, integrity audits and the actor
//! - [`stats`]: Statistics and achievement progress
//!
//! ## Example
//!
//! ```
//! use loteria::{Catalog, GameConfig, Round, RoundStatus};
//! use std::{sync::Arc, time::Duration};
//!
//! let mut round = Round::with_seed(GameConfig::default(), Arc::new(Catalog::standard()), 42)
//!     .unwrap();
//! round.start_new_game("Ana");
//! assert_eq!(round.status(), RoundStatus::Playing);
//!
//! round.advance(Duration::from_secs(30));
//! assert!(round.state().called_cards.len() > 1);
//! ```

pub mod bot;
pub mod cantor;
pub mod collaborator;
pub mod config;
pub mod game;
pub mod round;
pub mod stats;
pub mod timer;

pub use cantor::{Cantor, CantorConfig, CantorPreset};
pub use collaborator::{Celebrator, CollaboratorError, StatisticsSink};
pub use config::{ConfigError, GameConfig};
pub use game::{Card, Catalog, Difficulty, Player, PlayerId, RoundStatus};
pub use round::{MarkOutcome, Round, RoundActor, RoundEvent, RoundHandle, RoundSnapshot};
pub use stats::StatisticsRecorder;
