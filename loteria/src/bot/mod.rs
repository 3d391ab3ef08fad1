//! Bot module providing simulated opponents with difficulty presets.
//!
//! This module implements:
//! - BotManager: creates the bots of a round with unique names
//! - BotReactionScheduler: one delayed reaction per bot and called card
//! - Difficulty presets (Easy, Medium, Hard) and six personalities
//! - Error injection capped at 30%
//! - Per-bot reaction statistics
//! - AdaptiveDifficulty: moves bots towards the human's skill level
//!
//! ## Difficulty Presets
//!
//! ### Easy
//! - Reacts in 3 to 6 seconds
//! - Errs 25% of the time
//!
//! ### Medium
//! - Reacts in 2 to 4.5 seconds
//! - Errs 15% of the time
//!
//! ### Hard
//! - Reacts in 1 to 3 seconds
//! - Errs 8% of the time
//!
//! Personalities scale the reaction time and add their own error
//! probability on top.
//!
//! ## Example
//!
//! ```
//! use loteria::bot::{BotManager, BotReactionScheduler};
//! use loteria::game::{Catalog, Difficulty};
//! use loteria::timer::{TimerEvent, TimerQueue};
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let catalog = Catalog::standard();
//! let mut manager = BotManager::new(StdRng::seed_from_u64(1));
//! let bots = manager.spawn_bots(2, Difficulty::Medium, &catalog);
//!
//! let mut timers: TimerQueue<TimerEvent> = TimerQueue::new();
//! let mut reactions = BotReactionScheduler::new(StdRng::seed_from_u64(2));
//! let card = bots[0].board[0].clone();
//! assert!(reactions.react(&bots[0], &card, &mut timers).is_some());
//! ```

pub mod adaptive;
pub mod manager;
pub mod models;
pub mod reaction;

pub use adaptive::{
    AdaptiveDifficulty, AdaptiveSettings, AdaptiveStats, DifficultyAdjustment, PerformanceMetrics,
    SkillLevelBounds, analyze_player_performance, recommended_difficulty,
};
pub use manager::BotManager;
pub use models::{BOT_NAMES, BotStats, DifficultyParams, personality};
pub use reaction::{BotReactionScheduler, PendingReaction, ReactionOutcome};
