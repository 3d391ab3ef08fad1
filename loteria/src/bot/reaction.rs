//! Delayed, error-prone bot reactions to called cards.
//!
//! Every bot that holds a freshly called card gets a one-shot timer. When it
//! fires the bot either marks the card, misses it, or reaches for a wrong
//! card. Only the first outcome touches the round; the other two are logged
//! and counted.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use std::{collections::HashMap, time::Duration};

use super::models::{BotStats, MAX_ERROR_PROBABILITY, MISS_SHARE};
use crate::{
    game::{BotProfile, Card, CardId, Player, PlayerId},
    timer::{Scheduler, TimerEvent, TimerHandle},
};

/// A reaction waiting on its timer.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReaction {
    pub bot_id: PlayerId,
    pub card: Card,
    pub will_error: bool,
    pub reaction_time: Duration,
}

/// What a bot did when its reaction timer fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// The bot wants to mark the card.
    Mark { bot_id: PlayerId, card_id: CardId },
    Missed { bot_id: PlayerId },
    /// The bot reached for an unmarked card that was not called.
    WrongCard { bot_id: PlayerId, card_id: CardId },
    /// The bot is gone, the card is already marked, or the timer was
    /// superseded.
    Stale,
}

/// Per-bot reaction timers.
///
/// At most one reaction is pending per bot; scheduling a new one cancels the
/// previous timer.
#[derive(Debug)]
pub struct BotReactionScheduler {
    timers: HashMap<PlayerId, TimerHandle>,
    stats: HashMap<PlayerId, BotStats>,
    rng: StdRng,
}

impl Default for BotReactionScheduler {
    fn default() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl BotReactionScheduler {
    pub fn new(rng: StdRng) -> Self {
        Self {
            timers: HashMap::new(),
            stats: HashMap::new(),
            rng,
        }
    }

    /// Schedule `bot`'s reaction to `card`.
    ///
    /// Any pending reaction of the bot is cancelled first. Nothing is
    /// scheduled when the bot does not hold the card or already marked it.
    ///
    /// # Returns
    ///
    /// * `Option<TimerHandle>` - The reaction timer, if one was scheduled
    pub fn react(
        &mut self,
        bot: &Player,
        card: &Card,
        timers: &mut impl Scheduler<TimerEvent>,
    ) -> Option<TimerHandle> {
        let profile = bot.bot_profile()?;
        self.cancel(&bot.id, timers);

        if !bot.has_card(card.id) {
            log::trace!("{} does not hold {}", bot.name, card.name);
            return None;
        }
        if bot.is_marked(card.id) {
            log::trace!("{} already marked {}", bot.name, card.name);
            return None;
        }

        let reaction_time = self.reaction_time(profile);
        let will_error = self.will_error(profile);
        log::debug!(
            "{} reacts to {} in {} ms{}",
            bot.name,
            card.name,
            reaction_time.as_millis(),
            if will_error { " (will err)" } else { "" }
        );

        let reaction = PendingReaction {
            bot_id: bot.id.clone(),
            card: card.clone(),
            will_error,
            reaction_time,
        };
        let handle = timers.schedule_once(reaction_time, TimerEvent::BotReaction(reaction));
        self.timers.insert(bot.id.clone(), handle);
        self.stats.entry(bot.id.clone()).or_default().reactions += 1;
        Some(handle)
    }

    /// Uniform draw from the reaction window, scaled by the personality and
    /// by a ±20% jitter.
    pub fn reaction_time(&mut self, profile: &BotProfile) -> Duration {
        let (min, max) = profile.reaction_time_range;
        let base = if min >= max {
            min as f64
        } else {
            self.rng.random_range(min as f64..max as f64)
        };
        let jitter = 0.8 + self.rng.random::<f64>() * 0.4;
        let millis = (base * profile.personality.reaction_speed * jitter).floor();

        Duration::from_millis(millis.max(0.0) as u64)
    }

    /// Chance of error is the difficulty's rate plus the personality's,
    /// capped at 30%.
    pub fn will_error(&mut self, profile: &BotProfile) -> bool {
        let probability =
            (profile.error_rate + profile.personality.error_probability).min(MAX_ERROR_PROBABILITY);
        self.rng.random::<f64>() < probability
    }

    /// Resolve a fired reaction against the bot's current state.
    ///
    /// # Arguments
    ///
    /// * `handle` - Timer that fired
    /// * `reaction` - The reaction it carried
    /// * `bot` - The bot as it is now, `None` if it left the round
    pub fn fire(
        &mut self,
        handle: TimerHandle,
        reaction: &PendingReaction,
        bot: Option<&Player>,
    ) -> ReactionOutcome {
        if self.timers.get(&reaction.bot_id) == Some(&handle) {
            self.timers.remove(&reaction.bot_id);
        } else {
            log::debug!("Dropping superseded reaction of {}", reaction.bot_id);
            return self.count_stale(&reaction.bot_id);
        }

        let Some(bot) = bot else {
            return self.count_stale(&reaction.bot_id);
        };

        let stats = self.stats.entry(bot.id.clone()).or_default();
        if reaction.will_error {
            if self.rng.random::<f64>() < MISS_SHARE {
                log::debug!("{} missed {}", bot.name, reaction.card.name);
                stats.misses += 1;
                return ReactionOutcome::Missed {
                    bot_id: bot.id.clone(),
                };
            }

            let unmarked: Vec<&Card> = bot
                .board
                .iter()
                .filter(|card| !bot.is_marked(card.id))
                .collect();
            return match unmarked.choose(&mut self.rng) {
                Some(wrong) => {
                    log::debug!("{} reached for the wrong card {}", bot.name, wrong.name);
                    stats.wrong_cards += 1;
                    ReactionOutcome::WrongCard {
                        bot_id: bot.id.clone(),
                        card_id: wrong.id,
                    }
                }
                None => {
                    stats.misses += 1;
                    ReactionOutcome::Missed {
                        bot_id: bot.id.clone(),
                    }
                }
            };
        }

        if !bot.has_card(reaction.card.id) || bot.is_marked(reaction.card.id) {
            log::debug!("{} can no longer mark {}", bot.name, reaction.card.name);
            stats.stale += 1;
            return ReactionOutcome::Stale;
        }

        stats.marks += 1;
        ReactionOutcome::Mark {
            bot_id: bot.id.clone(),
            card_id: reaction.card.id,
        }
    }

    fn count_stale(&mut self, bot_id: &PlayerId) -> ReactionOutcome {
        self.stats.entry(bot_id.clone()).or_default().stale += 1;
        ReactionOutcome::Stale
    }

    /// Cancel the bot's pending reaction, if any.
    pub fn cancel(&mut self, bot_id: &PlayerId, timers: &mut impl Scheduler<TimerEvent>) -> bool {
        match self.timers.remove(bot_id) {
            Some(handle) => timers.cancel(handle),
            None => false,
        }
    }

    /// Cancel every pending reaction.
    pub fn cancel_all(&mut self, timers: &mut impl Scheduler<TimerEvent>) -> usize {
        let cancelled = self
            .timers
            .drain()
            .filter(|(_, handle)| timers.cancel(*handle))
            .count();
        if cancelled > 0 {
            log::debug!("Cancelled {} pending bot reactions", cancelled);
        }
        cancelled
    }

    pub fn is_pending(&self, bot_id: &PlayerId) -> bool {
        self.timers.contains_key(bot_id)
    }

    pub fn pending_count(&self) -> usize {
        self.timers.len()
    }

    pub fn stats(&self, bot_id: &PlayerId) -> Option<&BotStats> {
        self.stats.get(bot_id)
    }

    pub fn reset_stats(&mut self) {
        self.stats.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bot::models::{DifficultyParams, personality},
        game::{Catalog, Difficulty, Personality},
        timer::TimerQueue,
    };

    fn scheduler() -> BotReactionScheduler {
        BotReactionScheduler::new(StdRng::seed_from_u64(5))
    }

    fn bot_with(error_rate: f64, error_probability: f64) -> Player {
        let profile = BotProfile {
            difficulty: Difficulty::Medium,
            reaction_time_range: (1000, 2000),
            error_rate,
            personality: Personality {
                error_probability,
                ..personality(0)
            },
        };
        let board = Catalog::standard().cards()[..16].to_vec();
        Player::bot(PlayerId::bot(1), "Guadalupe", board, profile)
    }

    fn fire_next(
        scheduler: &mut BotReactionScheduler,
        timers: &mut TimerQueue<TimerEvent>,
        bot: &Player,
    ) -> ReactionOutcome {
        let fired = timers.pop_due(Duration::from_secs(3600)).expect("A reaction is due");
        let TimerEvent::BotReaction(reaction) = fired.event else {
            panic!("Expected a bot reaction");
        };
        scheduler.fire(fired.handle, &reaction, Some(bot))
    }

    #[test]
    fn test_reaction_time_bounds() {
        let mut scheduler = scheduler();
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let params = DifficultyParams::from_difficulty(difficulty);
            for index in 0..6 {
                let profile = params.profile(difficulty, personality(index));
                let (min, max) = profile.reaction_time_range;
                let speed = profile.personality.reaction_speed;
                for _ in 0..50 {
                    let ms = scheduler.reaction_time(&profile).as_millis() as f64;
                    assert!(ms >= (min as f64 * speed * 0.8).floor() - 1.0);
                    assert!(ms <= max as f64 * speed * 1.2);
                }
            }
        }
    }

    #[test]
    fn test_error_probability_is_capped() {
        let mut scheduler = scheduler();
        let profile = bot_with(1.0, 1.0).bot_profile().unwrap().clone();
        let errors = (0..2000).filter(|_| scheduler.will_error(&profile)).count();
        assert!(errors < 800, "Expected about 30% errors, got {errors}");
        assert!(errors > 400, "Expected about 30% errors, got {errors}");
    }

    #[test]
    fn test_skips_cards_not_held_or_marked() {
        let mut scheduler = scheduler();
        let mut timers: TimerQueue<TimerEvent> = TimerQueue::new();
        let mut bot = bot_with(0.0, 0.0);
        let missing = Catalog::standard().get(25).unwrap().clone();

        assert!(scheduler.react(&bot, &missing, &mut timers).is_none());

        let held = bot.board[0].clone();
        bot.marked.insert(held.id);
        assert!(scheduler.react(&bot, &held, &mut timers).is_none());
        assert!(timers.is_empty());
    }

    #[test]
    fn test_accurate_bot_marks() {
        let mut scheduler = scheduler();
        let mut timers: TimerQueue<TimerEvent> = TimerQueue::new();
        let bot = bot_with(0.0, 0.0);
        let card = bot.board[3].clone();

        scheduler.react(&bot, &card, &mut timers).unwrap();
        assert!(scheduler.is_pending(&bot.id));

        let outcome = fire_next(&mut scheduler, &mut timers, &bot);
        assert_eq!(
            outcome,
            ReactionOutcome::Mark {
                bot_id: bot.id.clone(),
                card_id: card.id
            }
        );
        assert!(!scheduler.is_pending(&bot.id));
        assert_eq!(scheduler.stats(&bot.id).unwrap().marks, 1);
    }

    #[test]
    fn test_errors_leave_board_untouched() {
        let mut scheduler = scheduler();
        let mut timers: TimerQueue<TimerEvent> = TimerQueue::new();
        let bot = bot_with(1.0, 1.0);

        let mut errors = 0;
        for position in (0..16).cycle().take(64) {
            let card = bot.board[position].clone();
            if scheduler.react(&bot, &card, &mut timers).is_none() {
                continue;
            }
            let outcome = fire_next(&mut scheduler, &mut timers, &bot);
            if !matches!(outcome, ReactionOutcome::Mark { .. }) {
                errors += 1;
            }
            if let ReactionOutcome::WrongCard { card_id, .. } = outcome {
                assert!(!bot.is_marked(card_id));
            }
        }
        assert!(errors > 0);
    }

    #[test]
    fn test_new_reaction_cancels_previous() {
        let mut scheduler = scheduler();
        let mut timers: TimerQueue<TimerEvent> = TimerQueue::new();
        let bot = bot_with(0.0, 0.0);

        let first = scheduler.react(&bot, &bot.board[0], &mut timers).unwrap();
        let second = scheduler.react(&bot, &bot.board[1], &mut timers).unwrap();
        assert!(!timers.is_pending(first));
        assert!(timers.is_pending(second));
        assert_eq!(timers.len(), 1);
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn test_card_marked_meanwhile_is_stale() {
        let mut scheduler = scheduler();
        let mut timers: TimerQueue<TimerEvent> = TimerQueue::new();
        let mut bot = bot_with(0.0, 0.0);
        let card = bot.board[0].clone();

        scheduler.react(&bot, &card, &mut timers).unwrap();
        bot.marked.insert(card.id);
        assert_eq!(
            fire_next(&mut scheduler, &mut timers, &bot),
            ReactionOutcome::Stale
        );
    }

    #[test]
    fn test_cancel_all() {
        let mut scheduler = scheduler();
        let mut timers: TimerQueue<TimerEvent> = TimerQueue::new();
        let bot = bot_with(0.0, 0.0);
        scheduler.react(&bot, &bot.board[0], &mut timers);

        assert_eq!(scheduler.cancel_all(&mut timers), 1);
        assert!(timers.is_empty());
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(scheduler.cancel_all(&mut timers), 0);
    }
}
