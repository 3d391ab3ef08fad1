//! The round state machine.

use chrono::{TimeDelta, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{collections::VecDeque, sync::Arc, time::Duration};
use uuid::Uuid;

use super::{
    events::RoundEvent,
    integrity,
    state::{GameStats, MarkOutcome, PlayerProgress, RoundSnapshot, RoundState, RoundSummary},
};
use crate::{
    bot::{
        AdaptiveDifficulty, AdaptiveSettings, BotManager, BotReactionScheduler, BotStats,
        DifficultyAdjustment, PendingReaction, ReactionOutcome, adaptive::RECENT_ROUNDS,
    },
    cantor::{Cantor, CantorConfigUpdate, CantorEvent, CantorPreset, CantorStats},
    collaborator::{Celebrator, LogCelebrator, StatisticsSink},
    config::{ConfigError, GameConfig},
    game::{
        BOARD_SIZE, Card, CardId, Catalog, Difficulty, MIN_CALLS_TO_WIN, Player, PlayerId,
        RoundStatus, VictoryProgress, WinPattern, Winner, check_all, check_victory,
        players_near_victory, progress, required_cards, resolve_simultaneous_winners,
        validate_mark,
    },
    stats::UserStatistics,
    timer::{Scheduler, TimerEvent, TimerHandle, TimerQueue},
};

/// One table of Lotería: a human, up to three bots, a Cantor and the timers
/// that drive them.
///
/// All mutation happens through `&mut self`, either from direct calls or from
/// timers fired by [`Round::advance`]. Every mark is validated against the
/// current state and followed by an integrity audit, so bot reactions and
/// human marks may interleave in any order.
pub struct Round {
    config: GameConfig,

    catalog: Arc<Catalog>,

    state: RoundState,

    cantor: Cantor,

    bots: BotManager,

    reactions: BotReactionScheduler,

    /// Virtual clock shared by the Cantor and the bot reactions
    timers: TimerQueue<TimerEvent>,

    /// Draws the human board
    rng: StdRng,

    /// Virtual time at which the current round started
    started_at: Option<Duration>,

    statistics: Option<Arc<dyn StatisticsSink>>,

    celebrator: Arc<dyn Celebrator>,

    /// Moves bots towards the human's level between rounds
    adaptive: Option<AdaptiveDifficulty>,

    /// Latest finished rounds, newest first
    recent_rounds: VecDeque<RoundSummary>,

    events: VecDeque<RoundEvent>,
}

impl Round {
    /// Create a round seeded from the operating system.
    pub fn new(config: GameConfig, catalog: Arc<Catalog>) -> Result<Self, ConfigError> {
        Self::with_seed(config, catalog, rand::random())
    }

    /// Create a round whose every random draw follows from `seed`.
    ///
    /// # Arguments
    ///
    /// * `config` - Round configuration
    /// * `catalog` - Cards of the deck and the boards
    /// * `seed` - Seed of the boards, the deck and the bots
    ///
    /// # Returns
    ///
    /// * `Result<Self, ConfigError>` - Fails on an invalid configuration or a
    ///   catalog too small for a board
    pub fn with_seed(
        config: GameConfig,
        catalog: Arc<Catalog>,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if catalog.len() < BOARD_SIZE {
            return Err(ConfigError::CatalogTooSmall {
                available: catalog.len(),
                required: BOARD_SIZE,
            });
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let cantor = Cantor::with_rng(
            config.cantor,
            Arc::clone(&catalog),
            StdRng::seed_from_u64(rng.random()),
        )?;
        let bots = BotManager::new(StdRng::seed_from_u64(rng.random()));
        let reactions = BotReactionScheduler::new(StdRng::seed_from_u64(rng.random()));

        Ok(Self {
            config,
            catalog,
            state: RoundState::default(),
            cantor,
            bots,
            reactions,
            timers: TimerQueue::new(),
            rng,
            started_at: None,
            statistics: None,
            celebrator: Arc::new(LogCelebrator),
            adaptive: None,
            recent_rounds: VecDeque::with_capacity(RECENT_ROUNDS),
            events: VecDeque::new(),
        })
    }

    /// Report finished rounds to `sink`.
    pub fn with_statistics(mut self, sink: Arc<dyn StatisticsSink>) -> Self {
        self.statistics = Some(sink);
        self
    }

    pub fn with_celebrator(mut self, celebrator: Arc<dyn Celebrator>) -> Self {
        self.celebrator = celebrator;
        self
    }

    /// Let [`Round::adapt_bot_difficulty`] move bots towards the human's
    /// level.
    pub fn with_adaptive_difficulty(mut self, settings: AdaptiveSettings) -> Self {
        self.adaptive = Some(AdaptiveDifficulty::new(settings));
        self
    }

    /// Deal new boards and start playing.
    ///
    /// Any round in progress is abandoned. The Cantor is reset and, when the
    /// configuration asks for it, started right away.
    ///
    /// # Arguments
    ///
    /// * `player_name` - Name of the human player, the configured name if blank
    ///
    /// # Returns
    ///
    /// * `Uuid` - Id of the new round
    pub fn start_new_game(&mut self, player_name: &str) -> Uuid {
        if self.state.status == RoundStatus::Playing {
            log::info!("Abandoning round {:?} for a new one", self.state.game_id);
        }

        self.reactions.cancel_all(&mut self.timers);
        self.reactions.reset_stats();
        self.bots.reset();

        let name = match player_name.trim() {
            "" => self.config.player_name.clone(),
            name => name.to_string(),
        };
        let board = self.catalog.random_cards(BOARD_SIZE, &mut self.rng);
        let mut players = vec![Player::human(PlayerId::human(), &name, board)];
        players.extend(self.bots.spawn_bots(
            self.config.bot_count,
            self.config.bot_difficulty,
            &self.catalog,
        ));
        if let Some(adaptive) = &self.adaptive {
            for bot in players.iter_mut().filter(|player| player.is_bot()) {
                if let Some(difficulty) = adaptive.current_difficulty(&bot.id) {
                    self.bots.update_bot_difficulty(bot, difficulty);
                }
            }
        }

        let early = check_all(&players, &[]);
        if !early.is_empty() {
            log::error!(
                "{} players already satisfy a pattern before any call",
                early.len()
            );
        }

        self.cantor.reset(&mut self.timers);

        let game_id = Uuid::new_v4();
        self.state = RoundState {
            game_id: Some(game_id),
            status: RoundStatus::Playing,
            players,
            start_time: Some(Utc::now()),
            ..RoundState::default()
        };
        self.started_at = Some(self.timers.now());

        log::info!(
            "Round {} started with {} players",
            game_id,
            self.state.players.len()
        );
        self.events.push_back(RoundEvent::GameStarted {
            game_id,
            players: self.state.players.len(),
        });

        if self.config.auto_start_cantor {
            self.start_cantor();
        }
        game_id
    }

    /// Mark `card_id` on the board of `player_id`.
    ///
    /// Only the current card can be marked, and only by a player who holds
    /// it unmarked. A successful mark is audited and, once the round has seen
    /// four calls, checked for victory. Simultaneous winners are resolved in
    /// favour of bots.
    ///
    /// # Returns
    ///
    /// * `MarkOutcome` - Whether the mark was applied and whether the marking
    ///   player is among the winners
    pub fn mark_card(&mut self, player_id: &PlayerId, card_id: CardId) -> MarkOutcome {
        let Some(player) = self.state.player(player_id) else {
            log::warn!("Cannot mark card {}: unknown player {}", card_id, player_id);
            return MarkOutcome::rejected();
        };

        if !validate_mark(player, card_id, self.state.current_card.as_ref()) {
            log::warn!(
                "{} cannot mark card {} (current card {:?}, on board {}, marked {})",
                player.name,
                card_id,
                self.state.current_card.as_ref().map(|card| card.id),
                player.has_card(card_id),
                player.is_marked(card_id)
            );
            return MarkOutcome::rejected();
        }

        if let Some(player) = self.state.player_mut(player_id) {
            player.marked.insert(card_id);
            log::debug!(
                "{} marked card {} ({}/{})",
                player.name,
                card_id,
                player.marked.len(),
                player.board.len()
            );
        }
        self.events.push_back(RoundEvent::CardMarked {
            player_id: player_id.clone(),
            card_id,
        });
        self.audit();

        if self.state.status != RoundStatus::Playing
            || self.state.called_cards.len() < MIN_CALLS_TO_WIN
        {
            return MarkOutcome::accepted(None);
        }

        match self.resolve_winners(player_id) {
            Some((primary, pattern, caller_pattern)) => {
                self.finish(Some(primary), Some(pattern));
                MarkOutcome::accepted(caller_pattern)
            }
            None => MarkOutcome::accepted(None),
        }
    }

    /// Check every board and pick the primary winner.
    ///
    /// # Returns
    ///
    /// * `Option<(PlayerId, &'static str, Option<WinPattern>)>` - Primary
    ///   winner, their pattern name, and the pattern of `caller` if they won
    ///   too. `None` without winners or when a winning line holds an uncalled
    ///   card.
    fn resolve_winners(
        &self,
        caller: &PlayerId,
    ) -> Option<(PlayerId, &'static str, Option<WinPattern>)> {
        let winners = check_all(&self.state.players, &self.state.called_cards);
        if winners.is_empty() {
            return None;
        }

        let forged = winners.iter().any(|winner| {
            winner.pattern.positions.iter().any(|&position| {
                winner
                    .player
                    .board
                    .get(position)
                    .is_none_or(|card| !self.state.is_called(card.id))
            })
        });
        if forged {
            log::error!("Ignoring a victory over a card that was never called");
            return None;
        }

        let resolution = resolve_simultaneous_winners(&winners).ok()?;
        let caller_pattern = resolution
            .all
            .iter()
            .find(|winner| &winner.player.id == caller)
            .map(|winner| *winner.pattern);

        Some((
            resolution.primary.player.id.clone(),
            resolution.primary.pattern.name,
            caller_pattern,
        ))
    }

    /// End the round, with or without a winner.
    pub fn end_game(&mut self, winner: Option<&PlayerId>) {
        let pattern = winner
            .and_then(|id| self.state.player(id))
            .and_then(|player| check_victory(player, &self.state.called_cards))
            .map(|pattern| pattern.name);

        self.finish(winner.cloned(), pattern);
    }

    fn finish(&mut self, winner: Option<PlayerId>, pattern: Option<&str>) {
        let Some(game_id) = self.state.game_id else {
            log::warn!("No round to end");
            return;
        };
        if self.state.status == RoundStatus::Finished {
            log::warn!("Round {} has already ended", game_id);
            return;
        }

        self.cantor.stop(&mut self.timers);

        let elapsed = self.elapsed();
        let elapsed_delta = TimeDelta::from_std(elapsed).unwrap_or_default();
        self.state.end_time = Some(
            self.state
                .start_time
                .map_or_else(Utc::now, |start| start + elapsed_delta),
        );
        self.state.duration_secs = Some(elapsed.as_secs());
        self.state.status = RoundStatus::Finished;

        let winner = winner.filter(|id| match self.state.player_mut(id) {
            Some(player) => {
                player.is_winner = true;
                log::info!("{} wins the round", player.name);
                true
            }
            None => {
                log::warn!("Ignoring unknown winner {}", id);
                false
            }
        });
        self.state.winner = winner.clone();
        self.state.winning_pattern = winner.as_ref().and(pattern.map(str::to_string));

        log::info!(
            "Round {} finished after {} calls and {} s",
            game_id,
            self.state.called_cards.len(),
            elapsed.as_secs()
        );

        if let Some(player_id) = &winner {
            self.events.push_back(RoundEvent::PlayerWon {
                player_id: player_id.clone(),
                pattern: self.state.winning_pattern.clone(),
            });
        }
        self.events
            .push_back(RoundEvent::GameEnded { game_id, winner });

        if let Some(summary) = self.state.summary() {
            self.recent_rounds.push_front(summary);
            self.recent_rounds.truncate(RECENT_ROUNDS);
        }
        self.record_statistics();
    }

    fn record_statistics(&self) {
        let Some(sink) = &self.statistics else {
            return;
        };
        let Some(summary) = self.state.summary() else {
            return;
        };

        match sink.record_game_result(&summary, self.state.human()) {
            Ok(()) => log::debug!("Recorded statistics of round {}", summary.game_id),
            Err(err) => log::error!("Failed to record round statistics: {}", err),
        }
    }

    /// Pause a playing round or resume a paused one.
    ///
    /// # Returns
    ///
    /// * `RoundStatus` - Status after the toggle
    pub fn toggle_pause(&mut self) -> RoundStatus {
        match self.state.status {
            RoundStatus::Playing => {
                self.state.status = RoundStatus::Waiting;
                self.cantor.pause(&mut self.timers);
                log::info!("Round paused");
                self.events.push_back(RoundEvent::Paused);
            }
            RoundStatus::Waiting if self.state.game_id.is_some() => {
                self.state.status = RoundStatus::Playing;
                self.cantor.resume(&mut self.timers);
                log::info!("Round resumed");
                self.events.push_back(RoundEvent::Resumed);

                // Marks made while paused skipped the win check.
                let winner = (self.state.called_cards.len() >= MIN_CALLS_TO_WIN)
                    .then(|| self.resolve_winners(&PlayerId::human()))
                    .flatten();
                if let Some((primary, pattern, _)) = winner {
                    self.finish(Some(primary), Some(pattern));
                }
            }
            _ => {}
        }
        self.state.status
    }

    /// Discard the round. Every timer is cancelled.
    pub fn reset_game(&mut self) {
        self.cantor.reset(&mut self.timers);
        self.reactions.cancel_all(&mut self.timers);
        self.bots.reset();

        self.state = RoundState::default();
        self.started_at = None;
        log::info!("Round reset");
        self.events.push_back(RoundEvent::Reset);
    }

    /// Give every bot a fresh board, dropping their pending reactions.
    pub fn reset_bots(&mut self) -> usize {
        self.reactions.cancel_all(&mut self.timers);

        let mut reset = 0;
        for player in &mut self.state.players {
            if self.bots.reset_bot(player, &self.catalog) {
                reset += 1;
            }
        }
        reset
    }

    pub fn update_bot_difficulty(&mut self, bot_id: &PlayerId, difficulty: Difficulty) -> bool {
        match self.state.player_mut(bot_id) {
            Some(bot) => self.bots.update_bot_difficulty(bot, difficulty),
            None => false,
        }
    }

    /// Move the bots towards the human's level after a round.
    ///
    /// Does nothing unless the round was built with
    /// [`Round::with_adaptive_difficulty`]. Adjusted difficulties carry over
    /// to the bots of later rounds.
    ///
    /// # Arguments
    ///
    /// * `stats` - Lifetime statistics of the human
    ///
    /// # Returns
    ///
    /// * `Vec<DifficultyAdjustment>` - Adjustments applied to the current bots
    pub fn adapt_bot_difficulty(&mut self, stats: &UserStatistics) -> Vec<DifficultyAdjustment> {
        let Some(adaptive) = self.adaptive.as_mut() else {
            return Vec::new();
        };

        adaptive.auto_adjust_difficulty(
            stats,
            self.recent_rounds.make_contiguous(),
            &mut self.state.players,
            &self.bots,
        )
    }

    pub fn adaptive(&self) -> Option<&AdaptiveDifficulty> {
        self.adaptive.as_ref()
    }

    pub fn adaptive_mut(&mut self) -> Option<&mut AdaptiveDifficulty> {
        self.adaptive.as_mut()
    }

    /// Latest finished rounds, newest first.
    pub fn recent_rounds(&self) -> &VecDeque<RoundSummary> {
        &self.recent_rounds
    }

    pub fn start_cantor(&mut self) -> bool {
        let started = self.cantor.start(&mut self.timers);
        self.process_cantor_events();
        started
    }

    pub fn stop_cantor(&mut self) {
        self.cantor.stop(&mut self.timers);
    }

    pub fn pause_cantor(&mut self) {
        self.cantor.pause(&mut self.timers);
    }

    pub fn resume_cantor(&mut self) {
        self.cantor.resume(&mut self.timers);
    }

    /// Call the next card by hand. The Cantor's timer keeps its cadence.
    pub fn call_next_card(&mut self) -> Option<Card> {
        let card = self.cantor.call_next_card(&mut self.timers);
        self.process_cantor_events();
        card
    }

    pub fn set_cantor_preset(&mut self, preset: CantorPreset) -> Result<(), ConfigError> {
        self.cantor.set_preset(preset, &mut self.timers)?;
        self.config.cantor = *self.cantor.config();
        Ok(())
    }

    pub fn update_cantor_config(&mut self, update: CantorConfigUpdate) -> Result<(), ConfigError> {
        self.cantor.update_config(update, &mut self.timers)?;
        self.config.cantor = *self.cantor.config();
        Ok(())
    }

    pub fn cantor_stats(&self) -> CantorStats {
        self.cantor.stats()
    }

    pub fn was_card_called(&self, card_id: CardId) -> bool {
        self.cantor.was_called(card_id)
    }

    fn process_cantor_events(&mut self) {
        for event in self.cantor.drain_events() {
            match event {
                CantorEvent::CardCalled(card) => self.on_card_called(card),
                CantorEvent::DeckRefilled => self.events.push_back(RoundEvent::DeckRefilled),
                CantorEvent::DeckExhausted => {
                    self.events.push_back(RoundEvent::DeckExhausted);
                    if self.state.status == RoundStatus::Playing {
                        log::info!("Deck exhausted without a winner");
                        self.finish(None, None);
                    }
                }
            }
        }
    }

    fn on_card_called(&mut self, card: Card) {
        self.state.called_cards.push(card.clone());
        self.state.current_card = Some(card.clone());
        log::info!("Called {} ({})", card.name, card.phrase);

        for bot in self.state.players.iter().filter(|player| player.is_bot()) {
            self.reactions.react(bot, &card, &mut self.timers);
        }

        self.events.push_back(RoundEvent::CardCalled {
            card,
            call_number: self.state.called_cards.len(),
        });
    }

    fn on_bot_reaction(&mut self, handle: TimerHandle, reaction: &PendingReaction) {
        let bot = self.state.player(&reaction.bot_id);
        match self.reactions.fire(handle, reaction, bot) {
            ReactionOutcome::Mark { bot_id, card_id } => {
                if !self.mark_card(&bot_id, card_id).success {
                    return;
                }
                if let Some(bot) = self.state.player(&bot_id) {
                    if let Err(err) = self.celebrator.celebrate(bot, &reaction.card) {
                        log::error!("Celebration of {} failed: {}", bot.name, err);
                    }
                }
            }
            ReactionOutcome::Missed { bot_id } => {
                self.events.push_back(RoundEvent::BotMissed {
                    bot_id,
                    card_id: reaction.card.id,
                });
            }
            ReactionOutcome::WrongCard { bot_id, card_id } => {
                self.events
                    .push_back(RoundEvent::BotWrongCard { bot_id, card_id });
            }
            ReactionOutcome::Stale => {}
        }
    }

    /// Move the virtual clock forward by `by`, firing every timer due.
    pub fn advance(&mut self, by: Duration) {
        self.advance_to(self.timers.now() + by);
    }

    /// Fire every timer due at or before `until`, in deadline order.
    pub fn advance_to(&mut self, until: Duration) {
        while let Some(fired) = self.timers.pop_due(until) {
            match fired.event {
                TimerEvent::CantorTick => {
                    self.cantor.handle_tick(fired.handle, &mut self.timers);
                    self.process_cantor_events();
                }
                TimerEvent::BotReaction(reaction) => self.on_bot_reaction(fired.handle, &reaction),
            }
        }
        self.timers.advance_to(until);
    }

    /// Deadline of the next pending timer on the virtual clock.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    fn elapsed(&self) -> Duration {
        self.started_at
            .map(|start| self.timers.now().saturating_sub(start))
            .unwrap_or_default()
    }

    /// Run the integrity audit, reporting any repair as an event.
    fn audit(&mut self) -> bool {
        let report = integrity::audit(&mut self.state);
        if report.is_clean() {
            return true;
        }

        self.events.push_back(RoundEvent::IntegrityRepaired {
            removed_marks: report.removed_marks.len(),
            status_reverted: report.status_reverted,
        });
        false
    }

    /// Audit the round now. Returns `true` when nothing needed repair.
    pub fn verify_integrity(&mut self) -> bool {
        self.audit()
    }

    pub fn player_progress(&self, player_id: &PlayerId) -> Option<PlayerProgress> {
        self.state.player(player_id).map(PlayerProgress::from)
    }

    pub fn victory_status(&self, player_id: &PlayerId) -> Option<VictoryProgress> {
        self.state
            .player(player_id)
            .map(|player| progress(player, &self.state.called_cards))
    }

    pub fn players_near_victory(&self) -> Vec<(&Player, VictoryProgress)> {
        players_near_victory(&self.state.players, &self.state.called_cards)
    }

    pub fn required_cards(&self, player_id: &PlayerId) -> Vec<&Card> {
        self.state
            .player(player_id)
            .map(required_cards)
            .unwrap_or_default()
    }

    /// Victory check of every player, without ending the round.
    pub fn check_for_victories(&self) -> Vec<Winner<'_>> {
        check_all(&self.state.players, &self.state.called_cards)
    }

    pub fn current_game_stats(&self) -> Option<GameStats> {
        let game_id = self.state.game_id?;
        let elapsed_secs = self
            .state
            .duration_secs
            .unwrap_or_else(|| self.elapsed().as_secs());

        Some(GameStats {
            game_id,
            status: self.state.status,
            elapsed_secs,
            cards_called: self.state.called_cards.len(),
            players: self.state.players.iter().map(PlayerProgress::from).collect(),
        })
    }

    pub fn bot_stats(&self, bot_id: &PlayerId) -> Option<&BotStats> {
        self.reactions.stats(bot_id)
    }

    pub fn pending_reactions(&self) -> usize {
        self.reactions.pending_count()
    }

    /// Plain data copy of the round and the Cantor.
    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            round: self.state.clone(),
            cantor: self.cantor.snapshot(),
        }
    }

    /// Replace the round with a snapshot.
    ///
    /// No timer survives: pending reactions are dropped, a running Cantor
    /// comes back paused and a playing round comes back waiting, ready for
    /// [`Round::toggle_pause`]. The elapsed time restarts at the restore.
    pub fn restore(&mut self, snapshot: RoundSnapshot) -> Result<(), ConfigError> {
        self.cantor.restore(snapshot.cantor, &mut self.timers)?;
        self.config.cantor = *self.cantor.config();
        self.reactions.cancel_all(&mut self.timers);

        self.state = snapshot.round;
        if self.state.status == RoundStatus::Playing {
            self.state.status = RoundStatus::Waiting;
        }
        self.started_at = self.state.game_id.map(|_| self.timers.now());
        self.audit();

        log::info!(
            "Restored round {:?} with {} calls",
            self.state.game_id,
            self.state.called_cards.len()
        );
        Ok(())
    }

    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        self.events.drain(..).collect()
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn status(&self) -> RoundStatus {
        self.state.status
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cantor(&self) -> &Cantor {
        &self.cantor
    }

    pub fn human(&self) -> Option<&Player> {
        self.state.human()
    }
}
