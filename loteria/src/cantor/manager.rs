//! The card caller.

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, sync::Arc};

use super::config::{CantorConfig, CantorConfigUpdate, CantorPreset};
use crate::{
    config::ConfigError,
    game::{Card, CardId, Catalog},
    timer::{Scheduler, TimerEvent, TimerHandle},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CantorPhase {
    #[default]
    Idle,
    Active,
    /// Still running but with no timer armed.
    Paused,
    Finished,
}

/// What the Cantor did, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CantorEvent {
    CardCalled(Card),
    DeckRefilled,
    DeckExhausted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CantorStats {
    pub total: usize,
    pub called_count: usize,
    pub remaining_count: usize,
    pub progress_percent: f64,
    pub is_active: bool,
    pub current_card_name: Option<String>,
}

/// Plain data copy of the Cantor, for external save/load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CantorSnapshot {
    pub phase: CantorPhase,
    pub config: CantorConfig,
    pub remaining: Vec<Card>,
    pub called: Vec<Card>,
    pub current: Option<Card>,
}

/// Calls cards from a shuffled deck, one immediately on start and then one
/// per interval.
///
/// The Cantor never waits itself. Its repeating timer lives in the
/// [`Scheduler`] handed to every state-changing call, and each tick arrives
/// back through [`Cantor::handle_tick`]. Calls and exhaustion are queued as
/// [`CantorEvent`]s for the owner to drain.
#[derive(Debug)]
pub struct Cantor {
    config: CantorConfig,
    catalog: Arc<Catalog>,
    phase: CantorPhase,
    remaining: VecDeque<Card>,
    called: Vec<Card>,
    current: Option<Card>,
    timer: Option<TimerHandle>,
    rng: StdRng,
    events: VecDeque<CantorEvent>,
}

impl Cantor {
    pub fn new(config: CantorConfig, catalog: Arc<Catalog>) -> Result<Self, ConfigError> {
        Self::with_rng(config, catalog, StdRng::from_os_rng())
    }

    /// Build a Cantor shuffling with the given generator.
    pub fn with_rng(
        config: CantorConfig,
        catalog: Arc<Catalog>,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut cantor = Self {
            config,
            catalog,
            phase: CantorPhase::Idle,
            remaining: VecDeque::new(),
            called: Vec::new(),
            current: None,
            timer: None,
            rng,
            events: VecDeque::new(),
        };
        cantor.rebuild_deck();
        Ok(cantor)
    }

    fn rebuild_deck(&mut self) {
        self.remaining = self.catalog.cards().iter().cloned().collect();
        if self.config.shuffle {
            self.remaining.make_contiguous().shuffle(&mut self.rng);
        }
        self.called.clear();
        self.current = None;
    }

    fn arm(&mut self, timers: &mut impl Scheduler<TimerEvent>) {
        if let Some(old) = self.timer.take() {
            timers.cancel(old);
        }
        self.timer = Some(timers.schedule_repeating(self.config.interval(), TimerEvent::CantorTick));
    }

    fn disarm(&mut self, timers: &mut impl Scheduler<TimerEvent>) {
        if let Some(handle) = self.timer.take() {
            timers.cancel(handle);
        }
    }

    /// Stop calling and start over with a fresh deck.
    pub fn reset(&mut self, timers: &mut impl Scheduler<TimerEvent>) {
        self.stop(timers);
        self.phase = CantorPhase::Idle;
        self.rebuild_deck();
        log::info!("Cantor reset with {} cards", self.remaining.len());
    }

    /// Call the first card right away and arm the interval timer.
    ///
    /// # Returns
    ///
    /// * `bool` - `false` if already running or the deck is empty
    pub fn start(&mut self, timers: &mut impl Scheduler<TimerEvent>) -> bool {
        if self.is_active() {
            log::warn!("Cantor is already running");
            return false;
        }

        if self.remaining.is_empty() {
            log::warn!("Cantor has no cards left to call");
            return false;
        }

        self.phase = CantorPhase::Active;
        log::info!("Cantor started, calling every {} ms", self.config.interval_ms);

        self.call_next_card(timers);
        if self.phase == CantorPhase::Active {
            self.arm(timers);
        }
        true
    }

    pub fn stop(&mut self, timers: &mut impl Scheduler<TimerEvent>) {
        self.disarm(timers);
        if self.is_active() {
            self.phase = CantorPhase::Idle;
            log::info!("Cantor stopped");
        }
    }

    /// Cancel the timer but remember that the Cantor was running.
    pub fn pause(&mut self, timers: &mut impl Scheduler<TimerEvent>) {
        if self.phase != CantorPhase::Active {
            return;
        }

        self.disarm(timers);
        self.phase = CantorPhase::Paused;
        log::info!("Cantor paused");
    }

    /// Re-arm the timer without calling a card.
    pub fn resume(&mut self, timers: &mut impl Scheduler<TimerEvent>) {
        if self.phase != CantorPhase::Paused {
            return;
        }

        self.phase = CantorPhase::Active;
        self.arm(timers);
        log::info!("Cantor resumed");
    }

    /// Call the next card of the deck.
    ///
    /// Allowed in any phase. An exhausted deck is refilled from the called
    /// cards when configured to repeat; otherwise the Cantor stops, reports
    /// [`CantorEvent::DeckExhausted`] and finishes.
    pub fn call_next_card(&mut self, timers: &mut impl Scheduler<TimerEvent>) -> Option<Card> {
        if self.remaining.is_empty() {
            if self.config.repeat_on_exhaustion && !self.called.is_empty() {
                self.remaining = self.called.drain(..).collect();
                if self.config.shuffle {
                    self.remaining.make_contiguous().shuffle(&mut self.rng);
                }
                log::info!("Deck refilled with {} called cards", self.remaining.len());
                self.events.push_back(CantorEvent::DeckRefilled);
            } else {
                self.stop(timers);
                self.phase = CantorPhase::Finished;
                log::info!("Every card has been called");
                self.events.push_back(CantorEvent::DeckExhausted);
                return None;
            }
        }

        let card = self.remaining.pop_front()?;
        self.called.push(card.clone());
        self.current = Some(card.clone());
        log::debug!(
            "Called {} ({}/{})",
            card.name,
            self.called.len(),
            self.catalog.len()
        );

        self.events.push_back(CantorEvent::CardCalled(card.clone()));
        Some(card)
    }

    /// Handle a fired timer. Ticks from timers the Cantor no longer owns
    /// are ignored.
    pub fn handle_tick(
        &mut self,
        handle: TimerHandle,
        timers: &mut impl Scheduler<TimerEvent>,
    ) -> Option<Card> {
        if self.timer != Some(handle) || self.phase != CantorPhase::Active {
            log::debug!("Ignoring stale cantor tick");
            return None;
        }

        self.call_next_card(timers)
    }

    /// Merge `update` into the configuration.
    ///
    /// A running Cantor keeps running on the new interval, counted from now.
    pub fn update_config(
        &mut self,
        update: CantorConfigUpdate,
        timers: &mut impl Scheduler<TimerEvent>,
    ) -> Result<(), ConfigError> {
        let merged = self.config.merged(update);
        merged.validate()?;
        self.config = merged;

        log::info!(
            "Cantor configuration updated: {} ms, shuffle {}, repeat {}",
            merged.interval_ms,
            merged.shuffle,
            merged.repeat_on_exhaustion
        );

        if self.phase == CantorPhase::Active {
            self.arm(timers);
        }
        Ok(())
    }

    pub fn set_preset(
        &mut self,
        preset: CantorPreset,
        timers: &mut impl Scheduler<TimerEvent>,
    ) -> Result<(), ConfigError> {
        self.update_config(preset.into(), timers)
    }

    pub fn drain_events(&mut self) -> Vec<CantorEvent> {
        self.events.drain(..).collect()
    }

    pub fn config(&self) -> &CantorConfig {
        &self.config
    }

    pub fn phase(&self) -> CantorPhase {
        self.phase
    }

    /// Running, paused or not.
    pub fn is_active(&self) -> bool {
        matches!(self.phase, CantorPhase::Active | CantorPhase::Paused)
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.current.as_ref()
    }

    pub fn called_cards(&self) -> &[Card] {
        &self.called
    }

    pub fn remaining_cards(&self) -> Vec<Card> {
        self.remaining.iter().cloned().collect()
    }

    pub fn was_called(&self, card_id: CardId) -> bool {
        self.called.iter().any(|card| card.id == card_id)
    }

    pub fn stats(&self) -> CantorStats {
        let total = self.catalog.len();
        let progress_percent = if total == 0 {
            0.0
        } else {
            self.called.len() as f64 / total as f64 * 100.0
        };

        CantorStats {
            total,
            called_count: self.called.len(),
            remaining_count: self.remaining.len(),
            progress_percent,
            is_active: self.is_active(),
            current_card_name: self.current.as_ref().map(|card| card.name.clone()),
        }
    }

    pub fn snapshot(&self) -> CantorSnapshot {
        CantorSnapshot {
            phase: self.phase,
            config: self.config,
            remaining: self.remaining_cards(),
            called: self.called.clone(),
            current: self.current.clone(),
        }
    }

    /// Replace the Cantor's state. A snapshot taken while running comes back
    /// paused, since no timer survives a restore.
    pub fn restore(
        &mut self,
        snapshot: CantorSnapshot,
        timers: &mut impl Scheduler<TimerEvent>,
    ) -> Result<(), ConfigError> {
        snapshot.config.validate()?;
        self.disarm(timers);

        self.config = snapshot.config;
        self.remaining = snapshot.remaining.into();
        self.called = snapshot.called;
        self.current = snapshot.current;
        self.phase = match snapshot.phase {
            CantorPhase::Active => CantorPhase::Paused,
            phase => phase,
        };
        self.events.clear();

        log::info!(
            "Cantor restored ({} called, {} remaining)",
            self.called.len(),
            self.remaining.len()
        );
        Ok(())
    }
}
