//! Round actor implementation with async message handling.

use std::collections::HashMap;
use tokio::{
    sync::{mpsc, oneshot},
    time::{Duration, Instant, sleep_until},
};
use uuid::Uuid;

use super::{
    events::RoundEvent,
    messages::{RoundMessage, RoundResponse},
    orchestrator::Round,
    state::{MarkOutcome, RoundSnapshot},
};
use crate::{
    bot::DifficultyAdjustment,
    cantor::{CantorPreset, CantorStats},
    game::{Card, CardId, PlayerId, RoundStatus},
    stats::UserStatistics,
};

/// How long the actor sleeps when no timer is pending.
const IDLE_WAKE: Duration = Duration::from_secs(3600);

/// Round actor handle for sending messages
#[derive(Clone, Debug)]
pub struct RoundHandle {
    sender: mpsc::Sender<RoundMessage>,
}

impl RoundHandle {
    pub fn new(sender: mpsc::Sender<RoundMessage>) -> Self {
        Self { sender }
    }

    /// Send a message to the round
    pub async fn send(&self, message: RoundMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Round is closed".to_string())
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> RoundMessage,
    ) -> Result<T, String> {
        let (response, receiver) = oneshot::channel();
        self.send(message(response)).await?;
        receiver
            .await
            .map_err(|_| "Round dropped the request".to_string())
    }

    pub async fn start_game(&self, player_name: &str) -> Result<Uuid, String> {
        let player_name = player_name.to_string();
        self.request(|response| RoundMessage::StartGame {
            player_name,
            response,
        })
        .await
    }

    pub async fn start_cantor(&self) -> Result<bool, String> {
        self.request(|response| RoundMessage::StartCantor { response })
            .await
    }

    pub async fn call_next_card(&self) -> Result<Option<Card>, String> {
        self.request(|response| RoundMessage::CallNextCard { response })
            .await
    }

    pub async fn mark_card(
        &self,
        player_id: PlayerId,
        card_id: CardId,
    ) -> Result<MarkOutcome, String> {
        self.request(|response| RoundMessage::MarkCard {
            player_id,
            card_id,
            response,
        })
        .await
    }

    pub async fn toggle_pause(&self) -> Result<RoundStatus, String> {
        self.request(|response| RoundMessage::TogglePause { response })
            .await
    }

    pub async fn reset(&self) -> Result<RoundResponse, String> {
        self.request(|response| RoundMessage::Reset { response })
            .await
    }

    pub async fn set_preset(&self, preset: CantorPreset) -> Result<RoundResponse, String> {
        self.request(|response| RoundMessage::SetPreset { preset, response })
            .await
    }

    pub async fn snapshot(&self) -> Result<RoundSnapshot, String> {
        self.request(|response| RoundMessage::GetSnapshot { response })
            .await
    }

    pub async fn cantor_stats(&self) -> Result<CantorStats, String> {
        self.request(|response| RoundMessage::GetCantorStats { response })
            .await
    }

    /// Adjust the bots to the human's lifetime statistics.
    pub async fn adapt_difficulty(
        &self,
        stats: UserStatistics,
    ) -> Result<Vec<DifficultyAdjustment>, String> {
        self.request(|response| RoundMessage::AdaptDifficulty {
            stats: Box::new(stats),
            response,
        })
        .await
    }

    /// Subscribe to round events.
    ///
    /// # Arguments
    ///
    /// * `subscriber_id` - Id to unsubscribe with later
    /// * `capacity` - Events buffered before new ones are dropped
    pub async fn subscribe(
        &self,
        subscriber_id: u64,
        capacity: usize,
    ) -> Result<mpsc::Receiver<RoundEvent>, String> {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        self.send(RoundMessage::Subscribe {
            subscriber_id,
            sender,
        })
        .await?;
        Ok(receiver)
    }

    pub async fn unsubscribe(&self, subscriber_id: u64) -> Result<(), String> {
        self.send(RoundMessage::Unsubscribe { subscriber_id })
            .await
    }

    pub async fn close(&self) -> Result<RoundResponse, String> {
        self.request(|response| RoundMessage::Close { response })
            .await
    }
}

/// Round actor driving a single [`Round`] in real time
pub struct RoundActor {
    round: Round,

    /// Message inbox
    inbox: mpsc::Receiver<RoundMessage>,

    /// Instant at which the round's virtual clock read zero
    epoch: Instant,

    /// Subscribers for round events
    subscribers: HashMap<u64, mpsc::Sender<RoundEvent>>,

    /// Is the actor closed
    is_closed: bool,
}

impl RoundActor {
    /// Create a new round actor
    ///
    /// # Arguments
    ///
    /// * `round` - Round to drive
    ///
    /// # Returns
    ///
    /// * `(RoundActor, RoundHandle)` - Actor and handle for sending messages
    pub fn new(round: Round) -> (Self, RoundHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let now = Instant::now();
        let epoch = now.checked_sub(round.now()).unwrap_or(now);

        let actor = Self {
            round,
            inbox,
            epoch,
            subscribers: HashMap::new(),
            is_closed: false,
        };

        (actor, RoundHandle::new(sender))
    }

    /// Run the round actor event loop
    pub async fn run(mut self) {
        log::info!("Round actor starting");

        loop {
            let wake = match self.round.next_deadline() {
                Some(deadline) => self.epoch + deadline,
                None => Instant::now() + IDLE_WAKE,
            };

            tokio::select! {
                message = self.inbox.recv() => {
                    let Some(message) = message else {
                        log::debug!("Every round handle dropped");
                        break;
                    };
                    self.sync_clock();
                    self.handle_message(message);
                }

                _ = sleep_until(wake) => {
                    self.sync_clock();
                }
            }

            self.notify_subscribers();
            if self.is_closed {
                break;
            }
        }

        log::info!("Round actor closed");
    }

    /// Fire every round timer that came due in real time.
    fn sync_clock(&mut self) {
        self.round.advance_to(self.epoch.elapsed());
    }

    fn handle_message(&mut self, message: RoundMessage) {
        match message {
            RoundMessage::StartGame {
                player_name,
                response,
            } => {
                let game_id = self.round.start_new_game(&player_name);
                let _ = response.send(game_id);
            }

            RoundMessage::StartCantor { response } => {
                let _ = response.send(self.round.start_cantor());
            }

            RoundMessage::CallNextCard { response } => {
                let _ = response.send(self.round.call_next_card());
            }

            RoundMessage::MarkCard {
                player_id,
                card_id,
                response,
            } => {
                let _ = response.send(self.round.mark_card(&player_id, card_id));
            }

            RoundMessage::TogglePause { response } => {
                let _ = response.send(self.round.toggle_pause());
            }

            RoundMessage::Reset { response } => {
                self.round.reset_game();
                let _ = response.send(RoundResponse::Success);
            }

            RoundMessage::SetPreset { preset, response } => {
                let result = match self.round.set_cantor_preset(preset) {
                    Ok(()) => RoundResponse::Success,
                    Err(err) => RoundResponse::Error(err.to_string()),
                };
                let _ = response.send(result);
            }

            RoundMessage::GetSnapshot { response } => {
                let _ = response.send(self.round.snapshot());
            }

            RoundMessage::GetCantorStats { response } => {
                let _ = response.send(self.round.cantor_stats());
            }

            RoundMessage::AdaptDifficulty { stats, response } => {
                let _ = response.send(self.round.adapt_bot_difficulty(&stats));
            }

            RoundMessage::Subscribe {
                subscriber_id,
                sender,
            } => {
                self.subscribers.insert(subscriber_id, sender);
                log::debug!("Subscriber {} registered", subscriber_id);
            }

            RoundMessage::Unsubscribe { subscriber_id } => {
                self.subscribers.remove(&subscriber_id);
                log::debug!("Subscriber {} removed", subscriber_id);
            }

            RoundMessage::Close { response } => {
                self.round.stop_cantor();
                self.is_closed = true;
                let _ = response.send(RoundResponse::Success);
            }
        }
    }

    /// Broadcast drained round events to all subscribers
    fn notify_subscribers(&mut self) {
        let events = self.round.drain_events();
        if events.is_empty() {
            return;
        }

        self.subscribers.retain(|subscriber_id, sender| {
            for event in &events {
                match sender.try_send(event.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        log::warn!(
                            "Subscriber {} channel full, dropping event",
                            subscriber_id
                        );
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        log::debug!("Subscriber {} disconnected, removing", subscriber_id);
                        return false;
                    }
                }
            }
            true
        });
    }
}
