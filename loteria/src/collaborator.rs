//! Interfaces of the side-effecting services a round reports to.
//!
//! A round calls these fire-and-forget: errors are logged at the call site
//! and never change the round.

use thiserror::Error;

use crate::{
    game::{Card, CelebrationStyle, Player},
    round::RoundSummary,
};

/// Collaborator errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// The service cannot be reached or is in a broken state
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    /// The service refused the data it was given
    #[error("Collaborator rejected input: {0}")]
    Rejected(String),
}

/// Receives the outcome of every finished round.
pub trait StatisticsSink: Send + Sync {
    /// Record a finished round from the human player's point of view.
    ///
    /// # Arguments
    ///
    /// * `summary` - The finished round
    /// * `human` - The human player, `None` if the round had none
    fn record_game_result(
        &self,
        summary: &RoundSummary,
        human: Option<&Player>,
    ) -> Result<(), CollaboratorError>;
}

/// Shows a bot's reaction after it marks a card.
pub trait Celebrator: Send + Sync {
    fn celebrate(&self, bot: &Player, card: &Card) -> Result<(), CollaboratorError>;
}

/// Celebrates by logging, phrased after the bot's celebration style.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCelebrator;

impl Celebrator for LogCelebrator {
    fn celebrate(&self, bot: &Player, card: &Card) -> Result<(), CollaboratorError> {
        let style = bot
            .bot_profile()
            .map(|profile| profile.personality.celebration_style)
            .ok_or_else(|| CollaboratorError::Rejected(format!("{} is not a bot", bot.id)))?;

        match style {
            CelebrationStyle::Subtle => log::info!("{} quietly marks {}", bot.name, card.name),
            CelebrationStyle::Animated => log::info!("{} marks {} with a flourish", bot.name, card.name),
            CelebrationStyle::Enthusiastic => {
                log::info!("{} shouts and slaps {} on the board!", bot.name, card.name)
            }
        }
        Ok(())
    }
}
