//! Simulator settings read from `LOTERIA_*` environment variables.

use loteria::{CantorConfig, CantorPreset, Catalog, Difficulty, GameConfig, Round};
use std::{fmt::Display, str::FromStr, sync::Arc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Simulator settings
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Name of the human player
    pub player_name: String,

    /// Number of bot opponents
    pub bots: usize,

    /// Base bot difficulty
    pub difficulty: Difficulty,

    /// Card calling cadence
    pub preset: CantorPreset,

    /// Number of rounds to play
    pub rounds: u32,

    /// Mark the human's cards automatically
    pub auto_mark: bool,

    /// Seed for reproducible rounds
    pub seed: Option<u64>,

    /// Move bots towards the player's level between rounds
    pub adaptive: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            player_name: "Jugador".to_string(),
            bots: 2,
            difficulty: Difficulty::Easy,
            preset: CantorPreset::Rapid,
            rounds: 1,
            auto_mark: false,
            seed: None,
            adaptive: false,
        }
    }
}

impl SimConfig {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load settings through `lookup`, falling back to defaults for unset
    /// variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            player_name: lookup("LOTERIA_PLAYER_NAME").unwrap_or(defaults.player_name),
            bots: parse_env_or(&lookup, "LOTERIA_BOTS", defaults.bots)?,
            difficulty: parse_env_or(&lookup, "LOTERIA_DIFFICULTY", defaults.difficulty)?,
            preset: parse_env_or(&lookup, "LOTERIA_PRESET", defaults.preset)?,
            rounds: parse_env_or(&lookup, "LOTERIA_ROUNDS", defaults.rounds)?,
            auto_mark: parse_env_or(&lookup, "LOTERIA_AUTO_MARK", defaults.auto_mark)?,
            seed: match lookup("LOTERIA_SEED") {
                Some(value) => Some(parse_value("LOTERIA_SEED", &value)?),
                None => defaults.seed,
            },
            adaptive: parse_env_or(&lookup, "LOTERIA_ADAPTIVE", defaults.adaptive)?,
        })
    }

    /// Round configuration for these settings
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            player_name: self.player_name.clone(),
            bot_count: self.bots,
            bot_difficulty: self.difficulty,
            cantor: CantorConfig::from(self.preset),
            auto_start_cantor: true,
        }
    }

    /// Build the round every simulated game is played on.
    ///
    /// With a seed, the whole session is reproducible: later games keep
    /// drawing from the same generators.
    pub fn round(&self, catalog: Arc<Catalog>) -> Result<Round, loteria::ConfigError> {
        match self.seed {
            Some(seed) => Round::with_seed(self.game_config(), catalog, seed),
            None => Round::new(self.game_config(), catalog),
        }
    }
}

fn parse_env_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(var) {
        Some(value) => parse_value(var, &value),
        None => Ok(default),
    }
}

fn parse_value<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = SimConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_reads_every_variable() {
        let config = SimConfig::from_lookup(lookup(&[
            ("LOTERIA_PLAYER_NAME", "Lupita"),
            ("LOTERIA_BOTS", "3"),
            ("LOTERIA_DIFFICULTY", "hard"),
            ("LOTERIA_PRESET", "slow"),
            ("LOTERIA_ROUNDS", "5"),
            ("LOTERIA_AUTO_MARK", "true"),
            ("LOTERIA_SEED", " 99 "),
            ("LOTERIA_ADAPTIVE", "true"),
        ]))
        .unwrap();

        assert_eq!(config.player_name, "Lupita");
        assert_eq!(config.bots, 3);
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.preset, CantorPreset::Slow);
        assert_eq!(config.rounds, 5);
        assert!(config.auto_mark);
        assert_eq!(config.seed, Some(99));
        assert!(config.adaptive);
    }

    #[test]
    fn test_invalid_value_names_the_variable() {
        let err = SimConfig::from_lookup(lookup(&[("LOTERIA_PRESET", "turbo")])).unwrap_err();
        let ConfigError::Invalid { var, .. } = err;
        assert_eq!(var, "LOTERIA_PRESET");

        let err = SimConfig::from_lookup(lookup(&[("LOTERIA_BOTS", "many")])).unwrap_err();
        assert!(err.to_string().starts_with("invalid value for LOTERIA_BOTS"));
    }

    #[test]
    fn test_game_config_follows_preset() {
        let config = SimConfig {
            preset: CantorPreset::Fast,
            ..SimConfig::default()
        };
        let game = config.game_config();

        assert_eq!(game.cantor.interval_ms, 3000);
        assert_eq!(game.bot_count, 2);
        assert!(game.validate().is_ok());
    }

    #[test]
    fn test_largest_seed_builds_a_round() {
        let config = SimConfig {
            rounds: 3,
            seed: Some(u64::MAX),
            ..SimConfig::default()
        };
        let catalog = Arc::new(Catalog::standard());

        let mut first = config.round(catalog.clone()).unwrap();
        let mut second = config.round(catalog).unwrap();
        first.start_new_game("");
        second.start_new_game("");
        assert_eq!(first.human().unwrap().board, second.human().unwrap().board);

        let board = first.human().unwrap().board.clone();
        first.start_new_game("");
        assert_ne!(first.human().unwrap().board, board);
    }
}
