//! Bot roster management.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use std::collections::HashSet;

use super::models::{BOT_NAMES, DifficultyParams, personality, personality_count};
use crate::game::{BOARD_SIZE, Catalog, Difficulty, Player, PlayerId};

/// Creates the bots of a round and keeps their names unique.
#[derive(Debug)]
pub struct BotManager {
    /// Names handed out since the last reset
    used_names: HashSet<String>,

    rng: StdRng,
}

impl Default for BotManager {
    fn default() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl BotManager {
    pub fn new(rng: StdRng) -> Self {
        Self {
            used_names: HashSet::new(),
            rng,
        }
    }

    /// Create one bot with a fresh board.
    ///
    /// # Arguments
    ///
    /// * `id` - Player id of the bot
    /// * `difficulty` - Difficulty preset
    /// * `personality_index` - Personality preset, random if `None`
    /// * `catalog` - Catalog the board is drawn from
    ///
    /// # Returns
    ///
    /// * `Player` - The new bot
    pub fn spawn_bot(
        &mut self,
        id: PlayerId,
        difficulty: Difficulty,
        personality_index: Option<usize>,
        catalog: &Catalog,
    ) -> Player {
        let index =
            personality_index.unwrap_or_else(|| self.rng.random_range(0..personality_count()));
        let personality = personality(index);
        let name = self.unique_name();
        let profile = DifficultyParams::from_difficulty(difficulty).profile(difficulty, personality);
        let board = catalog.random_cards(BOARD_SIZE, &mut self.rng);

        log::info!(
            "Spawned bot {} ({}, {}, {})",
            id,
            name,
            profile.personality.name,
            difficulty
        );

        Player::bot(id, &name, board, profile)
    }

    /// Create the bots of a round.
    ///
    /// Bots get ids `bot_1..` and personalities by position. With more than
    /// one bot the first plays Easy, with more than two the last plays Hard;
    /// the rest use `base`.
    pub fn spawn_bots(&mut self, count: usize, base: Difficulty, catalog: &Catalog) -> Vec<Player> {
        (0..count)
            .map(|i| {
                let difficulty = if i == 0 && count > 1 {
                    Difficulty::Easy
                } else if i == count - 1 && count > 2 {
                    Difficulty::Hard
                } else {
                    base
                };
                self.spawn_bot(PlayerId::bot(i + 1), difficulty, Some(i), catalog)
            })
            .collect()
    }

    /// Give a bot a fresh board and clear its marks.
    pub fn reset_bot(&mut self, bot: &mut Player, catalog: &Catalog) -> bool {
        if !bot.is_bot() {
            return false;
        }

        bot.board = catalog.random_cards(BOARD_SIZE, &mut self.rng);
        bot.clear_marks();
        log::info!("Bot {} reset for a new round", bot.name);
        true
    }

    /// Switch a bot to another difficulty preset, keeping its personality.
    pub fn update_bot_difficulty(&self, bot: &mut Player, difficulty: Difficulty) -> bool {
        let name = bot.name.clone();
        let Some(profile) = bot.bot_profile_mut() else {
            return false;
        };

        let params = DifficultyParams::from_difficulty(difficulty);
        profile.difficulty = difficulty;
        profile.reaction_time_range = params.reaction_time_range;
        profile.error_rate = params.error_rate;

        log::info!("Bot {} difficulty set to {}", name, difficulty);
        true
    }

    /// Forget the names handed out so far.
    pub fn reset(&mut self) {
        self.used_names.clear();
    }

    fn unique_name(&mut self) -> String {
        let available: Vec<&str> = BOT_NAMES
            .iter()
            .copied()
            .filter(|name| !self.used_names.contains(*name))
            .collect();

        let name = match available.choose(&mut self.rng) {
            Some(name) => name.to_string(),
            None => format!("Bot {}", self.used_names.len() + 1),
        };
        self.used_names.insert(name.clone());
        name
    }
}
