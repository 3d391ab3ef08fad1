//! Adaptive bot difficulty.
//!
//! Reads the human's lifetime statistics and their latest rounds, rates the
//! player's skill and moves bots towards the difficulty that keeps rounds
//! competitive. Adjustments are capped per session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::manager::BotManager;
use crate::{
    game::{Difficulty, Player, PlayerId},
    round::RoundSummary,
    stats::UserStatistics,
};

/// Rounds looked at when measuring streaks
pub const RECENT_ROUNDS: usize = 10;

/// Skill range of each player tier, on a 0 to 100 scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillLevelBounds {
    pub beginner: (f64, f64),
    pub intermediate: (f64, f64),
    pub advanced: (f64, f64),
}

impl Default for SkillLevelBounds {
    fn default() -> Self {
        Self {
            beginner: (0.0, 30.0),
            intermediate: (30.0, 70.0),
            advanced: (70.0, 100.0),
        }
    }
}

/// Tuning of the adaptive difficulty
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveSettings {
    /// Games the player must finish before any adjustment
    pub min_games_before_adjustment: u32,

    /// Minimum confidence for an adjustment to apply
    pub adjustment_threshold: f64,

    /// Bot adjustments allowed until the session is reset
    pub max_adjustments_per_session: u32,

    pub skill_level_bounds: SkillLevelBounds,
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self {
            min_games_before_adjustment: 3,
            adjustment_threshold: 0.15,
            max_adjustments_per_session: 2,
            skill_level_bounds: SkillLevelBounds::default(),
        }
    }
}

/// How the human has been playing
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    /// Lifetime wins over games, 0 to 1
    pub win_rate: f64,

    /// Seconds
    pub average_game_time: u64,

    /// Consecutive human wins among the latest rounds
    pub recent_win_streak: u32,

    /// Consecutive bot wins among the latest rounds
    pub recent_loss_streak: u32,

    pub games_played: u32,

    /// 0 to 100
    pub skill_level: f64,
}

/// One bot moved to another difficulty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyAdjustment {
    pub bot_id: PlayerId,
    pub old_difficulty: Difficulty,
    pub new_difficulty: Difficulty,
    pub reason: &'static str,
    pub confidence: f64,
}

/// Counters of the adaptive difficulty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdaptiveStats {
    pub total_adjustments: usize,
    pub session_adjustments: u32,
    pub last_analysis: Option<DateTime<Utc>>,
    pub settings: AdaptiveSettings,
}

/// Tracks the adjustments made to the bots of one player.
#[derive(Debug, Default)]
pub struct AdaptiveDifficulty {
    settings: AdaptiveSettings,

    history: Vec<DifficultyAdjustment>,

    session_adjustments: u32,

    last_analysis: Option<DateTime<Utc>>,
}

impl AdaptiveDifficulty {
    pub fn new(settings: AdaptiveSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &AdaptiveSettings {
        &self.settings
    }

    /// Rate the player from their lifetime statistics and latest rounds.
    ///
    /// # Arguments
    ///
    /// * `stats` - Lifetime statistics of the human
    /// * `recent` - Latest finished rounds, newest first
    ///
    /// # Returns
    ///
    /// * `PerformanceMetrics` - Win rate, streaks and a 0 to 100 skill level
    pub fn analyze_player_performance(
        &mut self,
        stats: &UserStatistics,
        recent: &[RoundSummary],
    ) -> PerformanceMetrics {
        self.last_analysis = Some(Utc::now());
        analyze_player_performance(stats, recent)
    }

    /// Whether the bots are far enough from the player's level to adjust.
    pub fn should_adjust_difficulty(&self, metrics: &PerformanceMetrics, bots: &[Player]) -> bool {
        if metrics.games_played < self.settings.min_games_before_adjustment {
            return false;
        }
        if self.session_adjustments >= self.settings.max_adjustments_per_session {
            log::debug!("Adjustment limit reached for this session");
            return false;
        }

        let (confidence, reason) = mismatch(metrics, bots);
        log::debug!("Difficulty mismatch: {} ({:.2})", reason, confidence);
        confidence >= self.settings.adjustment_threshold
    }

    /// The adjustment `bot` should get, if any.
    pub fn plan_adjustment(
        &self,
        metrics: &PerformanceMetrics,
        bot: &Player,
    ) -> Option<DifficultyAdjustment> {
        let old_difficulty = bot.bot_profile()?.difficulty;
        let new_difficulty = recommended_difficulty(metrics);
        if new_difficulty == old_difficulty {
            return None;
        }

        let raise = metrics.win_rate > 0.75 && metrics.recent_win_streak >= 3;
        let lower = metrics.win_rate < 0.25 && metrics.recent_loss_streak >= 3;
        let balance = (metrics.win_rate - 0.5).abs();

        let (reason, confidence) = if raise {
            ("Player dominating, raising difficulty", balance.min(0.9))
        } else if lower {
            ("Player struggling, lowering difficulty", balance.min(0.9))
        } else if metrics.skill_level > 70.0 && old_difficulty == Difficulty::Easy {
            let confidence = (metrics.skill_level - 70.0) / 30.0 * 0.8;
            ("Skill too high for easy bots", confidence)
        } else if metrics.skill_level < 30.0 && old_difficulty == Difficulty::Hard {
            let confidence = (30.0 - metrics.skill_level) / 30.0 * 0.8;
            ("Skill too low for hard bots", confidence)
        } else if balance > 0.2 {
            ("Balancing for competitive play", balance * 0.6)
        } else {
            return None;
        };

        (confidence >= self.settings.adjustment_threshold).then(|| DifficultyAdjustment {
            bot_id: bot.id.clone(),
            old_difficulty,
            new_difficulty,
            reason,
            confidence,
        })
    }

    /// Apply the planned adjustment of every bot, up to the session limit.
    ///
    /// # Returns
    ///
    /// * `Vec<DifficultyAdjustment>` - Adjustments applied, in bot order
    pub fn adjust_bots_difficulty(
        &mut self,
        metrics: &PerformanceMetrics,
        bots: &mut [Player],
        manager: &BotManager,
    ) -> Vec<DifficultyAdjustment> {
        let mut applied = Vec::new();

        for bot in bots.iter_mut().filter(|player| player.is_bot()) {
            if self.session_adjustments >= self.settings.max_adjustments_per_session {
                break;
            }
            let Some(adjustment) = self.plan_adjustment(metrics, bot) else {
                continue;
            };
            if !manager.update_bot_difficulty(bot, adjustment.new_difficulty) {
                continue;
            }

            log::info!(
                "Adjusted {} from {} to {}: {}",
                bot.name,
                adjustment.old_difficulty,
                adjustment.new_difficulty,
                adjustment.reason
            );
            self.history.push(adjustment.clone());
            self.session_adjustments += 1;
            applied.push(adjustment);
        }

        applied
    }

    /// Analyze the player and adjust the bots when they are mismatched.
    ///
    /// # Arguments
    ///
    /// * `stats` - Lifetime statistics of the human
    /// * `recent` - Latest finished rounds, newest first
    /// * `bots` - Players of the round; humans are skipped
    /// * `manager` - Applies the new difficulty presets
    ///
    /// # Returns
    ///
    /// * `Vec<DifficultyAdjustment>` - Adjustments applied, empty when none
    ///   was needed or allowed
    pub fn auto_adjust_difficulty(
        &mut self,
        stats: &UserStatistics,
        recent: &[RoundSummary],
        bots: &mut [Player],
        manager: &BotManager,
    ) -> Vec<DifficultyAdjustment> {
        let metrics = self.analyze_player_performance(stats, recent);
        if !self.should_adjust_difficulty(&metrics, bots) {
            return Vec::new();
        }
        self.adjust_bots_difficulty(&metrics, bots, manager)
    }

    pub fn history(&self) -> &[DifficultyAdjustment] {
        &self.history
    }

    /// Difficulty `bot_id` was last moved to.
    pub fn current_difficulty(&self, bot_id: &PlayerId) -> Option<Difficulty> {
        self.history
            .iter()
            .rev()
            .find(|adjustment| &adjustment.bot_id == bot_id)
            .map(|adjustment| adjustment.new_difficulty)
    }

    /// Allow a new batch of adjustments.
    pub fn reset_session_adjustments(&mut self) {
        self.session_adjustments = 0;
    }

    pub fn stats(&self) -> AdaptiveStats {
        AdaptiveStats {
            total_adjustments: self.history.len(),
            session_adjustments: self.session_adjustments,
            last_analysis: self.last_analysis,
            settings: self.settings,
        }
    }
}

/// Rate the player from their lifetime statistics and latest rounds.
///
/// Rounds without a winner break both streaks.
pub fn analyze_player_performance(
    stats: &UserStatistics,
    recent: &[RoundSummary],
) -> PerformanceMetrics {
    let win_rate = if stats.total_games > 0 {
        f64::from(stats.wins) / f64::from(stats.total_games)
    } else {
        0.0
    };

    let recent = &recent[..recent.len().min(RECENT_ROUNDS)];
    let recent_win_streak = recent.iter().take_while(|round| round.human_won).count() as u32;
    let recent_loss_streak = recent
        .iter()
        .take_while(|round| round.winner.is_some() && !round.human_won)
        .count() as u32;
    let recent_win_rate = if recent.is_empty() {
        0.0
    } else {
        recent.iter().filter(|round| round.human_won).count() as f64 / recent.len() as f64
    };

    let win_percentage = win_rate * 100.0;
    let mut skill = 50.0 + (win_percentage - 50.0) * 0.8;
    if stats.average_game_time > 0 {
        skill += ((300.0 - stats.average_game_time as f64) / 20.0).clamp(-15.0, 15.0);
    }
    let consistency = 100.0 - (win_percentage - recent_win_rate * 100.0).abs();
    skill += (consistency - 50.0) * 0.2;
    skill += (f64::from(stats.total_games) / 5.0).min(20.0);

    PerformanceMetrics {
        win_rate,
        average_game_time: stats.average_game_time,
        recent_win_streak,
        recent_loss_streak,
        games_played: stats.total_games,
        skill_level: skill.clamp(0.0, 100.0),
    }
}

/// Difficulty that suits the player best.
pub fn recommended_difficulty(metrics: &PerformanceMetrics) -> Difficulty {
    let win_rate = metrics.win_rate;

    if win_rate > 0.8 && metrics.recent_win_streak >= 5 {
        Difficulty::Hard
    } else if win_rate < 0.2 && metrics.recent_loss_streak >= 5 {
        Difficulty::Easy
    } else if metrics.skill_level >= 70.0 {
        if win_rate > 0.6 {
            Difficulty::Hard
        } else {
            Difficulty::Medium
        }
    } else if metrics.skill_level <= 30.0 {
        if win_rate < 0.4 {
            Difficulty::Easy
        } else {
            Difficulty::Medium
        }
    } else if win_rate > 0.65 {
        Difficulty::Hard
    } else if win_rate < 0.35 {
        Difficulty::Easy
    } else {
        Difficulty::Medium
    }
}

/// The player wins often and keeps winning.
pub fn is_ready_for_challenge(metrics: &PerformanceMetrics) -> bool {
    metrics.win_rate > 0.7 && metrics.recent_win_streak >= 3 && metrics.skill_level > 60.0
}

/// The player loses often and keeps losing.
pub fn needs_help(metrics: &PerformanceMetrics) -> bool {
    metrics.win_rate < 0.3 && metrics.recent_loss_streak >= 3 && metrics.skill_level < 40.0
}

/// How far the bots are from the player's level, with the main cause.
fn mismatch(metrics: &PerformanceMetrics, bots: &[Player]) -> (f64, &'static str) {
    let target = recommended_difficulty(metrics);
    let settled = bots
        .iter()
        .filter_map(Player::bot_profile)
        .all(|profile| profile.difficulty == target);
    if settled {
        return (0.0, "bots already match the player");
    }

    let streak = metrics.recent_win_streak.max(metrics.recent_loss_streak);
    let confidence = ((metrics.win_rate - 0.5).abs() + f64::from(streak) / 10.0 * 0.3).min(0.9);

    if metrics.win_rate > 0.7 {
        (confidence, "very high win rate")
    } else if metrics.win_rate < 0.3 {
        (confidence, "very low win rate")
    } else if metrics.recent_win_streak >= 4 {
        (confidence, "long win streak")
    } else if metrics.recent_loss_streak >= 4 {
        (confidence, "long loss streak")
    } else {
        (confidence * 0.5, "preventive adjustment")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Catalog, HUMAN_PLAYER_ID, RoundStatus};
    use rand::{SeedableRng, rngs::StdRng};
    use uuid::Uuid;

    fn round(winner: Option<&str>) -> RoundSummary {
        RoundSummary {
            game_id: Uuid::new_v4(),
            status: RoundStatus::Finished,
            winner: winner.map(PlayerId::new),
            winner_name: None,
            winning_pattern: None,
            human_won: winner == Some(HUMAN_PLAYER_ID),
            player_count: 3,
            cards_called: 12,
            start_time: None,
            end_time: None,
            duration_secs: 120,
        }
    }

    fn winning_player() -> (UserStatistics, Vec<RoundSummary>) {
        let stats = UserStatistics {
            total_games: 10,
            wins: 9,
            losses: 1,
            win_percentage: 90,
            average_game_time: 120,
            ..UserStatistics::default()
        };
        (stats, vec![round(Some(HUMAN_PLAYER_ID)); 6])
    }

    fn easy_bots(manager: &mut BotManager) -> Vec<Player> {
        let catalog = Catalog::standard();
        vec![
            manager.spawn_bot(PlayerId::bot(1), Difficulty::Easy, Some(0), &catalog),
            manager.spawn_bot(PlayerId::bot(2), Difficulty::Easy, Some(1), &catalog),
        ]
    }

    fn difficulties(bots: &[Player]) -> Vec<Difficulty> {
        bots.iter()
            .filter_map(|bot| bot.bot_profile().map(|profile| profile.difficulty))
            .collect()
    }

    #[test]
    fn test_no_adjustment_before_enough_games() {
        let mut manager = BotManager::new(StdRng::seed_from_u64(1));
        let mut bots = easy_bots(&mut manager);
        let (mut stats, recent) = winning_player();
        stats.total_games = 2;
        stats.wins = 2;

        let mut adaptive = AdaptiveDifficulty::default();
        let adjustments =
            adaptive.auto_adjust_difficulty(&stats, &recent[..2], &mut bots, &manager);

        assert!(adjustments.is_empty());
        assert_eq!(difficulties(&bots), vec![Difficulty::Easy, Difficulty::Easy]);
        assert!(adaptive.stats().last_analysis.is_some());
    }

    #[test]
    fn test_win_streak_makes_bots_harder() {
        let mut manager = BotManager::new(StdRng::seed_from_u64(2));
        let mut bots = easy_bots(&mut manager);
        let (stats, recent) = winning_player();

        let metrics = analyze_player_performance(&stats, &recent);
        assert_eq!(metrics.recent_win_streak, 6);
        assert_eq!(metrics.recent_loss_streak, 0);
        assert_eq!(metrics.skill_level, 100.0);
        assert_eq!(recommended_difficulty(&metrics), Difficulty::Hard);
        assert!(is_ready_for_challenge(&metrics));

        let mut adaptive = AdaptiveDifficulty::default();
        let adjustments = adaptive.auto_adjust_difficulty(&stats, &recent, &mut bots, &manager);

        assert_eq!(adjustments.len(), 2);
        assert!(adjustments.iter().all(|adjustment| {
            adjustment.old_difficulty == Difficulty::Easy
                && adjustment.new_difficulty == Difficulty::Hard
        }));
        assert_eq!(difficulties(&bots), vec![Difficulty::Hard, Difficulty::Hard]);
        assert_eq!(adaptive.history().len(), 2);
        assert_eq!(
            adaptive.current_difficulty(&PlayerId::bot(2)),
            Some(Difficulty::Hard)
        );
    }

    #[test]
    fn test_session_cap_limits_adjustments() {
        let mut manager = BotManager::new(StdRng::seed_from_u64(3));
        let mut bots = easy_bots(&mut manager);
        let (stats, recent) = winning_player();
        let mut adaptive = AdaptiveDifficulty::new(AdaptiveSettings {
            max_adjustments_per_session: 1,
            ..AdaptiveSettings::default()
        });

        let first = adaptive.auto_adjust_difficulty(&stats, &recent, &mut bots, &manager);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].bot_id, PlayerId::bot(1));

        let second = adaptive.auto_adjust_difficulty(&stats, &recent, &mut bots, &manager);
        assert!(second.is_empty());
        assert_eq!(difficulties(&bots), vec![Difficulty::Hard, Difficulty::Easy]);

        adaptive.reset_session_adjustments();
        let third = adaptive.auto_adjust_difficulty(&stats, &recent, &mut bots, &manager);
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].bot_id, PlayerId::bot(2));
        assert_eq!(adaptive.stats().total_adjustments, 2);
    }

    #[test]
    fn test_losing_streak_and_draws() {
        let stats = UserStatistics {
            total_games: 12,
            wins: 1,
            losses: 11,
            win_percentage: 8,
            ..UserStatistics::default()
        };
        let mut recent = vec![round(Some("bot_1")); 5];
        recent.push(round(None));
        recent.push(round(Some("bot_2")));

        let metrics = analyze_player_performance(&stats, &recent);
        assert_eq!(metrics.recent_loss_streak, 5);
        assert_eq!(recommended_difficulty(&metrics), Difficulty::Easy);
        assert!(needs_help(&metrics));

        recent.insert(0, round(None));
        let metrics = analyze_player_performance(&stats, &recent);
        assert_eq!(metrics.recent_loss_streak, 0);
    }

    #[test]
    fn test_settled_bots_are_left_alone() {
        let mut manager = BotManager::new(StdRng::seed_from_u64(4));
        let mut bots = easy_bots(&mut manager);
        for bot in &mut bots {
            manager.update_bot_difficulty(bot, Difficulty::Hard);
        }
        let (stats, recent) = winning_player();

        let adaptive = AdaptiveDifficulty::default();
        let metrics = analyze_player_performance(&stats, &recent);
        assert!(!adaptive.should_adjust_difficulty(&metrics, &bots));
    }
}
