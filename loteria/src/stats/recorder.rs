//! In-memory statistics sink.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

use super::models::{MIN_RECORDED_DURATION_SECS, MonthlyStats, SessionStats, UserStatistics};
use crate::{
    collaborator::{CollaboratorError, StatisticsSink},
    game::Player,
    round::RoundSummary,
};

/// Serialized form of the recorder, for external save/load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsExport {
    pub user_stats: UserStatistics,
    pub session_stats: SessionStats,
}

#[derive(Debug, Default)]
struct Inner {
    user: UserStatistics,
    session: SessionStats,
}

/// Aggregates round results into lifetime, monthly and session statistics.
///
/// Shared between the round and its readers, hence the lock.
#[derive(Debug, Default)]
pub struct StatisticsRecorder {
    inner: Mutex<Inner>,
}

fn percentage(part: u32, total: u32) -> u32 {
    if total == 0 {
        0
    } else {
        (f64::from(part) / f64::from(total) * 100.0).round() as u32
    }
}

impl StatisticsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder continuing from previously exported statistics.
    pub fn from_export(export: StatisticsExport) -> Self {
        Self {
            inner: Mutex::new(Inner {
                user: export.user_stats,
                session: export.session_stats,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, CollaboratorError> {
        self.inner
            .lock()
            .map_err(|_| CollaboratorError::Unavailable("statistics lock poisoned".to_string()))
    }

    pub fn user_stats(&self) -> Result<UserStatistics, CollaboratorError> {
        Ok(self.lock()?.user.clone())
    }

    pub fn session_stats(&self) -> Result<SessionStats, CollaboratorError> {
        Ok(self.lock()?.session.clone())
    }

    pub fn export(&self) -> Result<StatisticsExport, CollaboratorError> {
        let inner = self.lock()?;
        Ok(StatisticsExport {
            user_stats: inner.user.clone(),
            session_stats: inner.session.clone(),
        })
    }

    pub fn export_json(&self) -> Result<String, CollaboratorError> {
        serde_json::to_string_pretty(&self.export()?)
            .map_err(|err| CollaboratorError::Rejected(err.to_string()))
    }

    /// Replace the lifetime statistics with an exported copy. Session
    /// counters are kept.
    pub fn import_json(&self, json: &str) -> Result<(), CollaboratorError> {
        let export: StatisticsExport =
            serde_json::from_str(json).map_err(|err| CollaboratorError::Rejected(err.to_string()))?;
        self.lock()?.user = export.user_stats;
        log::info!("Statistics imported");
        Ok(())
    }

    pub fn reset(&self) -> Result<(), CollaboratorError> {
        *self.lock()? = Inner::default();
        log::info!("Statistics reset");
        Ok(())
    }
}

impl StatisticsSink for StatisticsRecorder {
    fn record_game_result(
        &self,
        summary: &RoundSummary,
        human: Option<&Player>,
    ) -> Result<(), CollaboratorError> {
        let human = human.ok_or_else(|| {
            CollaboratorError::Rejected(format!("round {} has no human player", summary.game_id))
        })?;

        let is_win = human.is_winner;
        let duration = if summary.duration_secs == 0 {
            log::warn!(
                "Round {} has no duration, recording {} s",
                summary.game_id,
                MIN_RECORDED_DURATION_SECS
            );
            MIN_RECORDED_DURATION_SECS
        } else {
            summary.duration_secs
        };
        let month = summary
            .end_time
            .unwrap_or_else(Utc::now)
            .format("%Y-%m")
            .to_string();

        let mut inner = self.lock()?;
        let user = &mut inner.user;
        user.total_games += 1;
        user.total_play_time += duration;

        if is_win {
            user.wins += 1;
            user.current_win_streak = user.current_win_streak.max(0) + 1;
            user.longest_win_streak = user
                .longest_win_streak
                .max(user.current_win_streak.unsigned_abs());
        } else {
            user.losses += 1;
            user.current_win_streak = user.current_win_streak.min(0) - 1;
        }

        user.win_percentage = percentage(user.wins, user.total_games);
        user.average_game_time =
            (user.total_play_time as f64 / f64::from(user.total_games)).round() as u64;

        let monthly = user
            .monthly_stats
            .entry(month.clone())
            .or_insert_with(|| MonthlyStats::new(&month));
        monthly.games_played += 1;
        monthly.average_game_time = ((monthly.average_game_time
            * u64::from(monthly.games_played - 1)
            + duration) as f64
            / f64::from(monthly.games_played))
        .round() as u64;
        if is_win {
            monthly.wins += 1;
        } else {
            monthly.losses += 1;
        }
        monthly.win_percentage = percentage(monthly.wins, monthly.games_played);

        user.last_updated = Utc::now();
        let streak = user.current_win_streak;

        inner.session.games_this_session += 1;
        if is_win {
            inner.session.wins_this_session += 1;
        }

        log::info!(
            "Statistics updated: {} in {} s, streak {}",
            if is_win { "win" } else { "loss" },
            duration,
            streak
        );
        Ok(())
    }
}
