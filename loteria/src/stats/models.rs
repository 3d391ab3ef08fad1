//! Statistics data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rounds shorter than this are recorded with this duration.
pub const MIN_RECORDED_DURATION_SECS: u64 = 30;

/// Lifetime statistics of the human player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStatistics {
    pub total_games: u32,

    pub wins: u32,

    pub losses: u32,

    /// Rounded to a whole percent
    pub win_percentage: u32,

    /// Seconds, rounded
    pub average_game_time: u64,

    pub longest_win_streak: u32,

    /// Positive while winning, negative while losing
    pub current_win_streak: i32,

    /// Seconds
    pub total_play_time: u64,

    /// Keyed `YYYY-MM`
    pub monthly_stats: BTreeMap<String, MonthlyStats>,

    pub last_updated: DateTime<Utc>,
}

impl Default for UserStatistics {
    fn default() -> Self {
        Self {
            total_games: 0,
            wins: 0,
            losses: 0,
            win_percentage: 0,
            average_game_time: 0,
            longest_win_streak: 0,
            current_win_streak: 0,
            total_play_time: 0,
            monthly_stats: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}

impl UserStatistics {
    pub fn is_on_win_streak(&self) -> bool {
        self.current_win_streak > 0
    }

    pub fn is_on_loss_streak(&self) -> bool {
        self.current_win_streak < 0
    }

    /// Label of the player's level by win percentage.
    pub fn performance_rating(&self) -> &'static str {
        match self.win_percentage {
            80.. => "Excelente",
            65.. => "Muy Bueno",
            50.. => "Bueno",
            35.. => "Regular",
            _ => "Principiante",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub month: String,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_percentage: u32,
    pub average_game_time: u64,
}

impl MonthlyStats {
    pub fn new(month: &str) -> Self {
        Self {
            month: month.to_string(),
            games_played: 0,
            wins: 0,
            losses: 0,
            win_percentage: 0,
            average_game_time: 0,
        }
    }
}

/// Counters since the recorder was created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub games_this_session: u32,
    pub wins_this_session: u32,
    pub session_start_time: DateTime<Utc>,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self {
            games_this_session: 0,
            wins_this_session: 0,
            session_start_time: Utc::now(),
        }
    }
}

/// Progress towards a statistics achievement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Milestone {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub progress: u32,
    pub max_progress: u32,
    pub is_unlocked: bool,
}

/// Seconds of play behind the playtime milestones.
const ONE_HOUR_SECS: u64 = 3600;

fn counter(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    value: u64,
    target: u32,
) -> Milestone {
    Milestone {
        id,
        name,
        description,
        progress: value.min(u64::from(target)) as u32,
        max_progress: target,
        is_unlocked: value >= u64::from(target),
    }
}

fn flag(id: &'static str, name: &'static str, description: &'static str, met: bool) -> Milestone {
    Milestone {
        id,
        name,
        description,
        progress: u32::from(met),
        max_progress: 1,
        is_unlocked: met,
    }
}

/// Longest run of consecutive years with at least one November game.
fn november_year_run(stats: &UserStatistics) -> u64 {
    let mut years: Vec<i32> = stats
        .monthly_stats
        .iter()
        .filter(|(month, monthly)| month.ends_with("-11") && monthly.games_played > 0)
        .filter_map(|(month, _)| month.get(..4)?.parse().ok())
        .collect();
    years.sort_unstable();

    let mut longest = 0;
    let mut run = 0;
    let mut previous = None;
    for year in years {
        run = if previous == Some(year - 1) { run + 1 } else { 1 };
        longest = longest.max(run);
        previous = Some(year);
    }
    longest
}

/// Achievement progress read off `stats`.
///
/// Covers every achievement that lifetime statistics can decide. Those that
/// depend on a single round or a calendar day are left to the caller.
pub fn milestones(stats: &UserStatistics) -> Vec<Milestone> {
    let games = u64::from(stats.total_games);
    let wins = u64::from(stats.wins);
    let streak = u64::from(stats.longest_win_streak);
    let november_wins: u64 = stats
        .monthly_stats
        .iter()
        .filter(|(month, _)| month.ends_with("-11"))
        .map(|(_, monthly)| u64::from(monthly.wins))
        .sum();
    let played_november_2024 = stats
        .monthly_stats
        .get("2024-11")
        .is_some_and(|monthly| monthly.games_played > 0);

    vec![
        counter("first_win", "Primera Victoria", "Gana tu primera partida de lotería", wins, 1),
        counter("win_streak_3", "Racha Inicial", "Gana 3 partidas consecutivas", streak, 3),
        counter("win_streak_5", "Racha de Fuego", "Gana 5 partidas consecutivas", streak, 5),
        counter("win_streak_10", "Imparable", "Gana 10 partidas consecutivas", streak, 10),
        counter("games_10", "Principiante", "Juega 10 partidas", games, 10),
        counter("games_25", "Aficionado", "Juega 25 partidas", games, 25),
        counter("games_50", "Entusiasta", "Juega 50 partidas", games, 50),
        counter("games_100", "Centenario", "Juega 100 partidas", games, 100),
        counter("games_250", "Veterano", "Juega 250 partidas", games, 250),
        counter("games_500", "Maestro", "Juega 500 partidas", games, 500),
        counter("wins_50", "Medio Centenar", "Gana 50 partidas", wins, 50),
        counter("wins_100", "Centurión", "Gana 100 partidas", wins, 100),
        counter(
            "playtime_1h",
            "Primera Hora",
            "Juega durante 1 hora total",
            stats.total_play_time,
            ONE_HOUR_SECS as u32,
        ),
        counter(
            "playtime_10h",
            "Dedicado",
            "Juega durante 10 horas total",
            stats.total_play_time,
            (ONE_HOUR_SECS * 10) as u32,
        ),
        flag(
            "win_rate_70",
            "Experto",
            "Mantén 70% de victorias con al menos 20 partidas",
            stats.total_games >= 20 && stats.win_percentage >= 70,
        ),
        flag(
            "win_rate_80",
            "Maestro de la Lotería",
            "Mantén 80% de victorias con al menos 50 partidas",
            stats.total_games >= 50 && stats.win_percentage >= 80,
        ),
        flag(
            "dia_muertos_2024",
            "Día de Muertos 2024",
            "Juega durante noviembre de 2024",
            played_november_2024,
        ),
        counter(
            "dia_muertos_veteran",
            "Veterano del Día de Muertos",
            "Juega durante el Día de Muertos por 3 años consecutivos",
            november_year_run(stats),
            3,
        ),
        counter(
            "november_champion",
            "Campeón de Noviembre",
            "Gana 20 partidas durante noviembre",
            november_wins,
            20,
        ),
    ]
}
