//! Player statistics and achievement progress.

pub mod models;
pub mod recorder;

pub use models::{
    MIN_RECORDED_DURATION_SECS, Milestone, MonthlyStats, SessionStats, UserStatistics,
    milestones,
};
pub use recorder::{StatisticsExport, StatisticsRecorder};
