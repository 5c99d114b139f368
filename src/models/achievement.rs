// src/models/achievement.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Engagement achievement identifiers. The catalogue of rules behind each id
/// lives in `engine::rules`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FirstDayFinisher,
    MistakeReviewer,
    WeeklyRevisitor,
    PerfectScore,
    EarlyBird,
    ConsistentLearner,
    SpeedDemon,
    ImprovementMaster,
    DedicatedStudent,
    ReviewChampion,
    WeekWarrior,
    ComebackKing,
}

impl AchievementId {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementId::FirstDayFinisher => "first_day_finisher",
            AchievementId::MistakeReviewer => "mistake_reviewer",
            AchievementId::WeeklyRevisitor => "weekly_revisitor",
            AchievementId::PerfectScore => "perfect_score",
            AchievementId::EarlyBird => "early_bird",
            AchievementId::ConsistentLearner => "consistent_learner",
            AchievementId::SpeedDemon => "speed_demon",
            AchievementId::ImprovementMaster => "improvement_master",
            AchievementId::DedicatedStudent => "dedicated_student",
            AchievementId::ReviewChampion => "review_champion",
            AchievementId::WeekWarrior => "week_warrior",
            AchievementId::ComebackKing => "comeback_king",
        }
    }
}

/// Outcome-tier award type: every completed quiz earns this once per
/// (actor, quiz).
pub const QUIZ_COMPLETED: &str = "quiz_completed";

/// Result of one rule evaluation: whether the achievement is earned and how
/// far along it is (0..=100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementStatus {
    pub earned: bool,
    pub progress: u8,
}

/// Result of an idempotent award attempt. `Duplicate` is a success, not an
/// error: the record already exists for this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwardOutcome {
    Created,
    Duplicate,
}

/// Represents the 'achievement_awards' table in the database.
/// Unique on (actor_id, quiz_id, achievement_type); never updated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AchievementRecord {
    pub actor_id: i64,
    pub quiz_id: i64,
    pub achievement_type: String,
    pub awarded_at: chrono::DateTime<chrono::Utc>,
}
