// src/store/mod.rs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::achievement::{AchievementRecord, AwardOutcome};
use crate::models::event::{ActivityLog, EventLogEntry};
use crate::models::question::QuestionDefinition;
use crate::models::quiz::{QuizDefinition, QuizSummary};

/// Read side of quiz content. Authoring is out of scope; the engine only ever
/// reads published quizzes and approved questions.
#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn quiz_by_id(&self, quiz_id: i64) -> Result<Option<QuizDefinition>, AppError>;

    /// Approved questions in authored order. An empty result means the quiz is
    /// unavailable for attempts.
    async fn approved_questions(&self, quiz_id: i64)
    -> Result<Vec<QuestionDefinition>, AppError>;

    async fn list_published(&self) -> Result<Vec<QuizSummary>, AppError>;
}

/// Append-only activity log. Entries are never updated or removed.
#[async_trait]
pub trait EventLogStore: Send + Sync {
    async fn append(&self, entry: &EventLogEntry) -> Result<(), AppError>;

    /// Full per-actor snapshot, split by kind. Malformed rows are skipped.
    async fn activity(&self, actor_id: i64) -> Result<ActivityLog, AppError>;

    /// "Exists a completion for this quiz" check used by retake/revisit flows.
    async fn has_completion(&self, actor_id: i64, quiz_id: i64) -> Result<bool, AppError>;
}

/// Exactly-once award storage keyed by (actor, quiz, achievement type).
#[async_trait]
pub trait AwardStore: Send + Sync {
    /// Atomic conditional insert. Concurrent calls with the same key resolve
    /// at the storage layer; exactly one reports `Created`.
    async fn award_if_absent(
        &self,
        actor_id: i64,
        quiz_id: i64,
        achievement_type: &str,
        awarded_at: DateTime<Utc>,
    ) -> Result<AwardOutcome, AppError>;

    async fn awards_for(&self, actor_id: i64) -> Result<Vec<AchievementRecord>, AppError>;
}
