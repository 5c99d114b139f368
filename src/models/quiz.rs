// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'quizzes' table in the database.
/// Questions are fetched separately via the quiz store.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizDefinition {
    pub id: i64,
    pub title: String,
    pub course_id: i64,
    pub published: bool,
    pub release_at: chrono::DateTime<chrono::Utc>,
    pub time_limit_secs: i64,
}

/// Row for the quiz listing page (published quizzes only).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub course_id: i64,
    pub release_at: chrono::DateTime<chrono::Utc>,
}
