// src/store/postgres.rs

use std::collections::BTreeMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use crate::error::AppError;
use crate::models::achievement::{AchievementRecord, AwardOutcome};
use crate::models::event::{ActivityLog, EventLogEntry};
use crate::models::question::{OptionKey, QuestionDefinition};
use crate::models::quiz::{QuizDefinition, QuizSummary};
use crate::store::{AwardStore, EventLogStore, QuizStore};

/// Postgres-backed stores sharing one pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

/// Helper struct for fetching question rows; the JSONB options column decodes
/// straight into the keyed map.
#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: i64,
    prompt: String,
    options: Json<BTreeMap<OptionKey, String>>,
    correct_key: String,
}

impl QuestionRow {
    /// Converts a stored row into a definition, rejecting rows whose correct
    /// key is unparseable or does not label one of the stored options.
    fn into_definition(self) -> Option<QuestionDefinition> {
        let Ok(correct_key) = OptionKey::from_str(&self.correct_key) else {
            tracing::warn!(
                question_id = self.id,
                correct_key = %self.correct_key,
                "Skipping question with malformed correct key"
            );
            return None;
        };
        if !self.options.0.contains_key(&correct_key) {
            tracing::warn!(
                question_id = self.id,
                correct_key = %correct_key,
                "Skipping question whose correct key is missing from its options"
            );
            return None;
        }
        Some(QuestionDefinition {
            id: self.id,
            prompt: self.prompt,
            options: self.options.0,
            correct_key,
        })
    }
}

#[async_trait]
impl QuizStore for PgStore {
    async fn quiz_by_id(&self, quiz_id: i64) -> Result<Option<QuizDefinition>, AppError> {
        let quiz = sqlx::query_as::<_, QuizDefinition>(
            r#"
            SELECT id, title, course_id, published, release_at, time_limit_secs
            FROM quizzes
            WHERE id = $1
            "#,
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quiz)
    }

    async fn approved_questions(
        &self,
        quiz_id: i64,
    ) -> Result<Vec<QuestionDefinition>, AppError> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, prompt, options, correct_key
            FROM questions
            WHERE quiz_id = $1 AND approved = TRUE
            ORDER BY position, id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(QuestionRow::into_definition).collect())
    }

    async fn list_published(&self) -> Result<Vec<QuizSummary>, AppError> {
        let quizzes = sqlx::query_as::<_, QuizSummary>(
            r#"
            SELECT id, title, course_id, release_at
            FROM quizzes
            WHERE published = TRUE
            ORDER BY release_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(quizzes)
    }
}

#[async_trait]
impl EventLogStore for PgStore {
    async fn append(&self, entry: &EventLogEntry) -> Result<(), AppError> {
        let payload = serde_json::to_value(entry)?;
        sqlx::query(
            r#"
            INSERT INTO event_log (actor_id, quiz_id, kind, payload, occurred_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.actor_id())
        .bind(entry.quiz_id())
        .bind(entry.kind())
        .bind(Json(payload))
        .bind(entry.occurred_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn activity(&self, actor_id: i64) -> Result<ActivityLog, AppError> {
        let payloads: Vec<Json<serde_json::Value>> =
            sqlx::query_scalar("SELECT payload FROM event_log WHERE actor_id = $1 ORDER BY id")
                .bind(actor_id)
                .fetch_all(&self.pool)
                .await?;

        // A malformed row must never poison rule evaluation; skip it.
        let entries = payloads.into_iter().filter_map(|Json(value)| {
            match serde_json::from_value::<EventLogEntry>(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(actor_id, error = %e, "Skipping malformed event log row");
                    None
                }
            }
        });
        Ok(ActivityLog::from_entries(entries))
    }

    async fn has_completion(&self, actor_id: i64, quiz_id: i64) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM event_log
                WHERE actor_id = $1 AND quiz_id = $2 AND kind = 'completion'
            )
            "#,
        )
        .bind(actor_id)
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

#[async_trait]
impl AwardStore for PgStore {
    async fn award_if_absent(
        &self,
        actor_id: i64,
        quiz_id: i64,
        achievement_type: &str,
        awarded_at: DateTime<Utc>,
    ) -> Result<AwardOutcome, AppError> {
        // Single conditional insert: the unique key resolves races, there is
        // no separate existence check.
        let result = sqlx::query(
            r#"
            INSERT INTO achievement_awards (actor_id, quiz_id, achievement_type, awarded_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (actor_id, quiz_id, achievement_type) DO NOTHING
            "#,
        )
        .bind(actor_id)
        .bind(quiz_id)
        .bind(achievement_type)
        .bind(awarded_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            Ok(AwardOutcome::Created)
        } else {
            Ok(AwardOutcome::Duplicate)
        }
    }

    async fn awards_for(&self, actor_id: i64) -> Result<Vec<AchievementRecord>, AppError> {
        let records = sqlx::query_as::<_, AchievementRecord>(
            r#"
            SELECT actor_id, quiz_id, achievement_type, awarded_at
            FROM achievement_awards
            WHERE actor_id = $1
            ORDER BY awarded_at
            "#,
        )
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(correct_key: &str, options: &[(OptionKey, &str)]) -> QuestionRow {
        QuestionRow {
            id: 7,
            prompt: "What is the capital of France?".to_string(),
            options: Json(
                options
                    .iter()
                    .map(|(k, text)| (*k, text.to_string()))
                    .collect(),
            ),
            correct_key: correct_key.to_string(),
        }
    }

    #[test]
    fn test_well_formed_row_converts() {
        let definition = row("B", &[(OptionKey::A, "Lyon"), (OptionKey::B, "Paris")])
            .into_definition()
            .unwrap();
        assert_eq!(definition.correct_key, OptionKey::B);
        assert_eq!(definition.options.len(), 2);
    }

    #[test]
    fn test_unparseable_correct_key_is_rejected() {
        assert!(row("E", &[(OptionKey::A, "Lyon")]).into_definition().is_none());
    }

    #[test]
    fn test_correct_key_absent_from_options_is_rejected() {
        let converted = row("C", &[(OptionKey::A, "Lyon"), (OptionKey::B, "Paris")])
            .into_definition();
        assert!(converted.is_none());
    }

    #[test]
    fn test_empty_options_are_rejected() {
        assert!(row("A", &[]).into_definition().is_none());
    }
}
