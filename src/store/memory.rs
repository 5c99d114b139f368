// src/store/memory.rs

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::models::achievement::{AchievementRecord, AwardOutcome};
use crate::models::event::{ActivityLog, EventLogEntry};
use crate::models::question::QuestionDefinition;
use crate::models::quiz::{QuizDefinition, QuizSummary};
use crate::store::{AwardStore, EventLogStore, QuizStore};

/// In-memory backend. Used by the integration tests and local development
/// without a database; semantics match the Postgres backend, including the
/// single-write-lock conditional insert for awards.
#[derive(Default)]
pub struct MemoryStore {
    quizzes: RwLock<HashMap<i64, (QuizDefinition, Vec<QuestionDefinition>)>>,
    events: RwLock<Vec<EventLogEntry>>,
    award_keys: RwLock<HashSet<(i64, i64, String)>>,
    award_records: RwLock<Vec<AchievementRecord>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(MemoryStore::default())
    }

    pub async fn insert_quiz(&self, quiz: QuizDefinition, questions: Vec<QuestionDefinition>) {
        self.quizzes.write().await.insert(quiz.id, (quiz, questions));
    }

    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn quiz_by_id(&self, quiz_id: i64) -> Result<Option<QuizDefinition>, AppError> {
        Ok(self
            .quizzes
            .read()
            .await
            .get(&quiz_id)
            .map(|(quiz, _)| quiz.clone()))
    }

    async fn approved_questions(
        &self,
        quiz_id: i64,
    ) -> Result<Vec<QuestionDefinition>, AppError> {
        Ok(self
            .quizzes
            .read()
            .await
            .get(&quiz_id)
            .map(|(_, questions)| questions.clone())
            .unwrap_or_default())
    }

    async fn list_published(&self) -> Result<Vec<QuizSummary>, AppError> {
        let mut summaries: Vec<QuizSummary> = self
            .quizzes
            .read()
            .await
            .values()
            .filter(|(quiz, _)| quiz.published)
            .map(|(quiz, _)| QuizSummary {
                id: quiz.id,
                title: quiz.title.clone(),
                course_id: quiz.course_id,
                release_at: quiz.release_at,
            })
            .collect();
        summaries.sort_by_key(|s| s.id);
        Ok(summaries)
    }
}

#[async_trait]
impl EventLogStore for MemoryStore {
    async fn append(&self, entry: &EventLogEntry) -> Result<(), AppError> {
        self.events.write().await.push(entry.clone());
        Ok(())
    }

    async fn activity(&self, actor_id: i64) -> Result<ActivityLog, AppError> {
        let entries: Vec<EventLogEntry> = self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.actor_id() == actor_id)
            .cloned()
            .collect();
        Ok(ActivityLog::from_entries(entries))
    }

    async fn has_completion(&self, actor_id: i64, quiz_id: i64) -> Result<bool, AppError> {
        Ok(self.events.read().await.iter().any(|e| {
            matches!(e, EventLogEntry::Completion(_))
                && e.actor_id() == actor_id
                && e.quiz_id() == quiz_id
        }))
    }
}

#[async_trait]
impl AwardStore for MemoryStore {
    async fn award_if_absent(
        &self,
        actor_id: i64,
        quiz_id: i64,
        achievement_type: &str,
        awarded_at: DateTime<Utc>,
    ) -> Result<AwardOutcome, AppError> {
        // Both maps are updated under the key-set write lock so that
        // concurrent callers serialize exactly like the unique constraint.
        let mut keys = self.award_keys.write().await;
        if !keys.insert((actor_id, quiz_id, achievement_type.to_string())) {
            return Ok(AwardOutcome::Duplicate);
        }
        self.award_records.write().await.push(AchievementRecord {
            actor_id,
            quiz_id,
            achievement_type: achievement_type.to_string(),
            awarded_at,
        });
        Ok(AwardOutcome::Created)
    }

    async fn awards_for(&self, actor_id: i64) -> Result<Vec<AchievementRecord>, AppError> {
        Ok(self
            .award_records
            .read()
            .await
            .iter()
            .filter(|r| r.actor_id == actor_id)
            .cloned()
            .collect())
    }
}
