// src/engine/session.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::attempt::AnswerFeedback;
use crate::models::question::{OptionKey, QuestionView};

/// Attempt lifecycle. `Listing` is represented by the absence of a session in
/// the registry, so only the in-session states appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Loading,
    Active,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Loading => "loading",
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
        }
    }
}

/// Rejected transitions. These map to `Validation` at the HTTP boundary; the
/// machine itself never mutates state on a rejected call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    NotLoading,
    NotActive,
    NotCompleted,
    EmptyQuiz,
    UnknownOption,
    IndexOutOfRange,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            SessionError::NotLoading => "session is not loading",
            SessionError::NotActive => "session is not active",
            SessionError::NotCompleted => "session is not completed",
            SessionError::EmptyQuiz => "quiz has no questions",
            SessionError::UnknownOption => "option key is not present on this question",
            SessionError::IndexOutOfRange => "question index out of range",
        };
        f.write_str(msg)
    }
}

/// Scoring summary produced at Completed-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionSummary {
    pub score: u8,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub is_perfect: bool,
}

/// Rounded percentage score.
pub fn score(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (100.0 * correct as f64 / total as f64).round() as u8
}

/// One actor's run through a quiz. Single-writer: all transitions are driven
/// by the owning actor's requests, one at a time, so the struct itself holds
/// no locks.
#[derive(Debug, Clone)]
pub struct AttemptSession {
    pub session_id: Uuid,
    pub actor_id: i64,
    pub quiz_id: i64,
    pub questions: Vec<QuestionView>,
    pub current_index: usize,
    pub answers: HashMap<usize, OptionKey>,
    pub feedback: HashMap<usize, AnswerFeedback>,
    pub status: SessionStatus,
    pub time_limit_secs: i64,
    pub release_at: DateTime<Utc>,
    /// Set once the completion event for this session has been appended, so a
    /// retried submission does not append a second one.
    pub completion_recorded: bool,
}

impl AttemptSession {
    /// Placeholder registered before the quiz fetch starts. If it is removed
    /// from the registry while the fetch is in flight, the fetch result is
    /// discarded.
    pub fn new_loading(actor_id: i64, quiz_id: i64) -> Self {
        AttemptSession {
            session_id: Uuid::new_v4(),
            actor_id,
            quiz_id,
            questions: Vec::new(),
            current_index: 0,
            answers: HashMap::new(),
            feedback: HashMap::new(),
            status: SessionStatus::Loading,
            time_limit_secs: 0,
            release_at: Utc::now(),
            completion_recorded: false,
        }
    }

    /// Loading -> Active: the shuffled questions are fixed for the lifetime of
    /// the session (restart keeps them).
    pub fn ready(
        &mut self,
        questions: Vec<QuestionView>,
        time_limit_secs: i64,
        release_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        if self.status != SessionStatus::Loading {
            return Err(SessionError::NotLoading);
        }
        if questions.is_empty() {
            return Err(SessionError::EmptyQuiz);
        }
        self.questions = questions;
        self.current_index = 0;
        self.answers.clear();
        self.feedback.clear();
        self.time_limit_secs = time_limit_secs;
        self.release_at = release_at;
        self.status = SessionStatus::Active;
        Ok(())
    }

    /// Records the answer for the current question and freezes its feedback.
    /// A repeat call for an already-answered question returns the frozen
    /// feedback unchanged.
    pub fn select_answer(&mut self, key: OptionKey) -> Result<AnswerFeedback, SessionError> {
        if self.status != SessionStatus::Active {
            return Err(SessionError::NotActive);
        }
        let index = self.current_index;
        if let Some(existing) = self.feedback.get(&index) {
            return Ok(*existing);
        }
        let question = &self.questions[index];
        if !question.options.iter().any(|o| o.key == key) {
            return Err(SessionError::UnknownOption);
        }
        let feedback = AnswerFeedback {
            index,
            is_correct: key == question.correct_key,
        };
        self.answers.insert(index, key);
        self.feedback.insert(index, feedback);
        Ok(feedback)
    }

    /// Advances to the next question, or enters Completed at the last one.
    pub fn next(&mut self) -> Result<Option<CompletionSummary>, SessionError> {
        if self.status != SessionStatus::Active {
            return Err(SessionError::NotActive);
        }
        if self.current_index + 1 >= self.questions.len() {
            self.status = SessionStatus::Completed;
            return Ok(Some(self.summary()));
        }
        self.current_index += 1;
        Ok(None)
    }

    /// Moves back one question; a no-op at index 0. Navigation is allowed
    /// regardless of answered state.
    pub fn prev(&mut self) -> Result<usize, SessionError> {
        if self.status != SessionStatus::Active {
            return Err(SessionError::NotActive);
        }
        self.current_index = self.current_index.saturating_sub(1);
        Ok(self.current_index)
    }

    /// Completed -> Active with the same shuffled order; answers, feedback and
    /// position are reset.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        if self.status != SessionStatus::Completed {
            return Err(SessionError::NotCompleted);
        }
        self.answers.clear();
        self.feedback.clear();
        self.current_index = 0;
        self.completion_recorded = false;
        self.status = SessionStatus::Active;
        Ok(())
    }

    /// Applies a submitted answers map and enters Completed.
    ///
    /// Answers already frozen by `select_answer` win over the payload. On an
    /// already-completed session this is a retry: the frozen state is scored
    /// again and nothing is overwritten.
    pub fn complete_with(
        &mut self,
        answers: &HashMap<usize, OptionKey>,
    ) -> Result<CompletionSummary, SessionError> {
        if self.status == SessionStatus::Loading {
            return Err(SessionError::NotActive);
        }
        for (&index, &key) in answers {
            if index >= self.questions.len() {
                return Err(SessionError::IndexOutOfRange);
            }
            if self.feedback.contains_key(&index) {
                continue;
            }
            let question = &self.questions[index];
            if !question.options.iter().any(|o| o.key == key) {
                return Err(SessionError::UnknownOption);
            }
            self.answers.insert(index, key);
            self.feedback.insert(
                index,
                AnswerFeedback {
                    index,
                    is_correct: key == question.correct_key,
                },
            );
        }
        self.status = SessionStatus::Completed;
        Ok(self.summary())
    }

    pub fn summary(&self) -> CompletionSummary {
        let total = self.questions.len();
        let correct = self.feedback.values().filter(|f| f.is_correct).count();
        CompletionSummary {
            score: score(correct, total),
            correct_answers: correct as u32,
            total_questions: total as u32,
            is_perfect: total > 0 && correct == total,
        }
    }
}
