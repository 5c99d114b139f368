// src/models/attempt.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::question::{OptionKey, PublicQuestionView};

/// Feedback frozen for one answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerFeedback {
    pub index: usize,
    pub is_correct: bool,
}

/// DTO for starting an attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct StartAttemptRequest {
    #[validate(range(min = 1))]
    pub actor_id: i64,
    #[validate(range(min = 1))]
    pub quiz_id: i64,
}

/// DTO for answering the current question.
#[derive(Debug, Deserialize)]
pub struct SelectAnswerRequest {
    pub key: OptionKey,
}

/// DTO for submitting a completed attempt.
///
/// The client echoes its locally computed score/counts; the server recomputes
/// both and the recomputed values win.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    #[validate(range(min = 1))]
    pub quiz_id: i64,
    #[validate(custom(function = validate_answers))]
    pub answers: HashMap<usize, OptionKey>,
    // Capped at one week; anything beyond that is a corrupt client clock.
    #[validate(range(min = 0, max = 604_800))]
    pub time_spent_secs: i64,
    #[validate(range(min = 0, max = 100))]
    pub score: Option<u8>,
    pub correct_answers: Option<u32>,
    pub total_questions: Option<u32>,
}

fn validate_answers(
    answers: &HashMap<usize, OptionKey>,
) -> Result<(), validator::ValidationError> {
    if answers.is_empty() {
        return Err(validator::ValidationError::new("answers_cannot_be_empty"));
    }
    Ok(())
}

/// DTO returned from submit.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitAttemptResponse {
    pub score: u8,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub new_achievements: Vec<String>,
}

/// DTO for the explicit mistake-review and revisit actions.
#[derive(Debug, Deserialize, Validate)]
pub struct ActivityRequest {
    #[validate(range(min = 1))]
    pub actor_id: i64,
    #[validate(range(min = 1))]
    pub quiz_id: i64,
}

/// DTO for recording a retake (a second scored pass over the same quiz).
#[derive(Debug, Deserialize, Validate)]
pub struct RetakeRequest {
    #[validate(range(min = 1))]
    pub actor_id: i64,
    #[validate(range(min = 1))]
    pub quiz_id: i64,
    #[validate(range(min = 0, max = 100))]
    pub first_score: u8,
    #[validate(range(min = 0, max = 100))]
    pub second_score: u8,
}

/// Client-facing view of a session (correct keys hidden).
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub quiz_id: i64,
    pub status: String,
    pub current_index: usize,
    pub total_questions: usize,
    pub questions: Vec<PublicQuestionView>,
    pub answers: HashMap<usize, OptionKey>,
    pub feedback: Vec<AnswerFeedback>,
}
