// src/handlers/attempt.rs

use std::time::Duration;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    engine::{
        session::{AttemptSession, SessionStatus},
        shuffle::build_attempt_questions,
    },
    error::AppError,
    handlers::activity::log_event_and_award,
    models::{
        achievement::{AchievementId, AwardOutcome, QUIZ_COMPLETED},
        attempt::{SelectAnswerRequest, SessionView, StartAttemptRequest, SubmitAttemptRequest,
            SubmitAttemptResponse},
        event::{CompletionEvent, EventLogEntry},
        question::PublicQuestionView,
        quiz::QuizDefinition,
    },
    state::AppState,
};

fn session_view(session: &AttemptSession) -> SessionView {
    SessionView {
        session_id: session.session_id,
        quiz_id: session.quiz_id,
        status: session.status.as_str().to_string(),
        current_index: session.current_index,
        total_questions: session.questions.len(),
        questions: session.questions.iter().map(PublicQuestionView::from).collect(),
        answers: session.answers.clone(),
        feedback: {
            let mut feedback: Vec<_> = session.feedback.values().copied().collect();
            feedback.sort_by_key(|f| f.index);
            feedback
        },
    }
}

async fn load_quiz(
    state: &AppState,
    quiz_id: i64,
) -> Result<(QuizDefinition, Vec<crate::models::question::QuestionDefinition>), AppError> {
    let quiz = state
        .quizzes
        .quiz_by_id(quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    if !quiz.published {
        return Err(AppError::Unavailable("Quiz is not published".to_string()));
    }

    let questions = state.quizzes.approved_questions(quiz_id).await?;
    if questions.is_empty() {
        return Err(AppError::Unavailable(
            "Quiz has no approved questions".to_string(),
        ));
    }

    Ok((quiz, questions))
}

/// Starts an attempt: registers a Loading placeholder, fetches the quiz under
/// a timeout, shuffles once and promotes the session to Active.
///
/// Failure or timeout removes the placeholder so no half-built session is
/// left behind. If the actor discarded the placeholder while the fetch was in
/// flight, the fetch result is thrown away instead of resurrecting a session.
pub async fn start_attempt(
    State(state): State<AppState>,
    Json(req): Json<StartAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let session_id = {
        let mut sessions = state.sessions.write().await;
        // One active session per actor: starting replaces any previous one.
        sessions.retain(|_, s| s.actor_id != req.actor_id);
        let placeholder = AttemptSession::new_loading(req.actor_id, req.quiz_id);
        let session_id = placeholder.session_id;
        sessions.insert(session_id, placeholder);
        session_id
    };

    let timeout = Duration::from_secs(state.config.quiz_load_timeout_secs);
    let loaded = match tokio::time::timeout(timeout, load_quiz(&state, req.quiz_id)).await {
        Ok(Ok(loaded)) => loaded,
        Ok(Err(e)) => {
            state.sessions.write().await.remove(&session_id);
            return Err(e);
        }
        Err(_) => {
            state.sessions.write().await.remove(&session_id);
            tracing::error!(quiz_id = req.quiz_id, "Timed out loading quiz");
            return Err(AppError::Transient("Timed out loading quiz".to_string()));
        }
    };

    let (quiz, questions) = loaded;
    let views = build_attempt_questions(&questions, &mut rand::thread_rng());
    let time_limit_secs = if quiz.time_limit_secs > 0 {
        quiz.time_limit_secs
    } else {
        state.config.default_time_limit_secs
    };

    let mut sessions = state.sessions.write().await;
    match sessions.get_mut(&session_id) {
        Some(session) if session.status == SessionStatus::Loading => {
            session.ready(views, time_limit_secs, quiz.release_at)?;
            Ok((StatusCode::CREATED, Json(session_view(session))))
        }
        _ => {
            // The actor went back to the listing while we were loading.
            tracing::info!(
                actor_id = req.actor_id,
                quiz_id = req.quiz_id,
                "Discarding quiz load for a cancelled attempt"
            );
            Err(AppError::Unavailable("Attempt was cancelled".to_string()))
        }
    }
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&session_id)
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
    Ok(Json(session_view(session)))
}

/// Records the answer for the current question; the feedback is frozen on
/// first selection.
pub async fn select_answer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SelectAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&session_id)
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
    let feedback = session.select_answer(req.key)?;
    Ok(Json(feedback))
}

pub async fn next_question(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&session_id)
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
    session.next()?;
    Ok(Json(session_view(session)))
}

pub async fn prev_question(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&session_id)
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
    session.prev()?;
    Ok(Json(session_view(session)))
}

/// Completed -> Active with the same shuffled order.
pub async fn restart_attempt(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&session_id)
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
    session.restart()?;
    Ok(Json(session_view(session)))
}

/// Back to listing: discards the session whether in flight or completed.
/// Removing a Loading placeholder is what cancels its pending quiz fetch.
pub async fn discard_attempt(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.sessions.write().await.remove(&session_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Submits an attempt: recomputes the score, enters Completed, then appends
/// the completion event and awards achievements.
///
/// The score is computed and committed to the response before any I/O; event
/// or award failures are logged and degrade to an empty `new_achievements`
/// list, never a retracted score.
pub async fn submit_attempt(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let (actor_id, quiz_id, summary, event, already_recorded) = {
        let mut sessions = state.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        if req.quiz_id != session.quiz_id {
            return Err(AppError::Validation(
                "Submitted quiz id does not match the session".to_string(),
            ));
        }

        let already_recorded = session.completion_recorded;
        let summary = session.complete_with(&req.answers)?;
        // Claim the event append before releasing the lock so a concurrent
        // retry cannot also see the flag unset; reverted if the append fails.
        session.completion_recorded = true;

        if let Some(client_score) = req.score {
            if client_score != summary.score {
                tracing::warn!(
                    session_id = %session_id,
                    client_score,
                    server_score = summary.score,
                    "Client-reported score disagrees with recomputed score"
                );
            }
        }

        let now = Utc::now();
        let event = CompletionEvent {
            actor_id: session.actor_id,
            quiz_id: session.quiz_id,
            completed_at: now,
            score: summary.score,
            time_spent_secs: req.time_spent_secs,
            completed_on_release_day: now.date_naive() == session.release_at.date_naive(),
            completed_early: (now - session.release_at).num_days()
                < state.config.early_completion_days,
            completed_in_half_time: req.time_spent_secs < session.time_limit_secs / 2,
        };
        (session.actor_id, session.quiz_id, summary, event, already_recorded)
    };

    // Post-completion side effects. The score below is already final.
    let mut new_achievements = Vec::new();

    if !already_recorded {
        match log_event_and_award(&state, actor_id, quiz_id, EventLogEntry::Completion(event))
            .await
        {
            Ok(mut earned) => {
                new_achievements.append(&mut earned);
            }
            Err(e) => {
                // Give the claim back so a later retry can append the event.
                if let Some(session) = state.sessions.write().await.get_mut(&session_id) {
                    session.completion_recorded = false;
                }
                tracing::error!(
                    actor_id,
                    quiz_id,
                    error = %e,
                    "Failed to append completion event; score already reported"
                );
            }
        }
    }

    let mut outcome_types = vec![QUIZ_COMPLETED];
    if summary.is_perfect {
        outcome_types.push(AchievementId::PerfectScore.as_str());
    }
    for achievement_type in outcome_types {
        match state
            .awards
            .award_if_absent(actor_id, quiz_id, achievement_type, Utc::now())
            .await
        {
            Ok(AwardOutcome::Created) => new_achievements.push(achievement_type.to_string()),
            Ok(AwardOutcome::Duplicate) => {}
            Err(e) => {
                tracing::error!(
                    actor_id,
                    quiz_id,
                    achievement_type,
                    error = %e,
                    "Failed to persist outcome award"
                );
            }
        }
    }

    Ok(Json(SubmitAttemptResponse {
        score: summary.score,
        correct_answers: summary.correct_answers,
        total_questions: summary.total_questions,
        new_achievements,
    }))
}
