// src/handlers/activity.rs

use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;
use validator::Validate;

use crate::{
    engine::rules::{evaluate_all, newly_earned},
    error::AppError,
    models::{
        achievement::AwardOutcome,
        attempt::{ActivityRequest, RetakeRequest},
        event::{EventLogEntry, MistakeReviewEvent, RetakeEvent, RevisitEvent},
    },
    state::AppState,
};

/// Appends one event and awards any achievements whose `earned` flag flipped
/// on this append. Returns the newly earned achievement type names.
///
/// Evaluation is a pure re-derivation over the log before and after the
/// append; only the false -> true edge produces an award attempt, and the
/// award itself is idempotent at the storage layer.
pub(crate) async fn log_event_and_award(
    state: &AppState,
    actor_id: i64,
    quiz_id: i64,
    entry: EventLogEntry,
) -> Result<Vec<String>, AppError> {
    let rule_config = state.config.rule_config();

    let before = evaluate_all(&state.events.activity(actor_id).await?, &rule_config);
    state.events.append(&entry).await?;
    let after = evaluate_all(&state.events.activity(actor_id).await?, &rule_config);

    let mut earned = Vec::new();
    for id in newly_earned(&before, &after) {
        match state
            .awards
            .award_if_absent(actor_id, quiz_id, id.as_str(), Utc::now())
            .await
        {
            Ok(AwardOutcome::Created) => earned.push(id.as_str().to_string()),
            Ok(AwardOutcome::Duplicate) => {}
            Err(e) => {
                // The event is already appended; a failed award is retried on
                // the next evaluation and must not fail the request.
                tracing::error!(
                    actor_id,
                    quiz_id,
                    achievement = id.as_str(),
                    error = %e,
                    "Failed to persist achievement award"
                );
            }
        }
    }
    Ok(earned)
}

/// Records that the actor reviewed their mistakes on a quiz.
pub async fn record_mistake_review(
    State(state): State<AppState>,
    Json(req): Json<ActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let entry = EventLogEntry::MistakeReview(MistakeReviewEvent {
        actor_id: req.actor_id,
        quiz_id: req.quiz_id,
        reviewed_at: Utc::now(),
    });
    let new_achievements = log_event_and_award(&state, req.actor_id, req.quiz_id, entry).await?;

    Ok(Json(serde_json::json!({
        "recorded": true,
        "new_achievements": new_achievements,
    })))
}

/// Records that the actor came back to a quiz they had already taken.
pub async fn record_revisit(
    State(state): State<AppState>,
    Json(req): Json<ActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let entry = EventLogEntry::Revisit(RevisitEvent {
        actor_id: req.actor_id,
        quiz_id: req.quiz_id,
        revisited_at: Utc::now(),
    });
    let new_achievements = log_event_and_award(&state, req.actor_id, req.quiz_id, entry).await?;

    Ok(Json(serde_json::json!({
        "recorded": true,
        "new_achievements": new_achievements,
    })))
}

/// Records a retake (a second scored pass). Requires a prior completion of
/// the same quiz in the log.
pub async fn record_retake(
    State(state): State<AppState>,
    Json(req): Json<RetakeRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    if !state
        .events
        .has_completion(req.actor_id, req.quiz_id)
        .await?
    {
        return Err(AppError::Validation(
            "No completion recorded for this quiz".to_string(),
        ));
    }

    let entry = EventLogEntry::Retake(RetakeEvent {
        actor_id: req.actor_id,
        quiz_id: req.quiz_id,
        first_score: req.first_score,
        second_score: req.second_score,
        retaken_at: Utc::now(),
    });
    let new_achievements = log_event_and_award(&state, req.actor_id, req.quiz_id, entry).await?;

    Ok(Json(serde_json::json!({
        "recorded": true,
        "new_achievements": new_achievements,
    })))
}
