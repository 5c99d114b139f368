// src/handlers/achievement.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    engine::rules::{CATALOGUE, evaluate_all},
    error::AppError,
    state::AppState,
};

/// Full achievement state for one actor: every catalogue entry with its
/// earned/progress status (re-derived from the log on every call), plus the
/// persisted award records.
pub async fn get_achievements(
    State(state): State<AppState>,
    Path(actor_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let log = state.events.activity(actor_id).await?;
    let statuses = evaluate_all(&log, &state.config.rule_config());

    let achievements: Vec<serde_json::Value> = CATALOGUE
        .iter()
        .map(|def| {
            let status = statuses[&def.id];
            serde_json::json!({
                "id": def.id.as_str(),
                "title": def.title,
                "category": def.category,
                "earned": status.earned,
                "progress": status.progress,
            })
        })
        .collect();

    let awards = state.awards.awards_for(actor_id).await?;

    Ok(Json(serde_json::json!({
        "achievements": achievements,
        "awards": awards,
    })))
}
