// src/handlers/quiz.rs

use axum::{Json, extract::State, response::IntoResponse};

use crate::{error::AppError, state::AppState};

/// Published quizzes for the listing page.
pub async fn list_quizzes(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let quizzes = state.quizzes.list_published().await.map_err(|e| {
        tracing::error!("Failed to list published quizzes: {}", e);
        e
    })?;
    Ok(Json(quizzes))
}
