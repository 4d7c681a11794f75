use crate::errors::ApiError;
use crate::extractors::AuthenticatedUser;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use bookshelf_core::database::stats::LibraryStats;
use chrono::Utc;

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<LibraryStats>, ApiError> {
    let stats = state
        .db
        .library_stats(user.id, Utc::now())
        .await
        .map_err(|error| ApiError::library(error, "خطا در دریافت آمار"))?;
    Ok(Json(stats))
}
