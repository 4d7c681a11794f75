use crate::errors::ApiError;
use crate::extractors::{AuthenticatedUser, JsonBody, PathId};
use crate::routes::Message;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use bookshelf_core::database::types::{NewQuote, QuoteId, QuoteRecord, QuoteUpdate};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub quote: QuoteRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn create(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    JsonBody(input): JsonBody<NewQuote>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let quote = state
        .db
        .create_quote(user.id, input)
        .await
        .map_err(|error| ApiError::library(error, "خطا در ایجاد نقل قول"))?;
    Ok(Json(QuoteResponse {
        quote,
        message: Some("نقل قول با موفقیت اضافه شد"),
    }))
}

#[tracing::instrument(skip_all, fields(quote_id = id))]
pub async fn get(
    State(state): State<AppState>,
    PathId(id): PathId<QuoteId>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let quote = state
        .db
        .quote(id)
        .await
        .map_err(|error| ApiError::library(error, "خطا در دریافت نقل قول"))?;
    Ok(Json(QuoteResponse {
        quote,
        message: None,
    }))
}

#[tracing::instrument(skip_all, fields(user_id = user.id, quote_id = id))]
pub async fn update(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    PathId(id): PathId<QuoteId>,
    JsonBody(update): JsonBody<QuoteUpdate>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let quote = state
        .db
        .update_quote(user.id, id, update)
        .await
        .map_err(|error| ApiError::library(error, "خطا در بروزرسانی نقل قول"))?;
    Ok(Json(QuoteResponse {
        quote,
        message: Some("نقل قول با موفقیت بروزرسانی شد"),
    }))
}

#[tracing::instrument(skip_all, fields(user_id = user.id, quote_id = id))]
pub async fn delete(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    PathId(id): PathId<QuoteId>,
) -> Result<Json<Message>, ApiError> {
    state
        .db
        .delete_quote(user.id, id)
        .await
        .map_err(|error| ApiError::library(error, "خطا در حذف نقل قول"))?;
    Ok(Json(Message::new("نقل قول با موفقیت حذف شد")))
}
