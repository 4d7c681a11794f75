use crate::errors::ApiError;
use crate::extractors::{AuthenticatedUser, JsonBody, PathId, QueryParams};
use crate::routes::Message;
use crate::state::AppState;
use axum::extract::State;
use axum::http::header::CACHE_CONTROL;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bookshelf_core::database::books::{Pagination, SearchPage};
use bookshelf_core::database::types::{BookDetail, BookId, BookPatch, BookRecord, NewBook};
use serde::{Deserialize, Serialize};

/// Clients may reuse the listing for a minute and serve it stale while refetching
pub const LIST_CACHE_CONTROL: &str = "private, max-age=60, stale-while-revalidate=300";

#[derive(Debug, Serialize)]
pub struct BookList {
    #[serde(rename = "Book")]
    pub books: Vec<BookRecord>,
}

#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub book: BookRecord,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct BookDetailResponse {
    pub book: BookDetail,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn list(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let books = state
        .db
        .list_books(user.id)
        .await
        .map_err(|error| ApiError::library(error, "خطا در دریافت کتاب‌ها"))?;
    Ok(([(CACHE_CONTROL, LIST_CACHE_CONTROL)], Json(BookList { books })))
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn create(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    JsonBody(input): JsonBody<NewBook>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let book = state
        .db
        .create_book(user.id, input)
        .await
        .map_err(|error| ApiError::library(error, "خطا در ایجاد کتاب"))?;
    Ok((
        StatusCode::CREATED,
        Json(BookResponse {
            book,
            message: "کتاب ایجاد شد",
        }),
    ))
}

/// A book and its quotes. Readable without credentials.
#[tracing::instrument(skip_all, fields(book_id = id))]
pub async fn get(
    State(state): State<AppState>,
    PathId(id): PathId<BookId>,
) -> Result<Json<BookDetailResponse>, ApiError> {
    let book = state
        .db
        .book_detail(id)
        .await
        .map_err(|error| ApiError::library(error, "خطا در دریافت کتاب"))?;
    Ok(Json(BookDetailResponse { book }))
}

#[tracing::instrument(skip_all, fields(user_id = user.id, book_id = id))]
pub async fn update(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    PathId(id): PathId<BookId>,
    JsonBody(patch): JsonBody<BookPatch>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state
        .db
        .update_book(user.id, id, patch)
        .await
        .map_err(|error| ApiError::library(error, "خطا در بروزرسانی کتاب"))?;
    Ok(Json(BookResponse {
        book,
        message: "کتاب بروزرسانی شد",
    }))
}

#[tracing::instrument(skip_all, fields(user_id = user.id, book_id = id))]
pub async fn delete(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    PathId(id): PathId<BookId>,
) -> Result<Json<Message>, ApiError> {
    state
        .db
        .delete_book(user.id, id)
        .await
        .map_err(|error| ApiError::library(error, "خطا در حذف کتاب"))?;
    Ok(Json(Message::new("کتاب با موفقیت حذف شد")))
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn search(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    QueryParams(query): QueryParams<SearchQuery>,
) -> Result<Json<SearchPage>, ApiError> {
    let pagination = Pagination::new(query.page, query.limit);
    let page = state
        .db
        .search_books(user.id, query.q.as_deref().unwrap_or_default(), pagination)
        .await
        .map_err(|error| ApiError::library(error, "خطا در جستجوی کتاب‌ها"))?;
    Ok(Json(page))
}
