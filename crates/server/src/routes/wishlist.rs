use crate::errors::ApiError;
use crate::extractors::{AuthenticatedUser, JsonBody, PathId, QueryParams};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use bookshelf_core::database::types::{
    BookId, BookRecord, NewWishlistItem, WishlistItemId, WishlistPatch, WishlistRecord,
};
use bookshelf_core::database::wishlist::WishlistSort;
use bookshelf_core::errors::LibraryError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortQuery {
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistListing {
    pub wishlist: Vec<WishlistRecord>,
    pub total: usize,
    pub sort_by: &'static str,
    pub sort_order: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CreatedItem {
    pub wishlist: WishlistRecord,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub item: WishlistRecord,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub book_id: BookId,
    pub book: BookRecord,
    pub message: &'static str,
}

/// The caller's wishlist. Sorting falls back to newest first for unknown fields, and the response
/// echoes the sort that was applied.
#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn list(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    QueryParams(query): QueryParams<SortQuery>,
) -> Result<Json<WishlistListing>, ApiError> {
    let sort = WishlistSort::from_query(query.sort_by.as_deref(), query.sort_order.as_deref());
    let wishlist = state
        .db
        .list_wishlist(user.id, sort)
        .await
        .map_err(|error| ApiError::library(error, "خطا در دریافت لیست علاقه‌مندی‌ها"))?;
    Ok(Json(WishlistListing {
        total: wishlist.len(),
        wishlist,
        sort_by: sort.field.as_str(),
        sort_order: sort.order.as_str(),
    }))
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn create(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    JsonBody(input): JsonBody<NewWishlistItem>,
) -> Result<(StatusCode, Json<CreatedItem>), ApiError> {
    let item = state
        .db
        .create_wishlist_item(user.id, input)
        .await
        .map_err(|error| ApiError::library(error, "خطا در ایجاد آیتم"))?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedItem {
            wishlist: item,
            message: "آیتم به لیست علاقه‌مندی‌ها اضافه شد",
        }),
    ))
}

#[tracing::instrument(skip_all, fields(user_id = user.id, item_id = id))]
pub async fn update(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    PathId(id): PathId<WishlistItemId>,
    JsonBody(patch): JsonBody<WishlistPatch>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = state
        .db
        .update_wishlist_item(user.id, id, patch)
        .await
        .map_err(|error| ApiError::library(error, "خطا در ویرایش آیتم"))?;
    Ok(Json(ItemResponse {
        item,
        message: "آیتم ویرایش شد",
    }))
}

#[tracing::instrument(skip_all, fields(user_id = user.id, item_id = id))]
pub async fn delete(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    PathId(id): PathId<WishlistItemId>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = state
        .db
        .delete_wishlist_item(user.id, id)
        .await
        .map_err(|error| ApiError::library(error, "خطا در حذف آیتم"))?;
    Ok(Json(ItemResponse {
        item,
        message: "آیتم حذف شد",
    }))
}

/// Moves the item into the library as an unread physical book
#[tracing::instrument(skip_all, fields(user_id = user.id, item_id = id))]
pub async fn buy(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    PathId(id): PathId<WishlistItemId>,
) -> Result<Json<Purchase>, ApiError> {
    let book = state
        .db
        .purchase_wishlist_item(user.id, id)
        .await
        .map_err(|error| match error {
            LibraryError::NotFound(_) => ApiError::not_found("آیتم مورد نظر یافت نشد"),
            other => ApiError::library(other, "خطا در خرید کتاب"),
        })?;
    Ok(Json(Purchase {
        book_id: book.id,
        book,
        message: "کتاب با موفقیت به کتابخانه اضافه شد",
    }))
}
