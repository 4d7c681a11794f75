//! Buying a wishlist item: the item becomes an unread physical book in the library and leaves the
//! wishlist, both or neither.
use crate::database::books::insert_book;
use crate::database::types::{BookFormat, BookRecord, BookStatus, UserId, WishlistItemId, WishlistRecord};
use crate::database::Db;
use crate::errors::{Entity, LibraryError};
use crate::validation::BookDraft;
use chrono::Utc;
use sqlx::SqliteConnection;

/// Genre of a bought book whose wishlist entry had none
pub const UNKNOWN_GENRE: &str = "نامشخص";
/// Cover of a bought book until the user uploads one
pub const PLACEHOLDER_COVER: &str = "/placeholder-book.jpg";

fn draft_from(item: WishlistRecord) -> BookDraft {
    BookDraft {
        title: item.title,
        cover_image: PLACEHOLDER_COVER.to_owned(),
        author: item.author,
        genre: item.genre.unwrap_or_else(|| UNKNOWN_GENRE.to_owned()),
        format: BookFormat::Physical,
        translator: item.translator,
        description: item.note,
        country: None,
        page_count: None,
        publisher: item.publisher,
        status: BookStatus::Unread,
        progress: Some(0),
        rating: None,
        review: None,
    }
}

async fn convert(
    conn: &mut SqliteConnection,
    owner: UserId,
    item_id: WishlistItemId,
) -> Result<BookRecord, LibraryError> {
    let item = sqlx::query_as::<_, WishlistRecord>(
        "SELECT * FROM wishlist_items WHERE id = ?1 AND user_id = ?2",
    )
    .bind(item_id)
    .bind(owner)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(LibraryError::NotFound(Entity::WishlistItem))?;

    let book = insert_book(conn, owner, &draft_from(item), Utc::now()).await?;

    let removed = sqlx::query("DELETE FROM wishlist_items WHERE id = ?1 AND user_id = ?2")
        .bind(item_id)
        .bind(owner)
        .execute(&mut *conn)
        .await?;
    if removed.rows_affected() == 0 {
        return Err(LibraryError::NotFound(Entity::WishlistItem));
    }
    Ok(book)
}

impl Db {
    /// Moves one of the caller's wishlist items into their library as a single transaction
    /// # Errors
    /// Returns [`LibraryError::NotFound`] if the caller has no such item. On any failure the
    /// wishlist and the library are left as they were.
    #[tracing::instrument(skip(self))]
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn purchase_wishlist_item(
        &self,
        owner: UserId,
        item_id: WishlistItemId,
    ) -> Result<BookRecord, LibraryError> {
        let mut tx = self.pool.begin().await?;

        match convert(&mut tx, owner, item_id).await {
            Ok(book) => {
                tx.commit().await?;
                tracing::info!(book_id = book.id, "wishlist item added to library");
                Ok(book)
            }
            Err(error) => {
                tx.rollback().await.ok();
                Err(error)
            }
        }
    }
}
