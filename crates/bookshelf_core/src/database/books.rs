use crate::database::types::{
    BookDetail, BookId, BookPatch, BookRecord, NewBook, QuoteRecord, UserId,
};
use crate::database::{Db, ensure_owner};
use crate::errors::{Entity, LibraryError};
use crate::validation::{BookDraft, validate_book_patch, validate_new_book};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::query_builder::Separated;
use sqlx::{Encode, QueryBuilder, Sqlite, SqliteConnection, Type};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// 1-based page number and page size of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Defaults to the first page of ten, clamping nonsensical values into range
    #[must_use]
    #[inline]
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Number of results before this page. Saturates for pages far past the end.
    const fn offset(self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

#[non_exhaustive]
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub books: Vec<BookRecord>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

/// True if title, author or genre contain `needle`, which must already be lowercase.
/// Case is folded here, SQLite `LIKE` folds ASCII only.
fn matches_search(book: &BookRecord, needle: &str) -> bool {
    [&book.title, &book.author, &book.genre]
        .into_iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Inserts a validated book. Shared with the wishlist conversion, which calls it inside its
/// transaction.
pub(crate) async fn insert_book(
    conn: &mut SqliteConnection,
    owner: UserId,
    draft: &BookDraft,
    created_at: DateTime<Utc>,
) -> Result<BookRecord, LibraryError> {
    sqlx::query_as::<_, BookRecord>(
        "INSERT INTO books (
            title,
            cover_image,
            author,
            translator,
            description,
            country,
            genre,
            page_count,
            format,
            publisher,
            created_at,
            user_id,
            status,
            progress,
            rating,
            review
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        RETURNING *",
    )
    .bind(&draft.title)
    .bind(&draft.cover_image)
    .bind(&draft.author)
    .bind(&draft.translator)
    .bind(&draft.description)
    .bind(&draft.country)
    .bind(&draft.genre)
    .bind(draft.page_count)
    .bind(draft.format)
    .bind(&draft.publisher)
    .bind(created_at)
    .bind(owner)
    .bind(draft.status)
    .bind(draft.progress)
    .bind(draft.rating)
    .bind(&draft.review)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(LibraryError::InsertFailed)
}

/// Appends `column = ?` to the SET list of an update
pub(crate) fn assign<'args, T>(set: &mut Separated<'_, 'args, Sqlite, &'static str>, column: &str, value: T)
where
    T: 'args + Encode<'args, Sqlite> + Type<Sqlite> + Send,
{
    set.push(column);
    set.push_unseparated(" = ");
    set.push_bind_unseparated(value);
}

impl Db {
    /// Adds a book to the caller's library
    /// # Errors
    /// Returns [`LibraryError::Validation`] if a required field is missing.
    #[tracing::instrument(skip(self, input))]
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn create_book(&self, owner: UserId, input: NewBook) -> Result<BookRecord, LibraryError> {
        let draft = validate_new_book(input)?;
        let mut conn = self.pool.acquire().await?;
        let book = insert_book(&mut conn, owner, &draft, Utc::now()).await?;
        tracing::info!(book_id = book.id, "book created");
        Ok(book)
    }

    /// All books of the caller, most recent first
    #[allow(clippy::missing_inline_in_public_items, reason = "Large function")]
    pub async fn list_books(&self, owner: UserId) -> Result<Vec<BookRecord>, LibraryError> {
        let books = sqlx::query_as::<_, BookRecord>(
            "SELECT * FROM books
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// A single book with its quotes. Not scoped to a user, detail pages can be shared.
    /// # Errors
    /// Returns [`LibraryError::NotFound`] if no book has this id.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn book_detail(&self, id: BookId) -> Result<BookDetail, LibraryError> {
        let book = self.find_book(id).await?;
        let quotes = sqlx::query_as::<_, QuoteRecord>(
            "SELECT * FROM quotes WHERE book_id = ?1 ORDER BY id ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(BookDetail { book, quotes })
    }

    pub(crate) async fn find_book(&self, id: BookId) -> Result<BookRecord, LibraryError> {
        sqlx::query_as::<_, BookRecord>("SELECT * FROM books WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LibraryError::NotFound(Entity::Book))
    }

    /// Applies the keys present in `patch` to a book the caller owns
    /// # Errors
    /// [`LibraryError::NotFound`] or [`LibraryError::Forbidden`] before looking at the patch,
    /// then [`LibraryError::EmptyUpdate`] or [`LibraryError::Validation`].
    #[tracing::instrument(skip(self, patch))]
    #[allow(clippy::missing_inline_in_public_items, reason = "Large function")]
    pub async fn update_book(
        &self,
        caller: UserId,
        id: BookId,
        patch: BookPatch,
    ) -> Result<BookRecord, LibraryError> {
        let book = self.find_book(id).await?;
        ensure_owner(book.user_id, caller)?;
        if patch.is_empty() {
            return Err(LibraryError::EmptyUpdate);
        }
        validate_book_patch(&patch)?;

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE books SET ");
        let mut set = builder.separated(", ");
        if let Some(title) = patch.title {
            assign(&mut set, "title", title.trim().to_owned());
        }
        if let Some(cover_image) = patch.cover_image {
            assign(&mut set, "cover_image", cover_image.trim().to_owned());
        }
        if let Some(author) = patch.author {
            assign(&mut set, "author", author.trim().to_owned());
        }
        if let Some(genre) = patch.genre {
            assign(&mut set, "genre", genre.trim().to_owned());
        }
        if let Some(format) = patch.format {
            assign(&mut set, "format", format);
        }
        if let Some(status) = patch.status {
            assign(&mut set, "status", status);
        }
        if let Some(translator) = patch.translator {
            assign(&mut set, "translator", translator);
        }
        if let Some(description) = patch.description {
            assign(&mut set, "description", description);
        }
        if let Some(country) = patch.country {
            assign(&mut set, "country", country);
        }
        if let Some(page_count) = patch.page_count {
            assign(&mut set, "page_count", page_count);
        }
        if let Some(publisher) = patch.publisher {
            assign(&mut set, "publisher", publisher);
        }
        if let Some(progress) = patch.progress {
            assign(&mut set, "progress", progress);
        }
        if let Some(rating) = patch.rating {
            assign(&mut set, "rating", rating);
        }
        if let Some(review) = patch.review {
            assign(&mut set, "review", review);
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" RETURNING *");

        let updated = builder
            .build_query_as::<BookRecord>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LibraryError::NotFound(Entity::Book))?;
        tracing::info!("book updated");
        Ok(updated)
    }

    /// Deletes a book the caller owns, together with its quotes
    /// # Errors
    /// Returns [`LibraryError::NotFound`] or [`LibraryError::Forbidden`].
    #[tracing::instrument(skip(self))]
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn delete_book(&self, caller: UserId, id: BookId) -> Result<(), LibraryError> {
        let book = self.find_book(id).await?;
        ensure_owner(book.user_id, caller)?;

        sqlx::query("DELETE FROM books WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        tracing::info!("book deleted");
        Ok(())
    }

    /// Case-insensitive substring search over title, author and genre of the caller's books.
    /// A blank query matches nothing and does not touch the database.
    #[allow(clippy::missing_inline_in_public_items, reason = "Large function")]
    pub async fn search_books(
        &self,
        owner: UserId,
        query: &str,
        pagination: Pagination,
    ) -> Result<SearchPage, LibraryError> {
        let Pagination { page, limit } = pagination;
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchPage {
                books: Vec::new(),
                total: 0,
                page,
                limit,
                total_pages: 0,
            });
        }

        let needle = query.to_lowercase();
        let matching: Vec<BookRecord> = self
            .list_books(owner)
            .await?
            .into_iter()
            .filter(|book| matches_search(book, &needle))
            .collect();

        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        let skip = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        let books = matching.into_iter().skip(skip).take(take).collect();

        Ok(SearchPage {
            books,
            total,
            page,
            limit,
            total_pages: (total + limit - 1) / limit,
        })
    }
}
