use crate::database::types::{NewQuote, QuoteId, QuoteRecord, QuoteUpdate, UserId};
use crate::database::{Db, ensure_owner};
use crate::errors::{Entity, LibraryError};

/// Blank content is treated like missing content
fn required_content(content: Option<String>) -> Result<String, LibraryError> {
    content
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| LibraryError::invalid("content", "محتوای نقل قول ضروری است"))
}

/// Page 0 means "no page", like a missing page
fn page_or_null(page: Option<i64>) -> Option<i64> {
    page.filter(|page| *page != 0)
}

impl Db {
    /// Attaches a quote to a book the caller owns
    /// # Errors
    /// [`LibraryError::Validation`] for missing content or book id, then
    /// [`LibraryError::NotFound`] or [`LibraryError::Forbidden`] for the parent book.
    #[tracing::instrument(skip(self, input))]
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn create_quote(
        &self,
        caller: UserId,
        input: NewQuote,
    ) -> Result<QuoteRecord, LibraryError> {
        let Some(book_id) = input.book_id else {
            return Err(LibraryError::invalid("bookId", "شناسه کتاب ضروری است"));
        };
        let content = required_content(input.content)?;

        let book = self.find_book(book_id).await?;
        ensure_owner(book.user_id, caller)?;

        let quote = sqlx::query_as::<_, QuoteRecord>(
            "INSERT INTO quotes (content, page, book_id)
            VALUES (?1, ?2, ?3)
            RETURNING *",
        )
        .bind(content)
        .bind(page_or_null(input.page))
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(LibraryError::InsertFailed)?;
        tracing::info!(quote_id = quote.id, "quote created");
        Ok(quote)
    }

    /// A single quote, not scoped to a user
    /// # Errors
    /// Returns [`LibraryError::NotFound`] if no quote has this id.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn quote(&self, id: QuoteId) -> Result<QuoteRecord, LibraryError> {
        sqlx::query_as::<_, QuoteRecord>("SELECT * FROM quotes WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LibraryError::NotFound(Entity::Quote))
    }

    /// Owner of a quote, derived through its book
    async fn quote_owner(&self, id: QuoteId) -> Result<UserId, LibraryError> {
        sqlx::query_scalar::<_, UserId>(
            "SELECT books.user_id
            FROM quotes
            JOIN books ON books.id = quotes.book_id
            WHERE quotes.id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(LibraryError::NotFound(Entity::Quote))
    }

    /// Replaces content and page of a quote whose book the caller owns
    /// # Errors
    /// [`LibraryError::Validation`] for missing content, then [`LibraryError::NotFound`] or
    /// [`LibraryError::Forbidden`].
    #[tracing::instrument(skip(self, update))]
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn update_quote(
        &self,
        caller: UserId,
        id: QuoteId,
        update: QuoteUpdate,
    ) -> Result<QuoteRecord, LibraryError> {
        let content = required_content(update.content)?;
        ensure_owner(self.quote_owner(id).await?, caller)?;

        let quote = sqlx::query_as::<_, QuoteRecord>(
            "UPDATE quotes SET content = ?1, page = ?2 WHERE id = ?3 RETURNING *",
        )
        .bind(content)
        .bind(page_or_null(update.page))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(LibraryError::NotFound(Entity::Quote))?;
        tracing::info!("quote updated");
        Ok(quote)
    }

    /// Deletes a quote whose book the caller owns
    /// # Errors
    /// Returns [`LibraryError::NotFound`] or [`LibraryError::Forbidden`].
    #[tracing::instrument(skip(self))]
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn delete_quote(&self, caller: UserId, id: QuoteId) -> Result<(), LibraryError> {
        ensure_owner(self.quote_owner(id).await?, caller)?;

        sqlx::query("DELETE FROM quotes WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        tracing::info!("quote deleted");
        Ok(())
    }
}
