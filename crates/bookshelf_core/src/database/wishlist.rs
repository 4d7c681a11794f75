use crate::database::types::{NewWishlistItem, UserId, WishlistItemId, WishlistPatch, WishlistRecord};
use crate::database::Db;
use crate::database::books::assign;
use crate::errors::{Entity, LibraryError};
use crate::validation::{validate_new_wishlist_item, validate_wishlist_patch};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

/// Columns the wishlist can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WishlistSortField {
    Title,
    Author,
    Publisher,
    Genre,
    Priority,
    #[default]
    CreatedAt,
}

impl WishlistSortField {
    /// Parses the client-facing name, `None` for anything off the whitelist
    #[must_use]
    #[inline]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "author" => Some(Self::Author),
            "publisher" => Some(Self::Publisher),
            "genre" => Some(Self::Genre),
            "priority" => Some(Self::Priority),
            "createdAt" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    #[must_use]
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Publisher => "publisher",
            Self::Genre => "genre",
            Self::Priority => "priority",
            Self::CreatedAt => "createdAt",
        }
    }

    /// SQL expression to order by. Priority sorts by rank, most wanted first.
    const fn order_expression(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Publisher => "publisher",
            Self::Genre => "genre",
            Self::Priority => {
                "CASE priority
                    WHEN 'MUST_HAVE' THEN 0
                    WHEN 'WANT_IT' THEN 1
                    WHEN 'NICE_TO_HAVE' THEN 2
                    WHEN 'IF_EXTRA_MONEY' THEN 3
                    ELSE 4
                END"
            }
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WishlistSort {
    pub field: WishlistSortField,
    pub order: SortOrder,
}

impl WishlistSort {
    /// Unknown sort fields fall back to newest first, whatever order was asked for
    #[must_use]
    #[inline]
    pub fn from_query(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        let Some(field) = sort_by.and_then(WishlistSortField::parse) else {
            return Self::default();
        };
        let order = match sort_order {
            Some(order) if order.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        };
        Self { field, order }
    }
}

impl Db {
    /// Adds an item to the caller's wishlist
    /// # Errors
    /// Returns [`LibraryError::Validation`] listing every invalid field.
    #[tracing::instrument(skip(self, input))]
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn create_wishlist_item(
        &self,
        owner: UserId,
        input: NewWishlistItem,
    ) -> Result<WishlistRecord, LibraryError> {
        let draft = validate_new_wishlist_item(input)?;

        let item = sqlx::query_as::<_, WishlistRecord>(
            "INSERT INTO wishlist_items (
                user_id,
                title,
                author,
                publisher,
                genre,
                translator,
                note,
                priority,
                created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING *",
        )
        .bind(owner)
        .bind(draft.title)
        .bind(draft.author)
        .bind(draft.publisher)
        .bind(draft.genre)
        .bind(draft.translator)
        .bind(draft.note)
        .bind(draft.priority)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(LibraryError::InsertFailed)?;
        tracing::info!(item_id = item.id, "wishlist item created");
        Ok(item)
    }

    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn list_wishlist(
        &self,
        owner: UserId,
        sort: WishlistSort,
    ) -> Result<Vec<WishlistRecord>, LibraryError> {
        // Both fragments come from closed enums, nothing user supplied reaches the SQL text
        let sql = format!(
            "SELECT * FROM wishlist_items
            WHERE user_id = ?1
            ORDER BY {expression} {direction}, id {direction}",
            expression = sort.field.order_expression(),
            direction = sort.order.keyword(),
        );
        let items = sqlx::query_as::<_, WishlistRecord>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// Applies the present keys of `patch` to one of the caller's items
    /// # Errors
    /// [`LibraryError::EmptyUpdate`] or [`LibraryError::Validation`] before touching the
    /// database, [`LibraryError::NotFound`] if the caller has no item with this id.
    #[tracing::instrument(skip(self, patch))]
    #[allow(clippy::missing_inline_in_public_items, reason = "Large function")]
    pub async fn update_wishlist_item(
        &self,
        owner: UserId,
        id: WishlistItemId,
        patch: WishlistPatch,
    ) -> Result<WishlistRecord, LibraryError> {
        let changes = validate_wishlist_patch(patch)?;

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE wishlist_items SET ");
        let mut set = builder.separated(", ");
        if let Some(title) = changes.title {
            assign(&mut set, "title", title);
        }
        if let Some(author) = changes.author {
            assign(&mut set, "author", author);
        }
        if let Some(publisher) = changes.publisher {
            assign(&mut set, "publisher", publisher);
        }
        if let Some(genre) = changes.genre {
            assign(&mut set, "genre", genre);
        }
        if let Some(translator) = changes.translator {
            assign(&mut set, "translator", translator);
        }
        if let Some(note) = changes.note {
            assign(&mut set, "note", note);
        }
        if let Some(priority) = changes.priority {
            assign(&mut set, "priority", priority);
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" AND user_id = ");
        builder.push_bind(owner);
        builder.push(" RETURNING *");

        let item = builder
            .build_query_as::<WishlistRecord>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LibraryError::NotFound(Entity::WishlistItem))?;
        tracing::info!("wishlist item updated");
        Ok(item)
    }

    /// Removes one of the caller's items and returns it
    /// # Errors
    /// Returns [`LibraryError::NotFound`] if the caller has no item with this id.
    #[tracing::instrument(skip(self))]
    #[allow(clippy::missing_inline_in_public_items, reason = "Called rarely")]
    pub async fn delete_wishlist_item(
        &self,
        owner: UserId,
        id: WishlistItemId,
    ) -> Result<WishlistRecord, LibraryError> {
        let item = sqlx::query_as::<_, WishlistRecord>(
            "DELETE FROM wishlist_items WHERE id = ?1 AND user_id = ?2 RETURNING *",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(LibraryError::NotFound(Entity::WishlistItem))?;
        tracing::info!("wishlist item deleted");
        Ok(item)
    }
}
