use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize};

pub type UserId = i64;
pub type BookId = i64;
pub type QuoteId = i64;
pub type WishlistItemId = i64;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookFormat {
    Physical,
    Electronic,
}

impl BookFormat {
    /// Label shown in charts
    #[must_use]
    #[inline]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Physical => "فیزیکی",
            Self::Electronic => "الکترونیکی",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookStatus {
    #[default]
    Unread,
    Reading,
    Finished,
}

impl BookStatus {
    /// Label shown in charts
    #[must_use]
    #[inline]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unread => "خوانده نشده",
            Self::Reading => "در حال خواندن",
            Self::Finished => "تمام شده",
        }
    }
}

/// How badly a wishlist item is wanted, from most to least
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    MustHave,
    WantIt,
    NiceToHave,
    IfExtraMoney,
    NotImportant,
}

impl Priority {
    pub const ALL: [Self; 5] = [
        Self::MustHave,
        Self::WantIt,
        Self::NiceToHave,
        Self::IfExtraMoney,
        Self::NotImportant,
    ];

    #[must_use]
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MustHave => "MUST_HAVE",
            Self::WantIt => "WANT_IT",
            Self::NiceToHave => "NICE_TO_HAVE",
            Self::IfExtraMoney => "IF_EXTRA_MONEY",
            Self::NotImportant => "NOT_IMPORTANT",
        }
    }
}

/// Error returned when a string names none of the [`Priority`] levels
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority `{0}`")]
pub struct UnknownPriority(pub String);

impl FromStr for Priority {
    type Err = UnknownPriority;

    #[inline]
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == value)
            .ok_or_else(|| UnknownPriority(value.to_owned()))
    }
}

#[non_exhaustive]
#[derive(Serialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRecord {
    pub id: UserId,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

/// The part of a user that is safe to hand back to clients
#[non_exhaustive]
#[derive(Serialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub id: BookId,
    pub title: String,
    pub cover_image: String,
    pub author: String,
    pub translator: Option<String>,
    pub description: Option<String>,
    pub country: Option<String>,
    pub genre: String,
    pub page_count: Option<i64>,
    pub format: BookFormat,
    pub publisher: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_id: UserId,
    pub status: BookStatus,
    pub progress: Option<i64>,
    pub rating: Option<i64>,
    pub review: Option<String>,
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    pub id: QuoteId,
    pub content: String,
    pub page: Option<i64>,
    pub book_id: BookId,
}

/// A book together with its quotes, in insertion order
#[non_exhaustive]
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: BookRecord,
    pub quotes: Vec<QuoteRecord>,
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WishlistRecord {
    pub id: WishlistItemId,
    pub user_id: UserId,
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub genre: Option<String>,
    pub translator: Option<String>,
    pub note: Option<String>,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

/// Request body for a new book. Required fields are optional here so that a missing field is
/// reported as a validation error instead of a parse error.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: Option<String>,
    pub cover_image: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub format: Option<BookFormat>,
    pub translator: Option<String>,
    pub description: Option<String>,
    pub country: Option<String>,
    pub page_count: Option<i64>,
    pub publisher: Option<String>,
    pub status: Option<BookStatus>,
    pub progress: Option<i64>,
    pub rating: Option<i64>,
    pub review: Option<String>,
}

/// Partial update of a book. Absent keys are left untouched, nullable columns can be cleared by
/// sending `null`. Keys that are not listed here are rejected.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BookPatch {
    pub title: Option<String>,
    pub cover_image: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub format: Option<BookFormat>,
    pub status: Option<BookStatus>,
    #[serde(default, deserialize_with = "present")]
    pub translator: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub country: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub page_count: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub publisher: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub progress: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub rating: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub review: Option<Option<String>>,
}

impl BookPatch {
    /// True if applying the patch would not change any column
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.cover_image.is_none()
            && self.author.is_none()
            && self.genre.is_none()
            && self.format.is_none()
            && self.status.is_none()
            && self.translator.is_none()
            && self.description.is_none()
            && self.country.is_none()
            && self.page_count.is_none()
            && self.publisher.is_none()
            && self.progress.is_none()
            && self.rating.is_none()
            && self.review.is_none()
    }
}

/// Request body for a new wishlist item. Priority stays a string until validation so that an
/// unknown level ends up in the list of field errors.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewWishlistItem {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub genre: Option<String>,
    pub translator: Option<String>,
    pub note: Option<String>,
    pub priority: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WishlistPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub publisher: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub genre: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub translator: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub note: Option<Option<String>>,
    pub priority: Option<String>,
}

impl WishlistPatch {
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.publisher.is_none()
            && self.genre.is_none()
            && self.translator.is_none()
            && self.note.is_none()
            && self.priority.is_none()
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewQuote {
    pub content: Option<String>,
    pub page: Option<i64>,
    pub book_id: Option<BookId>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct QuoteUpdate {
    pub content: Option<String>,
    pub page: Option<i64>,
}

/// Distinguishes a key sent as `null` (`Some(None)`) from a missing key (`None`, via
/// `#[serde(default)]`)
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_priority_parsing() {
        assert_eq!("MUST_HAVE".parse::<Priority>(), Ok(Priority::MustHave));
        assert_eq!(
            "NOT_IMPORTANT".parse::<Priority>(),
            Ok(Priority::NotImportant)
        );
        assert!("must_have".parse::<Priority>().is_err());
        assert!("".parse::<Priority>().is_err());
    }

    #[test]
    fn test_book_patch_distinguishes_null_from_missing() {
        let patch: BookPatch =
            serde_json::from_str(r#"{"publisher": null, "title": "Dune"}"#).unwrap();

        assert_eq!(patch.publisher, Some(None));
        assert_eq!(patch.translator, None);
        assert_eq!(patch.title.as_deref(), Some("Dune"));
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_book_patch_rejects_unknown_keys() {
        let result = serde_json::from_str::<BookPatch>(r#"{"userId": 7}"#);

        assert!(result.is_err());
    }

    #[test]
    fn test_empty_patch() {
        let patch: BookPatch = serde_json::from_str("{}").unwrap();

        assert!(patch.is_empty());
    }
}
