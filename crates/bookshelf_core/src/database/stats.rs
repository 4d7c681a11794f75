use crate::database::types::{BookFormat, BookStatus, UserId};
use crate::database::Db;
use crate::errors::LibraryError;
use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

/// Longest breakdowns are cut to this many entries
const TOP_ENTRIES: i64 = 10;
const TREND_MONTHS: u32 = 12;

#[non_exhaustive]
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LibraryStats {
    pub overview: Overview,
    pub breakdowns: Breakdowns,
    pub trends: Trends,
}

/// Headline numbers of a library. Aggregates over no rows are reported as 0.
#[non_exhaustive]
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_books: i64,
    pub total_pages: i64,
    pub total_pages_read: i64,
    pub finished_books: i64,
    pub reading_books: i64,
    pub unread_books: i64,
    pub total_wishlist: i64,
    pub avg_rating: f64,
    pub avg_progress: i64,
}

/// One bar or slice of a chart
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BreakdownEntry {
    pub name: String,
    pub count: i64,
}

impl BreakdownEntry {
    fn new(name: impl Into<String>, count: i64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

#[non_exhaustive]
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Breakdowns {
    pub by_publisher: Vec<BreakdownEntry>,
    pub by_author: Vec<BreakdownEntry>,
    pub by_country: Vec<BreakdownEntry>,
    pub by_genre: Vec<BreakdownEntry>,
    pub by_status: Vec<BreakdownEntry>,
    pub by_format: Vec<BreakdownEntry>,
    pub by_rating: Vec<BreakdownEntry>,
}

/// Books added per month, keyed `YYYY-MM`, oldest month first
#[non_exhaustive]
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Trends {
    pub monthly: Vec<BreakdownEntry>,
}

#[derive(sqlx::FromRow)]
struct Counters {
    total_books: i64,
    total_pages: i64,
    finished_books: i64,
    reading_books: i64,
    unread_books: i64,
}

#[derive(sqlx::FromRow)]
struct Progress {
    pages_read: Option<f64>,
    avg_progress: Option<f64>,
}

/// Rounds half away from zero to one decimal
fn one_decimal(value: Option<f64>) -> f64 {
    value.map_or(0.0, |value| (value * 10.0).round() / 10.0)
}

#[allow(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    reason = "Percentages and page sums are far below i64::MAX"
)]
fn whole(value: Option<f64>) -> i64 {
    value.map_or(0, |value| value.round() as i64)
}

/// Runs a `SELECT <name>, COUNT(*)` query bound to the owner
async fn grouped(
    pool: &SqlitePool,
    sql: &str,
    owner: UserId,
) -> Result<Vec<BreakdownEntry>, LibraryError> {
    let rows = sqlx::query_as::<_, (String, i64)>(sql)
        .bind(owner)
        .bind(TOP_ENTRIES)
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(name, count)| BreakdownEntry::new(name, count))
        .collect())
}

/// Top entries of a text column, nulls left out
fn top_of(column: &str) -> String {
    format!(
        "SELECT {column}, COUNT(*) FROM books
        WHERE user_id = ?1 AND {column} IS NOT NULL
        GROUP BY {column}
        ORDER BY COUNT(*) DESC, {column} ASC
        LIMIT ?2"
    )
}

impl Db {
    /// Statistics over the caller's library and wishlist. The monthly trend covers the twelve
    /// months before `now`.
    /// # Errors
    /// Fails as a whole if any of the underlying queries fails.
    #[tracing::instrument(skip(self, now))]
    #[allow(clippy::missing_inline_in_public_items, reason = "Large function")]
    pub async fn library_stats(
        &self,
        owner: UserId,
        now: DateTime<Utc>,
    ) -> Result<LibraryStats, LibraryError> {
        let pool = &self.pool;
        let since = now.checked_sub_months(Months::new(TREND_MONTHS)).unwrap_or(now);

        let counters = sqlx::query_as::<_, Counters>(
            "SELECT
                COUNT(*) AS total_books,
                COALESCE(SUM(page_count), 0) AS total_pages,
                COUNT(CASE WHEN status = 'FINISHED' THEN 1 END) AS finished_books,
                COUNT(CASE WHEN status = 'READING' THEN 1 END) AS reading_books,
                COUNT(CASE WHEN status = 'UNREAD' THEN 1 END) AS unread_books
            FROM books
            WHERE user_id = ?1",
        )
        .bind(owner)
        .fetch_one(pool);
        let wishlist = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM wishlist_items WHERE user_id = ?1",
        )
        .bind(owner)
        .fetch_one(pool);
        let avg_rating = sqlx::query_scalar::<_, Option<f64>>(
            "SELECT AVG(rating) FROM books WHERE user_id = ?1 AND rating IS NOT NULL",
        )
        .bind(owner)
        .fetch_one(pool);
        let progress = sqlx::query_as::<_, Progress>(
            "SELECT
                SUM(progress * page_count / 100.0) AS pages_read,
                AVG(progress) AS avg_progress
            FROM books
            WHERE user_id = ?1 AND progress > 0",
        )
        .bind(owner)
        .fetch_one(pool);

        let by_publisher_sql = top_of("publisher");
        let by_author_sql = top_of("author");
        let by_country_sql = top_of("country");
        let by_genre_sql = top_of("genre");
        let by_status = sqlx::query_as::<_, (BookStatus, i64)>(
            "SELECT status, COUNT(*) FROM books WHERE user_id = ?1 GROUP BY status ORDER BY status",
        )
        .bind(owner)
        .fetch_all(pool);
        let by_format = sqlx::query_as::<_, (BookFormat, i64)>(
            "SELECT format, COUNT(*) FROM books WHERE user_id = ?1 GROUP BY format ORDER BY format",
        )
        .bind(owner)
        .fetch_all(pool);
        let by_rating = sqlx::query_as::<_, (i64, i64)>(
            "SELECT rating, COUNT(*) FROM books
            WHERE user_id = ?1 AND rating IS NOT NULL
            GROUP BY rating
            ORDER BY rating ASC",
        )
        .bind(owner)
        .fetch_all(pool);
        let monthly = sqlx::query_as::<_, (String, i64)>(
            "SELECT strftime('%Y-%m', created_at) AS month, COUNT(*) FROM books
            WHERE user_id = ?1 AND datetime(created_at) >= datetime(?2)
            GROUP BY month
            ORDER BY month ASC",
        )
        .bind(owner)
        .bind(since)
        .fetch_all(pool);

        let (counters, total_wishlist, avg_rating, progress, by_status, by_format, by_rating, monthly) =
            futures::try_join!(
                counters, wishlist, avg_rating, progress, by_status, by_format, by_rating, monthly
            )?;
        let (by_publisher, by_author, by_country, by_genre) = futures::try_join!(
            grouped(pool, &by_publisher_sql, owner),
            grouped(pool, &by_author_sql, owner),
            grouped(pool, &by_country_sql, owner),
            grouped(pool, &by_genre_sql, owner),
        )?;

        Ok(LibraryStats {
            overview: Overview {
                total_books: counters.total_books,
                total_pages: counters.total_pages,
                total_pages_read: whole(progress.pages_read),
                finished_books: counters.finished_books,
                reading_books: counters.reading_books,
                unread_books: counters.unread_books,
                total_wishlist,
                avg_rating: one_decimal(avg_rating),
                avg_progress: whole(progress.avg_progress),
            },
            breakdowns: Breakdowns {
                by_publisher,
                by_author,
                by_country,
                by_genre,
                by_status: by_status
                    .into_iter()
                    .map(|(status, count)| BreakdownEntry::new(status.label(), count))
                    .collect(),
                by_format: by_format
                    .into_iter()
                    .map(|(format, count)| BreakdownEntry::new(format.label(), count))
                    .collect(),
                by_rating: by_rating
                    .into_iter()
                    .map(|(rating, count)| BreakdownEntry::new(format!("{rating} ستاره"), count))
                    .collect(),
            },
            trends: Trends {
                monthly: monthly
                    .into_iter()
                    .map(|(month, count)| BreakdownEntry::new(month, count))
                    .collect(),
            },
        })
    }
}
