//! JSON error responses
//!
//! Every failed request answers with `{"error": <message>}`, plus `"details"` listing the
//! offending fields when input was rejected. Messages are in Persian, the display language of the
//! application. Infrastructure failures are logged here and replaced by a message naming the
//! operation that failed.
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bookshelf_core::auth::AuthError;
use bookshelf_core::errors::{Entity, FieldError, LibraryError};
use serde::Serialize;

pub const UNAUTHENTICATED: &str = "توکن نامعتبر است";
pub const FORBIDDEN: &str = "دسترسی غیرمجاز";
pub const INVALID_DATA: &str = "داده‌های نامعتبر";
pub const MALFORMED_BODY: &str = "داده‌های ارسالی نامعتبر است";
pub const INVALID_ID: &str = "شناسه نامعتبر است";
pub const EMPTY_UPDATE: &str = "هیچ داده‌ای برای ویرایش ارسال نشده";
pub const EMAIL_TAKEN: &str = "کاربر با این ایمیل وجود دارد";
pub const SERVER_ERROR: &str = "خطای سرور";

#[derive(Serialize)]
struct ErrorBody<'error> {
    error: &'error str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'error [FieldError]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Vec<FieldError>,
}

impl ApiError {
    #[must_use]
    #[inline]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: Vec::new(),
        }
    }

    #[must_use]
    #[inline]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    #[inline]
    pub fn unauthenticated() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, UNAUTHENTICATED)
    }

    #[must_use]
    #[inline]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Logs `error` and answers with a 500 carrying only `message`
    #[must_use]
    #[allow(clippy::missing_inline_in_public_items, reason = "Error path only")]
    pub fn internal(error: &dyn core::error::Error, message: &str) -> Self {
        tracing::error!("{message}: {error}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Maps a library error to its response. `failure` is the message used if the error is not
    /// the caller's fault.
    #[must_use]
    #[allow(clippy::missing_inline_in_public_items, reason = "Error path only")]
    pub fn library(error: LibraryError, failure: &str) -> Self {
        match error {
            LibraryError::NotFound(entity) => Self::not_found(not_found_message(entity)),
            LibraryError::Forbidden => Self::new(StatusCode::FORBIDDEN, FORBIDDEN),
            LibraryError::Validation(details) => Self {
                status: StatusCode::BAD_REQUEST,
                message: INVALID_DATA.to_owned(),
                details,
            },
            LibraryError::EmptyUpdate => Self::bad_request(EMPTY_UPDATE),
            LibraryError::EmailTaken => Self::bad_request(EMAIL_TAKEN),
            other => Self::internal(&other, failure),
        }
    }

    /// Maps a credential error. Anything but a rejected token is a server fault.
    #[must_use]
    #[allow(clippy::missing_inline_in_public_items, reason = "Error path only")]
    pub fn auth(error: AuthError, failure: &str) -> Self {
        match error {
            AuthError::Unauthenticated => Self::unauthenticated(),
            other => Self::internal(&other, failure),
        }
    }
}

const fn not_found_message(entity: Entity) -> &'static str {
    match entity {
        Entity::User => "کاربر یافت نشد",
        Entity::Book => "کتاب پیدا نشد",
        Entity::Quote => "نقل قول پیدا نشد",
        Entity::WishlistItem => "آیتم پیدا نشد یا متعلق به شما نیست",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            details: Some(self.details.as_slice()).filter(|details| !details.is_empty()),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("rejected request body: {}", rejection.body_text());
        Self::bad_request(MALFORMED_BODY)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("rejected path: {}", rejection.body_text());
        Self::bad_request(INVALID_ID)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("rejected query string: {}", rejection.body_text());
        Self::bad_request(MALFORMED_BODY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_library_error_mapping() {
        let cases = [
            (LibraryError::NotFound(Entity::Book), StatusCode::NOT_FOUND),
            (LibraryError::Forbidden, StatusCode::FORBIDDEN),
            (LibraryError::invalid("title", "x"), StatusCode::BAD_REQUEST),
            (LibraryError::EmptyUpdate, StatusCode::BAD_REQUEST),
            (LibraryError::EmailTaken, StatusCode::BAD_REQUEST),
            (LibraryError::InsertFailed, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::library(error, SERVER_ERROR).status, status);
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let error = ApiError::library(LibraryError::InsertFailed, "خطا در ایجاد کتاب");

        assert_eq!(error.message, "خطا در ایجاد کتاب");
        assert!(error.details.is_empty());
    }

    #[test]
    fn test_validation_keeps_field_details() {
        let error = ApiError::library(LibraryError::invalid("title", "too long"), SERVER_ERROR);

        assert_eq!(error.message, INVALID_DATA);
        assert_eq!(error.details, vec![FieldError::new("title", "too long")]);
    }
}
