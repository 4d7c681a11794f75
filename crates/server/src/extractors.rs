//! Request extractors that answer with [`ApiError`] bodies instead of axum's plain text rejections
use crate::errors::ApiError;
use crate::state::AppState;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use bookshelf_core::database::types::UserId;

/// Name of the cookie carrying the credential token
pub const TOKEN_COOKIE: &str = "token";

/// JSON body, rejected with a 400 if it is malformed or has unexpected keys
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Path parameters, rejected with a 400 if they do not parse
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathId<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

/// The caller, as proven by a valid credential token. Handlers that take this never run for
/// anonymous requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
}

/// Value of the credential cookie, if the request carries one
fn token_from_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|&(name, _)| name == TOKEN_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

fn token_from_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_cookie(&parts.headers)
            .or_else(|| token_from_bearer(&parts.headers))
            .ok_or_else(ApiError::unauthenticated)?;
        let id = state
            .keys
            .verify(token)
            .map_err(|_| ApiError::unauthenticated())?;
        Ok(Self { id })
    }
}

/// `Set-Cookie` value storing `token` for `max_age_seconds`
#[must_use]
#[inline]
pub fn credential_cookie(token: &str, max_age_seconds: i64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{TOKEN_COOKIE}={token}; HttpOnly; Path=/; Max-Age={max_age_seconds}; SameSite=Strict{secure}")
}

/// `Set-Cookie` value that removes the credential cookie
#[must_use]
#[inline]
pub fn expired_cookie(secure: bool) -> String {
    credential_cookie("", 0, secure)
}
