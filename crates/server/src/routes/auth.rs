use crate::errors::{ApiError, SERVER_ERROR};
use crate::extractors::{credential_cookie, expired_cookie, AuthenticatedUser, JsonBody};
use crate::routes::Message;
use crate::state::AppState;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bookshelf_core::auth::password::{hash_password, verify_password};
use bookshelf_core::auth::AuthError;
use bookshelf_core::database::types::UserProfile;
use serde::{Deserialize, Serialize};

const CREDENTIALS_REQUIRED: &str = "ایمیل و پسورد لازم است";
const BAD_CREDENTIALS: &str = "ایمیل یا پسورد اشتباه است";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserProfile,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// Runs password hashing off the async workers
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|error| ApiError::internal(&error, SERVER_ERROR))?
        .map_err(|error| ApiError::auth(error, SERVER_ERROR))
}

#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let (Some(email), Some(password)) = (non_blank(request.email), request.password) else {
        return Err(ApiError::bad_request(CREDENTIALS_REQUIRED));
    };
    if password.is_empty() {
        return Err(ApiError::bad_request(CREDENTIALS_REQUIRED));
    }

    let cost = state.bcrypt_cost;
    let hash = blocking(move || hash_password(&password, cost)).await?;
    let name = non_blank(request.name);
    let user = state
        .db
        .create_user(&email, name.as_deref(), &hash)
        .await
        .map_err(|error| ApiError::library(error, SERVER_ERROR))?;
    tracing::info!(user_id = user.id, "user registered");

    Ok(Json(RegisterResponse {
        message: "ثبت‌نام موفق",
        user,
    }))
}

/// Checks the password and sets the credential cookie. Unknown email, missing password hash and
/// wrong password all get the same answer.
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(email), Some(password)) = (non_blank(request.email), request.password) else {
        return Err(ApiError::bad_request(CREDENTIALS_REQUIRED));
    };

    let user = state
        .db
        .find_user_by_email(&email)
        .await
        .map_err(|error| ApiError::library(error, SERVER_ERROR))?;
    let Some((user_id, Some(hash))) = user.map(|user| (user.id, user.password)) else {
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, BAD_CREDENTIALS));
    };

    let matches = blocking(move || match verify_password(&password, &hash) {
        Ok(matches) => Ok(matches),
        Err(error) => {
            tracing::warn!(user_id, "stored password hash is unusable: {error}");
            Ok(false)
        }
    })
    .await?;
    if !matches {
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, BAD_CREDENTIALS));
    }

    let token = state
        .keys
        .issue(user_id)
        .map_err(|error| ApiError::auth(error, SERVER_ERROR))?;
    let cookie = credential_cookie(&token, state.keys.lifetime().num_seconds(), state.cookie_secure);
    tracing::info!(user_id, "user logged in");

    Ok(([(SET_COOKIE, cookie)], Json(Message::new("ورود موفق"))))
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(SET_COOKIE, expired_cookie(state.cookie_secure))],
        Json(Message::new("خروج موفق")),
    )
}

/// The caller's profile. A valid token whose user is gone counts as unauthenticated.
#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<MeResponse>, ApiError> {
    let profile = state
        .db
        .user_profile(user.id)
        .await
        .map_err(|error| ApiError::library(error, SERVER_ERROR))?
        .ok_or_else(ApiError::unauthenticated)?;
    Ok(Json(MeResponse { user: profile }))
}
