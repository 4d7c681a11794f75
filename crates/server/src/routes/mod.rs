//! HTTP routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | POST | /auth/register | `auth::register` |
//! | POST | /auth/login | `auth::login` |
//! | POST | /auth/logout | `auth::logout` |
//! | GET | /auth/me | `auth::me` |
//! | GET, POST | /books | `books::list`, `books::create` |
//! | GET | /books/search | `books::search` |
//! | GET, PUT, DELETE | /books/{id} | `books::get`, `books::update`, `books::delete` |
//! | GET, POST | /wishlist | `wishlist::list`, `wishlist::create` |
//! | PUT, DELETE | /wishlist/{id} | `wishlist::update`, `wishlist::delete` |
//! | POST | /wishlist/{id}/buy | `wishlist::buy` |
//! | POST | /quotes | `quotes::create` |
//! | GET, PUT, DELETE | /quotes/{id} | `quotes::get`, `quotes::update`, `quotes::delete` |
//! | GET | /account/stats | `account::stats` |
pub mod account;
pub mod auth;
pub mod books;
pub mod quotes;
pub mod wishlist;

use crate::state::AppState;
use axum::routing::{get, post, put};
use axum::Router;
use serde::Serialize;

/// Body of responses that only confirm an action
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

impl Message {
    #[must_use]
    #[inline]
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// All routes, sharing `state`
#[allow(clippy::missing_inline_in_public_items, reason = "Called once at startup")]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/books", get(books::list).post(books::create))
        .route("/books/search", get(books::search))
        .route(
            "/books/{id}",
            get(books::get).put(books::update).delete(books::delete),
        )
        .route("/wishlist", get(wishlist::list).post(wishlist::create))
        .route("/wishlist/{id}", put(wishlist::update).delete(wishlist::delete))
        .route("/wishlist/{id}/buy", post(wishlist::buy))
        .route("/quotes", post(quotes::create))
        .route(
            "/quotes/{id}",
            get(quotes::get).put(quotes::update).delete(quotes::delete),
        )
        .route("/account/stats", get(account::stats))
        .with_state(state)
}
