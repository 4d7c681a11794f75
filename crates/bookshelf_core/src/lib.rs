//! `bookshelf_core`
//!
//! Core library of Bookshelf, a personal book library. It owns the database schema and every
//! operation the HTTP server exposes: the book catalog, quotes, the purchase wishlist, the
//! wishlist-to-library conversion and the statistics shown on the account page. Credential
//! issuing and verification live here as well so that the server crate stays a thin layer of
//! routing and JSON mapping.

pub mod auth;
pub mod database;
pub mod errors;
pub mod validation;
