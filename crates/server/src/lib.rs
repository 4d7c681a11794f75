//! `server`
//!
//! The HTTP API of Bookshelf. Handlers are thin: they pull the caller's identity and the request
//! body out of the request, call into `bookshelf_core` and map the outcome to JSON.
pub mod config;
pub mod errors;
pub mod extractors;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
