#![allow(clippy::result_large_err)]
//! thw-api – REST-Schnittstelle des Forums
//!
//! Axum-Router unter `/api/...` (JSON, camelCase) plus `/metrics`.
//! Die Session wird aus `Authorization: Bearer <ref>` oder dem
//! `thw_session`-Cookie gelesen und bei jeder Anfrage serverseitig geprueft.

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use rate_limit::{RateLimitKonfig, RateLimiter};
pub use routes::router;
pub use server::{ApiServer, ApiServerKonfig};
pub use state::AppState;
