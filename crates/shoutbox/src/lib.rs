//! thw-shoutbox – Shoutbox des Forums
//!
//! Dieses Crate implementiert:
//! - ShoutService: Kurznachrichten posten (mit Autorisierung) und auflisten
//!
//! # Beispiel
//!
//! ```no_run
//! use thw_auth::AuthorizationGate;
//! use thw_db::SqliteDb;
//! use thw_shoutbox::ShoutService;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let db = Arc::new(SqliteDb::in_memory().await.unwrap());
//!     let gate = AuthorizationGate::neu(db.clone());
//!     let shouts = ShoutService::neu(db, gate);
//!     let neueste = shouts.neueste(None).await.unwrap();
//!     println!("{} Shouts", neueste.len());
//! }
//! ```

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use error::{ShoutError, ShoutResult};
pub use service::{ShoutService, MAX_SHOUT_LAENGE};
pub use types::ShoutNachricht;
