//! thw-db – Datenbank-Abstraktion
//!
//! Dieses Crate stellt das Repository-Pattern fuer Benutzer (Credential
//! Store), Einladungen, Sessions, Shouts und das IP-Protokoll bereit,
//! sowie die SQLite-Implementierung aller Traits.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::DbError;
pub use repository::{
    DatabaseConfig, DbResult, InviteRepository, IpLogRepository, SessionRepository,
    ShoutRepository, UserRepository,
};
pub use sqlite::SqliteDb;
