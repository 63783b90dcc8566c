//! SQLite-Backend-Implementierungen fuer alle Repository-Traits

pub mod invites;
pub mod ip_logs;
pub mod pool;
pub mod sessions;
pub mod shouts;
pub mod users;
mod zeit;

pub use pool::SqliteDb;
