//! thw-core – Gemeinsame Typen
//!
//! Dieses Crate stellt die Typen bereit, die von Speicher, Auth-Kern
//! und REST-Schicht gemeinsam genutzt werden.

pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use types::{Persistenz, Rolle, UserId};
