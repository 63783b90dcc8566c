//! thw-auth – Auth-Kern des Forums
//!
//! Dieses Crate implementiert:
//! - Passwort-Hashing mit Argon2id
//! - Standing Resolver (Bann/Stummschaltung aus Rolle und Flags)
//! - Session-Management (gehashte Referenzen im Speicher, mit TTL)
//! - Authorization Gate (Login, Posten, Admin-Zugriff)
//! - Moderation (Rolle und Flags konsistent aendern, Sessions widerrufen)
//! - AuthService (Registrierung, Login, Logout, Self-Service)
//! - InviteService (Einladungscodes)

pub mod authorization;
pub mod error;
pub mod invite_service;
pub mod moderation;
pub mod password;
pub mod service;
pub mod session;
pub mod standing;

#[cfg(test)]
mod testutil;

// Bequeme Re-Exporte
pub use authorization::{entscheiden, Aktion, AuthorizationGate, Entscheidung};
pub use error::{AuthError, AuthResult};
pub use invite_service::InviteService;
pub use moderation::{stand_berechnen, ModerationService, ModerationsAenderung};
pub use password::{
    passwort_blind_verifizieren, passwort_hashen, passwort_pruefen, passwort_verifizieren,
};
pub use service::{AuthService, BenutzerUebersicht, Registrierung};
pub use session::{Session, SessionKonfig, SessionStore};
pub use standing::{aufloesen, Stand, Verweigerung};
