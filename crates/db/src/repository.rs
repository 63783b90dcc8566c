//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Geschaeftslogik im Auth-Kern von
//! der konkreten Datenbank-Implementierung. Die SQLite-Implementierungen
//! liegen in [`crate::sqlite`]; Tests der oberen Schichten verwenden
//! In-Memory-Fakes.

use std::time::Duration;

use thw_core::UserId;

use crate::error::DbError;
use crate::models::{
    BenutzerRecord, EinladungRecord, IpLogRecord, NeueEinladung, NeueSession, NeuerBenutzer,
    NeuerShout, ProfilUpdate, SessionRecord, ShoutRecord, StandUpdate,
};

/// Result-Alias fuer alle Repository-Operationen
pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://thw_club.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
    /// Maximale Wartezeit auf eine freie Pool-Verbindung
    pub acquire_timeout: Duration,
    /// Maximale Wartezeit auf eine gesperrte Datenbank
    pub busy_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://thw_club.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Credential Store: Benutzerkonten inklusive Geheimnis und Moderationsstand
#[allow(async_fn_in_trait)]
pub trait UserRepository: Send + Sync {
    /// Legt einen Benutzer an und verbraucht dabei den Einladungscode.
    ///
    /// Einladungspruefung, Duplikatpruefung, Insert und Dekrement laufen in
    /// einer Transaktion. Bei jedem Fehler bleibt der Datenbestand unveraendert.
    async fn create(&self, data: NeuerBenutzer<'_>, einladungscode: &str)
        -> DbResult<BenutzerRecord>;

    async fn get_by_id(&self, id: UserId) -> DbResult<Option<BenutzerRecord>>;

    /// Sucht per Benutzername ODER E-Mail, ohne Gross-/Kleinschreibung
    async fn find_by_identifier(&self, identifier: &str) -> DbResult<Option<BenutzerRecord>>;

    /// Alle Benutzer, neueste zuerst
    async fn list(&self) -> DbResult<Vec<BenutzerRecord>>;

    /// Admins und Moderatoren
    async fn list_staff(&self) -> DbResult<Vec<BenutzerRecord>>;

    async fn update_profile(&self, id: UserId, data: ProfilUpdate) -> DbResult<BenutzerRecord>;

    async fn update_secret(&self, id: UserId, password_hash: &str) -> DbResult<()>;

    /// Schreibt Rolle, Flags und Gruende in einem einzigen UPDATE
    async fn update_standing(&self, id: UserId, stand: StandUpdate) -> DbResult<BenutzerRecord>;

    async fn update_last_login(&self, id: UserId) -> DbResult<()>;
}

/// Repository fuer Einladungscodes
#[allow(async_fn_in_trait)]
pub trait InviteRepository: Send + Sync {
    async fn create(&self, data: NeueEinladung<'_>) -> DbResult<EinladungRecord>;

    async fn get_by_code(&self, code: &str) -> DbResult<Option<EinladungRecord>>;

    async fn list(&self) -> DbResult<Vec<EinladungRecord>>;
}

/// Repository fuer persistierte Sessions
#[allow(async_fn_in_trait)]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, data: NeueSession<'_>) -> DbResult<SessionRecord>;

    /// Laedt eine Session anhand des Referenz-Hashes (auch abgelaufene)
    async fn get(&self, token_hash: &str) -> DbResult<Option<SessionRecord>>;

    async fn delete(&self, token_hash: &str) -> DbResult<bool>;

    /// Loescht alle Sessions eines Benutzers, gibt die Anzahl zurueck
    async fn delete_for_user(&self, user_id: UserId) -> DbResult<u64>;

    async fn cleanup_expired(&self) -> DbResult<u64>;
}

/// Repository fuer Shoutbox-Nachrichten
#[allow(async_fn_in_trait)]
pub trait ShoutRepository: Send + Sync {
    async fn create(&self, data: NeuerShout<'_>) -> DbResult<ShoutRecord>;

    /// Neueste Shouts zuerst
    async fn recent(&self, limit: i64) -> DbResult<Vec<ShoutRecord>>;
}

/// Repository fuer das IP-Protokoll eines Benutzers
#[allow(async_fn_in_trait)]
pub trait IpLogRepository: Send + Sync {
    /// Erhoeht den Zaehler fuer (Benutzer, IP) oder legt den Eintrag an
    async fn record(&self, user_id: UserId, ip: &str) -> DbResult<()>;

    async fn list_for_user(&self, user_id: UserId) -> DbResult<Vec<IpLogRecord>>;
}
