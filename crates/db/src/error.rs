//! Fehlertypen fuer das Datenbank-Crate

use thiserror::Error;

/// Datenbank-Fehlertypen
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Datensatz nicht gefunden: {0}")]
    NichtGefunden(String),

    #[error("Eindeutigkeitsverletzung: {0}")]
    Eindeutigkeit(String),

    #[error("Ungueltige Daten: {0}")]
    UngueltigeDaten(String),

    #[error("Einladungscode ungueltig oder unbekannt")]
    EinladungUngueltig,

    #[error("Einladungscode erschoepft")]
    EinladungErschoepft,

    /// Zeitlimit, Verbindungsabbruch oder gesperrte Datenbank.
    /// Darf niemals als "nicht gefunden" interpretiert werden.
    #[error("Speicher nicht verfuegbar: {0}")]
    NichtVerfuegbar(String),

    #[error("SQLx-Fehler: {0}")]
    Sqlx(#[source] sqlx::Error),

    #[error("Migration-Fehler: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Interner DB-Fehler: {0}")]
    Intern(String),
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
                Self::NichtVerfuegbar(e.to_string())
            }
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) => Self::NichtVerfuegbar(e.to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Eindeutigkeit(db.message().to_string())
            }
            sqlx::Error::Database(db) if ist_gesperrt(db.message()) => {
                Self::NichtVerfuegbar(db.message().to_string())
            }
            _ => Self::Sqlx(e),
        }
    }
}

/// SQLITE_BUSY / SQLITE_LOCKED nach Ablauf des busy_timeout
fn ist_gesperrt(msg: &str) -> bool {
    msg.contains("database is locked") || msg.contains("database table is locked")
}

impl DbError {
    pub fn nicht_gefunden(msg: impl Into<String>) -> Self {
        Self::NichtGefunden(msg.into())
    }

    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn es sich um einen Eindeutigkeitsfehler handelt
    pub fn ist_eindeutigkeit(&self) -> bool {
        matches!(self, Self::Eindeutigkeit(_))
            || matches!(self, Self::Sqlx(e) if {
                let msg = e.to_string();
                msg.contains("UNIQUE") || msg.contains("unique")
            })
    }

    /// Gibt true zurueck wenn der Speicher voruebergehend nicht erreichbar ist
    pub fn ist_nicht_verfuegbar(&self) -> bool {
        matches!(self, Self::NichtVerfuegbar(_))
    }
}
