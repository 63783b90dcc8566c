//! Fehlertypen fuer den Auth-Kern

use thiserror::Error;
use thw_db::DbError;

use crate::standing::Verweigerung;

/// Alle moeglichen Fehler im Auth-Kern
#[derive(Debug, Error)]
pub enum AuthError {
    // --- Passwort ---
    #[error("Passwort-Hashing fehlgeschlagen: {0}")]
    PasswortHashing(String),

    // --- Authentifizierung ---
    /// Gleiche Meldung fuer unbekannte Kennung und falsches Passwort
    #[error("Benutzername oder Passwort falsch")]
    UngueltigeAnmeldedaten,

    #[error("Zugriff verweigert: {0}")]
    Verweigert(Verweigerung),

    #[error("Keine Berechtigung fuer diese Aktion")]
    NichtAutorisiert,

    // --- Session ---
    #[error("Session nicht gefunden oder abgelaufen")]
    SessionUngueltig,

    // --- Benutzerverwaltung ---
    #[error("Bereits vergeben: {0}")]
    Duplikat(String),

    #[error("Benutzer nicht gefunden: {0}")]
    BenutzerNichtGefunden(String),

    #[error("Ungueltige Eingabe: {0}")]
    Validierung(String),

    // --- Einladungen ---
    #[error("Einladungscode ungueltig oder erschoepft")]
    EinladungUngueltig,

    // --- Datenbank ---
    /// Zeitlimit oder Verbindungsfehler des Speichers
    #[error("Speicher nicht verfuegbar: {0}")]
    SpeicherNichtVerfuegbar(String),

    #[error("Datenbankfehler: {0}")]
    Datenbank(DbError),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl From<DbError> for AuthError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NichtVerfuegbar(msg) => Self::SpeicherNichtVerfuegbar(msg),
            DbError::EinladungUngueltig | DbError::EinladungErschoepft => Self::EinladungUngueltig,
            DbError::Eindeutigkeit(msg) => Self::Duplikat(msg),
            DbError::NichtGefunden(msg) => Self::BenutzerNichtGefunden(msg),
            andere => Self::Datenbank(andere),
        }
    }
}

impl AuthError {
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    pub fn validierung(msg: impl Into<String>) -> Self {
        Self::Validierung(msg.into())
    }
}

/// Result-Alias fuer den Auth-Kern
pub type AuthResult<T> = Result<T, AuthError>;
