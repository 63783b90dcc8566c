//! Fehlertypen fuer das Shoutbox-Crate

use thiserror::Error;

/// Shoutbox-Fehlertypen
#[derive(Debug, Error)]
pub enum ShoutError {
    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    /// Verweigerung oder fehlender Akteur aus dem Authorization Gate
    #[error(transparent)]
    Auth(#[from] thw_auth::AuthError),

    #[error("Datenbank-Fehler: {0}")]
    DatenbankFehler(#[from] thw_db::DbError),
}

pub type ShoutResult<T> = Result<T, ShoutError>;
