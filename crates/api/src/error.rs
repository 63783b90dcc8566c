//! Fehlertypen der REST-Schicht

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use thw_auth::{AuthError, Verweigerung};
use thw_db::DbError;
use thw_shoutbox::ShoutError;

/// Alle moeglichen Fehler der REST-Schicht
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Nicht angemeldet")]
    NichtAngemeldet,

    #[error("Rate-Limit ueberschritten: bitte warte {retry_after_secs} Sekunden")]
    RateLimitUeberschritten { retry_after_secs: u64 },

    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Shout(#[from] ShoutError),

    #[error("Datenbankfehler: {0}")]
    Datenbank(#[from] DbError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Die Verweigerung, falls der Fehler eine ist
    pub fn verweigerung(&self) -> Option<&Verweigerung> {
        match self {
            Self::Auth(AuthError::Verweigert(v))
            | Self::Shout(ShoutError::Auth(AuthError::Verweigert(v))) => Some(v),
            _ => None,
        }
    }

    /// HTTP-Statuscode und maschinenlesbarer Fehlercode
    pub fn status_und_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NichtAngemeldet => (StatusCode::UNAUTHORIZED, "not_authenticated"),
            Self::RateLimitUeberschritten { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, "rate_limited")
            }
            Self::UngueltigeEingabe(_) => (StatusCode::BAD_REQUEST, "validation"),
            Self::Auth(e) | Self::Shout(ShoutError::Auth(e)) => auth_status(e),
            Self::Shout(ShoutError::UngueltigeEingabe(_)) => {
                (StatusCode::BAD_REQUEST, "validation")
            }
            Self::Shout(ShoutError::DatenbankFehler(e)) | Self::Datenbank(e) => db_status(e),
        }
    }
}

fn auth_status(e: &AuthError) -> (StatusCode, &'static str) {
    match e {
        AuthError::UngueltigeAnmeldedaten => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
        AuthError::SessionUngueltig => (StatusCode::UNAUTHORIZED, "session_not_found"),
        AuthError::Verweigert(_) => (StatusCode::FORBIDDEN, "denied"),
        AuthError::NichtAutorisiert => (StatusCode::FORBIDDEN, "not_authorized"),
        AuthError::BenutzerNichtGefunden(_) => (StatusCode::NOT_FOUND, "not_found"),
        AuthError::Duplikat(_) => (StatusCode::CONFLICT, "duplicate_identity"),
        AuthError::EinladungUngueltig => (StatusCode::BAD_REQUEST, "invalid_invite"),
        AuthError::Validierung(_) => (StatusCode::BAD_REQUEST, "validation"),
        AuthError::SpeicherNichtVerfuegbar(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable")
        }
        AuthError::Datenbank(db) => db_status(db),
        AuthError::PasswortHashing(_) | AuthError::Intern(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal")
        }
    }
}

fn db_status(e: &DbError) -> (StatusCode, &'static str) {
    if e.ist_nicht_verfuegbar() {
        (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "internal")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_und_code();

        // Interne Details gehen ins Log, nicht zum Client
        let nachricht = match status {
            StatusCode::SERVICE_UNAVAILABLE => {
                tracing::error!(fehler = %self, "Speicher nicht verfuegbar");
                self.to_string()
            }
            s if s.is_server_error() => {
                tracing::error!(fehler = %self, "Interner Fehler bei Anfrage");
                "Interner Fehler".to_string()
            }
            _ => self.to_string(),
        };

        let mut body = json!({
            "error": {
                "status": status.as_u16(),
                "code": code,
                "message": nachricht,
            }
        });
        if let Some(v) = self.verweigerung() {
            body["error"]["reason"] = json!(v);
        }

        let mut response = (status, Json(body)).into_response();
        if let Self::RateLimitUeberschritten { retry_after_secs } = self {
            if let Ok(wert) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, wert);
            }
        }
        response
    }
}
