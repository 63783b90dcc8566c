//! Extraktoren fuer Session und Client-IP

use std::net::SocketAddr;

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use thw_db::models::BenutzerRecord;

use crate::error::ApiError;
use crate::state::AppState;

/// Name des Session-Cookies
pub const SESSION_COOKIE: &str = "thw_session";

/// Angemeldeter Benutzer der aktuellen Anfrage.
///
/// Die Identitaet stammt ausschliesslich aus der serverseitig validierten
/// Session, der Kontostand wird dabei frisch aufgeloest.
#[derive(Debug, Clone)]
pub struct AktuellerBenutzer {
    pub benutzer: BenutzerRecord,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AktuellerBenutzer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = session_token(&parts.headers).ok_or(ApiError::NichtAngemeldet)?;
        let benutzer = state.auth.aktueller_benutzer(&token).await?;
        Ok(Self { benutzer, token })
    }
}

/// Session-Referenz aus `Authorization: Bearer` oder dem Session-Cookie
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = bearer_token(headers) {
        return Some(token.to_string());
    }
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .filter_map(|paar| paar.trim().split_once('='))
        .find(|(name, wert)| *name == SESSION_COOKIE && !wert.is_empty())
        .map(|(_, wert)| wert.to_string())
}

/// Extrahiert den Bearer-Token aus dem Authorization-Header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// IP-Adresse des Clients
///
/// Schluessel fuer den Rate Limiter und Wert im IP-Protokoll.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

#[async_trait]
impl FromRequestParts<AppState> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let verbindung = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        Ok(Self(client_ip(&parts.headers, verbindung, state.trusted_proxy)))
    }
}

/// Verbindungsadresse, hinter einem vertrauenswuerdigen Proxy der erste
/// `X-Forwarded-For`-Eintrag. Ohne Proxy ist der Header vom Client frei
/// waehlbar und wird ignoriert.
pub fn client_ip(
    headers: &HeaderMap,
    verbindung: Option<String>,
    trusted_proxy: bool,
) -> String {
    let weitergeleitet = trusted_proxy
        .then(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .flatten();

    weitergeleitet
        .or(verbindung)
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn client_ip_hinter_proxy_aus_x_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );
        assert_eq!(
            client_ip(&headers, Some("127.0.0.1".into()), true),
            "192.168.1.1"
        );
    }

    #[test]
    fn client_ip_ohne_proxy_ignoriert_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("6.6.6.6"));
        assert_eq!(
            client_ip(&headers, Some("10.1.2.3".into()), false),
            "10.1.2.3"
        );
        assert_eq!(client_ip(&headers, None, false), "unknown");
    }

    #[test]
    fn client_ip_aus_verbindung() {
        let headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some("10.1.2.3".into()), true), "10.1.2.3");
        assert_eq!(client_ip(&headers, None, true), "unknown");
    }

    #[test]
    fn bearer_vor_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("thw_session=keks"));
        assert_eq!(session_token(&headers).as_deref(), Some("keks"));

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer mein_token_123"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("mein_token_123"));
    }

    #[test]
    fn cookie_unter_mehreren() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dunkel; thw_session=abc-DEF_1; lang=de"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc-DEF_1"));
    }

    #[test]
    fn ohne_session() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("thw_session="));
        assert_eq!(session_token(&headers), None);
    }
}
