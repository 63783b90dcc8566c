//! REST-Handler fuer Registrierung, Login und Logout

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use thw_auth::{Aktion, AuthError, Registrierung, Session};
use thw_core::Persistenz;

use crate::dto::{EigenesKonto, LoginBody, RegistrierungBody, SessionAntwort};
use crate::error::{ApiError, ApiResult};
use crate::extract::{AktuellerBenutzer, ClientIp, SESSION_COOKIE};
use crate::rate_limit::Vorgang;
use crate::state::AppState;

/// POST /api/auth/register – Registrierung mit Einladungscode, danach angemeldet
pub async fn register(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(body): Json<RegistrierungBody>,
) -> ApiResult<Response> {
    state
        .rate_limiter
        .pruefen(Vorgang::Registrierung, &ip)
        .map_err(|retry_after_secs| ApiError::RateLimitUeberschritten { retry_after_secs })?;

    let (benutzer, session) = state
        .auth
        .registrieren(
            Registrierung {
                username: &body.username,
                email: &body.email,
                passwort: &body.password,
                einladungscode: &body.invite_code,
            },
            body.persistenz(),
        )
        .await?;

    state.metriken.registrierungen_total.inc();
    if let Err(e) = state.auth.ip_protokollieren(benutzer.id, &ip).await {
        tracing::warn!(user_id = %benutzer.id, fehler = %e, "IP-Protokoll fehlgeschlagen");
    }

    let antwort = SessionAntwort::neu(&benutzer, &session);
    Ok(mit_cookie(
        (StatusCode::CREATED, Json(antwort)).into_response(),
        session_cookie(&state, &session),
    ))
}

/// POST /api/auth/login – Anmeldung per Benutzername oder E-Mail
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(body): Json<LoginBody>,
) -> ApiResult<Response> {
    state
        .rate_limiter
        .pruefen(Vorgang::Login, &ip)
        .map_err(|retry_after_secs| ApiError::RateLimitUeberschritten { retry_after_secs })?;

    let ergebnis = state
        .auth
        .anmelden(&body.identifier, &body.password, body.persistenz())
        .await;

    let (benutzer, session) = match ergebnis {
        Ok(ok) => ok,
        Err(e) => {
            let label = match &e {
                AuthError::UngueltigeAnmeldedaten => "ungueltig",
                AuthError::Verweigert(_) => "verweigert",
                _ => "fehler",
            };
            state.metriken.login_zaehlen(label);
            let fehler = ApiError::from(e);
            state.verweigerung_erfassen(Aktion::Login, &fehler);
            return Err(fehler);
        }
    };
    state.metriken.login_zaehlen("erfolg");

    if let Err(e) = state.auth.ip_protokollieren(benutzer.id, &ip).await {
        tracing::warn!(user_id = %benutzer.id, fehler = %e, "IP-Protokoll fehlgeschlagen");
    }

    let antwort = SessionAntwort::neu(&benutzer, &session);
    Ok(mit_cookie(
        Json(antwort).into_response(),
        session_cookie(&state, &session),
    ))
}

/// POST /api/auth/logout – widerruft die aktuelle Session
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    // Auch Sessions gebannter Konten lassen sich beenden, daher ohne Extraktor
    if let Some(token) = crate::extract::session_token(&headers) {
        state.auth.abmelden(&token).await?;
    }
    Ok(mit_cookie(
        StatusCode::NO_CONTENT.into_response(),
        cookie_loeschen(&state),
    ))
}

/// GET /api/auth/me – der angemeldete Benutzer
pub async fn me(aktuell: AktuellerBenutzer) -> Json<EigenesKonto> {
    Json(EigenesKonto::from(&aktuell.benutzer))
}

/// Session-Cookie. Nur durable Sessions erhalten ein Max-Age und
/// ueberleben damit einen Browser-Neustart.
pub(crate) fn session_cookie(state: &AppState, session: &Session) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
        session.token
    );
    if session.persistenz == Persistenz::Durable {
        let max_age = (session.laeuft_ab_am - session.erstellt_am).num_seconds().max(0);
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    if state.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub(crate) fn cookie_loeschen(state: &AppState) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if state.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub(crate) fn mit_cookie(mut response: Response, cookie: String) -> Response {
    match HeaderValue::from_str(&cookie) {
        Ok(wert) => {
            response.headers_mut().append(header::SET_COOKIE, wert);
        }
        Err(e) => tracing::warn!(fehler = %e, "Session-Cookie nicht setzbar"),
    }
    response
}
