//! REST-Handler fuer Benutzerlisten und Self-Service

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thw_core::UserId;
use thw_db::models::IpLogRecord;

use crate::dto::{AvatarBody, EigenesKonto, OeffentlichesProfil, PasswortBody, ProfilBody};
use crate::error::ApiResult;
use crate::extract::{AktuellerBenutzer, ClientIp};
use crate::handlers::auth::{cookie_loeschen, mit_cookie};
use crate::state::AppState;

/// GET /api/users – oeffentliche Mitgliederliste
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<OeffentlichesProfil>>> {
    let benutzer = state.auth.benutzer_listen().await?;
    Ok(Json(benutzer.iter().map(OeffentlichesProfil::from).collect()))
}

/// GET /api/users/staff – Admins und Moderatoren
pub async fn list_staff(State(state): State<AppState>) -> ApiResult<Json<Vec<OeffentlichesProfil>>> {
    let team = state.auth.team_listen().await?;
    Ok(Json(team.iter().map(OeffentlichesProfil::from).collect()))
}

/// GET /api/users/:id – oeffentliches Profil
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<OeffentlichesProfil>> {
    let benutzer = state.auth.benutzer_laden(UserId(id)).await?;
    Ok(Json(OeffentlichesProfil::from(&benutzer)))
}

/// PUT /api/users/me – Profilfelder aendern
pub async fn update_me(
    State(state): State<AppState>,
    aktuell: AktuellerBenutzer,
    Json(body): Json<ProfilBody>,
) -> ApiResult<Json<EigenesKonto>> {
    let neu = state
        .auth
        .profil_aktualisieren(aktuell.benutzer.id, body.into())
        .await?;
    Ok(Json(EigenesKonto::from(&neu)))
}

/// PUT /api/users/me/avatar – Avatar-URL und -Farbe aendern
pub async fn update_avatar(
    State(state): State<AppState>,
    aktuell: AktuellerBenutzer,
    Json(body): Json<AvatarBody>,
) -> ApiResult<Json<EigenesKonto>> {
    let neu = state
        .auth
        .profil_aktualisieren(aktuell.benutzer.id, body.into())
        .await?;
    Ok(Json(EigenesKonto::from(&neu)))
}

/// PUT /api/users/me/password – Passwort aendern, danach sind alle Sessions beendet
pub async fn update_password(
    State(state): State<AppState>,
    aktuell: AktuellerBenutzer,
    Json(body): Json<PasswortBody>,
) -> ApiResult<Response> {
    state
        .auth
        .passwort_aendern(aktuell.benutzer.id, &body.old_password, &body.new_password)
        .await?;
    Ok(mit_cookie(
        StatusCode::NO_CONTENT.into_response(),
        cookie_loeschen(&state),
    ))
}

/// POST /api/users/me/ip – IP der Anfrage protokollieren
pub async fn log_ip(
    State(state): State<AppState>,
    aktuell: AktuellerBenutzer,
    ClientIp(ip): ClientIp,
) -> ApiResult<StatusCode> {
    state.auth.ip_protokollieren(aktuell.benutzer.id, &ip).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users/me/ip – eigener IP-Verlauf
pub async fn ip_history(
    State(state): State<AppState>,
    aktuell: AktuellerBenutzer,
) -> ApiResult<Json<Vec<IpLogRecord>>> {
    Ok(Json(state.auth.ip_verlauf(aktuell.benutzer.id).await?))
}
