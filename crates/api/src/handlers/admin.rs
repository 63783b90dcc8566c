//! REST-Handler fuer die Admin-Verwaltung
//!
//! Die Admin-Identitaet stammt allein aus der validierten Session; das Gate
//! prueft Rolle und Kontostand bei jeder Anfrage neu.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use thw_auth::{Aktion, BenutzerUebersicht, ModerationsAenderung};
use thw_core::UserId;

use crate::dto::{AdminBearbeitungBody, EinladungAntwort, EinladungBody};
use crate::error::{ApiError, ApiResult};
use crate::extract::AktuellerBenutzer;
use crate::state::AppState;

fn erfassen<T>(state: &AppState, aktion: Aktion, ergebnis: ApiResult<T>) -> ApiResult<T> {
    if let Err(ref e) = ergebnis {
        state.verweigerung_erfassen(aktion, e);
    }
    ergebnis
}

/// GET /api/admin/users – alle Konten mit Moderationsstand
pub async fn list_users(
    State(state): State<AppState>,
    aktuell: AktuellerBenutzer,
) -> ApiResult<Json<Vec<BenutzerUebersicht>>> {
    let ergebnis = state
        .auth
        .admin_benutzer_listen(aktuell.benutzer.id)
        .await
        .map_err(ApiError::from);
    erfassen(&state, Aktion::AdminAccess, ergebnis).map(Json)
}

/// PUT /api/admin/users/:id – Rolle, Bann und Stummschaltung aendern
pub async fn edit_user(
    State(state): State<AppState>,
    aktuell: AktuellerBenutzer,
    Path(id): Path<i64>,
    Json(body): Json<AdminBearbeitungBody>,
) -> ApiResult<Json<BenutzerUebersicht>> {
    let aenderung = ModerationsAenderung::try_from(body)?;
    let ergebnis = state
        .auth
        .admin_benutzer_bearbeiten(aktuell.benutzer.id, UserId(id), &aenderung)
        .await
        .map_err(ApiError::from);
    let neu = erfassen(&state, Aktion::AdminMutate, ergebnis)?;
    state.metriken.moderation_aenderungen_total.inc();
    Ok(Json(neu))
}

/// GET /api/admin/invites – alle Einladungscodes
pub async fn list_invites(
    State(state): State<AppState>,
    aktuell: AktuellerBenutzer,
) -> ApiResult<Json<Vec<EinladungAntwort>>> {
    let ergebnis = state
        .einladungen
        .einladungen_listen(aktuell.benutzer.id)
        .await
        .map_err(ApiError::from);
    let einladungen = erfassen(&state, Aktion::AdminAccess, ergebnis)?;
    Ok(Json(einladungen.into_iter().map(EinladungAntwort::from).collect()))
}

/// POST /api/admin/invites – Einladungscode erstellen
pub async fn create_invite(
    State(state): State<AppState>,
    aktuell: AktuellerBenutzer,
    Json(body): Json<EinladungBody>,
) -> ApiResult<(StatusCode, Json<EinladungAntwort>)> {
    let ergebnis = state
        .einladungen
        .einladung_erstellen(aktuell.benutzer.id, body.code.as_deref(), body.uses_left)
        .await
        .map_err(ApiError::from);
    let einladung = erfassen(&state, Aktion::AdminMutate, ergebnis)?;
    Ok((StatusCode::CREATED, Json(einladung.into())))
}
