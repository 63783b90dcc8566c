//! REST-Handler fuer die Shoutbox

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use thw_auth::Aktion;
use thw_shoutbox::ShoutNachricht;

use crate::dto::{ShoutBody, ShoutQuery};
use crate::error::{ApiError, ApiResult};
use crate::extract::AktuellerBenutzer;
use crate::state::AppState;

/// GET /api/shouts?limit=N – neueste Shouts zuerst
pub async fn list_shouts(
    State(state): State<AppState>,
    Query(query): Query<ShoutQuery>,
) -> ApiResult<Json<Vec<ShoutNachricht>>> {
    Ok(Json(state.shouts.neueste(query.limit).await?))
}

/// POST /api/shouts – Shout posten (nicht gebannt, nicht stummgeschaltet)
pub async fn post_shout(
    State(state): State<AppState>,
    aktuell: AktuellerBenutzer,
    Json(body): Json<ShoutBody>,
) -> ApiResult<(StatusCode, Json<ShoutNachricht>)> {
    match state.shouts.posten(aktuell.benutzer.id, &body.message).await {
        Ok(shout) => {
            state.metriken.shouts_total.inc();
            Ok((StatusCode::CREATED, Json(shout)))
        }
        Err(e) => {
            let fehler = ApiError::from(e);
            state.verweigerung_erfassen(Aktion::Post, &fehler);
            Err(fehler)
        }
    }
}
