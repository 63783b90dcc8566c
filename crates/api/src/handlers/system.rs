//! REST-Handler fuer den Health-Check

use axum::{extract::State, response::IntoResponse};

use crate::state::AppState;

/// GET /api/health – prueft den Speicher mit `SELECT 1`
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let db_connected = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(fehler = %e, "Health-Check: Speicher nicht erreichbar");
            false
        }
    };
    state.health.antwort(db_connected)
}
