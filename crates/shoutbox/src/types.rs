//! Oeffentliche Typen fuer die Shoutbox

use chrono::{DateTime, Utc};
use serde::Serialize;
use thw_core::{Rolle, UserId};
use thw_db::models::ShoutRecord;

/// Ein Shout mit den Anzeige-Daten des Verfassers (Domain-Typ, nicht DB-Record)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoutNachricht {
    pub id: i64,
    pub user_id: UserId,
    pub username: String,
    pub role: Rolle,
    pub avatar_url: String,
    pub avatar_color: Option<String>,
    pub message: String,
    pub time: DateTime<Utc>,
}

impl From<ShoutRecord> for ShoutNachricht {
    fn from(r: ShoutRecord) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            username: r.username,
            role: r.rolle,
            avatar_url: r.avatar_url,
            avatar_color: r.avatar_color,
            message: r.message,
            time: r.time,
        }
    }
}
