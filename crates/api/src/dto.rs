//! Anfrage- und Antworttypen der REST-API (JSON, camelCase)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thw_auth::{BenutzerUebersicht, Session};
use thw_core::{Persistenz, Rolle, UserId};
use thw_db::models::{BenutzerRecord, EinladungRecord, ProfilUpdate};

use crate::error::ApiError;

/// Unterscheidet "Feld fehlt" (`None`) von "Feld ist null" (`Some(None)`)
fn doppelt_optional<'de, T, D>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

fn persistenz(angemeldet_bleiben: bool) -> Persistenz {
    if angemeldet_bleiben {
        Persistenz::Durable
    } else {
        Persistenz::Ephemeral
    }
}

// ---------------------------------------------------------------------------
// Anmeldung
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrierungBody {
    pub username: String,
    pub email: String,
    pub password: String,
    pub invite_code: String,
    #[serde(default)]
    pub remember_me: bool,
}

impl RegistrierungBody {
    pub fn persistenz(&self) -> Persistenz {
        persistenz(self.remember_me)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
    /// Benutzername oder E-Mail
    #[serde(alias = "username", alias = "email")]
    pub identifier: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

impl LoginBody {
    pub fn persistenz(&self) -> Persistenz {
        persistenz(self.remember_me)
    }
}

/// Antwort auf Login und Registrierung
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAntwort {
    pub user: EigenesKonto,
    pub token: String,
    pub persistence: Persistenz,
    pub expires_at: DateTime<Utc>,
}

impl SessionAntwort {
    pub fn neu(benutzer: &BenutzerRecord, session: &Session) -> Self {
        Self {
            user: EigenesKonto::from(benutzer),
            token: session.token.clone(),
            persistence: session.persistenz,
            expires_at: session.laeuft_ab_am,
        }
    }
}

// ---------------------------------------------------------------------------
// Benutzer
// ---------------------------------------------------------------------------

/// Eigenes Konto: Uebersicht plus alle Profilfelder
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EigenesKonto {
    #[serde(flatten)]
    pub uebersicht: BenutzerUebersicht,
    pub location: Option<String>,
    pub website: Option<String>,
    pub about: Option<String>,
    pub dob_day: Option<i64>,
    pub dob_month: Option<i64>,
    pub dob_year: Option<i64>,
    pub show_dob_date: bool,
    pub show_dob_year: bool,
    pub receive_emails: bool,
}

impl From<&BenutzerRecord> for EigenesKonto {
    fn from(r: &BenutzerRecord) -> Self {
        let p = &r.profil;
        Self {
            uebersicht: BenutzerUebersicht::from(r),
            location: p.location.clone(),
            website: p.website.clone(),
            about: p.about.clone(),
            dob_day: p.dob_day,
            dob_month: p.dob_month,
            dob_year: p.dob_year,
            show_dob_date: p.show_dob_date,
            show_dob_year: p.show_dob_year,
            receive_emails: p.receive_emails,
        }
    }
}

/// Oeffentliches Profil ohne E-Mail und Moderationsgruende.
///
/// Geburtstag und -jahr erscheinen nur, wenn der Benutzer sie freigibt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OeffentlichesProfil {
    pub id: UserId,
    pub username: String,
    pub role: Rolle,
    pub registration_date: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub avatar_url: String,
    pub avatar_color: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub about: Option<String>,
    pub dob_day: Option<i64>,
    pub dob_month: Option<i64>,
    pub dob_year: Option<i64>,
}

impl From<&BenutzerRecord> for OeffentlichesProfil {
    fn from(r: &BenutzerRecord) -> Self {
        let p = &r.profil;
        let (dob_day, dob_month) = if p.show_dob_date {
            (p.dob_day, p.dob_month)
        } else {
            (None, None)
        };
        Self {
            id: r.id,
            username: r.username.clone(),
            role: r.rolle,
            registration_date: r.registriert_am,
            last_login: r.last_login,
            avatar_url: p.avatar_url.clone(),
            avatar_color: p.avatar_color.clone(),
            location: p.location.clone(),
            website: p.website.clone(),
            about: p.about.clone(),
            dob_day,
            dob_month,
            dob_year: p.dob_year.filter(|_| p.show_dob_year),
        }
    }
}

/// Profilaenderung; fehlende Felder bleiben unveraendert, `null` leert sie
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilBody {
    #[serde(default, deserialize_with = "doppelt_optional")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "doppelt_optional")]
    pub website: Option<Option<String>>,
    #[serde(default, deserialize_with = "doppelt_optional")]
    pub about: Option<Option<String>>,
    #[serde(default, deserialize_with = "doppelt_optional")]
    pub dob_day: Option<Option<i64>>,
    #[serde(default, deserialize_with = "doppelt_optional")]
    pub dob_month: Option<Option<i64>>,
    #[serde(default, deserialize_with = "doppelt_optional")]
    pub dob_year: Option<Option<i64>>,
    pub show_dob_date: Option<bool>,
    pub show_dob_year: Option<bool>,
    pub receive_emails: Option<bool>,
}

impl From<ProfilBody> for ProfilUpdate {
    fn from(b: ProfilBody) -> Self {
        Self {
            location: b.location,
            website: b.website,
            about: b.about,
            dob_day: b.dob_day,
            dob_month: b.dob_month,
            dob_year: b.dob_year,
            show_dob_date: b.show_dob_date,
            show_dob_year: b.show_dob_year,
            receive_emails: b.receive_emails,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarBody {
    pub avatar_url: Option<String>,
    #[serde(default, deserialize_with = "doppelt_optional")]
    pub avatar_color: Option<Option<String>>,
}

impl From<AvatarBody> for ProfilUpdate {
    fn from(b: AvatarBody) -> Self {
        Self {
            avatar_url: b.avatar_url,
            avatar_color: b.avatar_color,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswortBody {
    pub old_password: String,
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Shoutbox
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ShoutBody {
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShoutQuery {
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

/// Admin-Aenderung an einem Konto.
///
/// `reason` dient als gemeinsamer Grund, wenn `banReason` bzw.
/// `muteReason` fehlen.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminBearbeitungBody {
    pub role: Option<String>,
    pub is_banned: Option<bool>,
    pub is_muted: Option<bool>,
    pub ban_reason: Option<String>,
    pub mute_reason: Option<String>,
    pub reason: Option<String>,
}

impl TryFrom<AdminBearbeitungBody> for thw_auth::ModerationsAenderung {
    type Error = ApiError;

    fn try_from(b: AdminBearbeitungBody) -> Result<Self, ApiError> {
        let rolle = b
            .role
            .as_deref()
            .map(str::parse::<Rolle>)
            .transpose()
            .map_err(ApiError::UngueltigeEingabe)?;

        let bann_an = b.is_banned == Some(true) || rolle == Some(Rolle::Banned);
        let ban_reason = b
            .ban_reason
            .or_else(|| b.reason.clone().filter(|_| bann_an));
        let mute_reason = b
            .mute_reason
            .or_else(|| b.reason.clone().filter(|_| b.is_muted == Some(true)));

        Ok(Self {
            rolle,
            is_banned: b.is_banned,
            is_muted: b.is_muted,
            ban_reason,
            mute_reason,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EinladungBody {
    pub code: Option<String>,
    #[serde(default = "eine_nutzung")]
    pub uses_left: i64,
}

fn eine_nutzung() -> i64 {
    1
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EinladungAntwort {
    pub code: String,
    /// -1 = unbegrenzt
    pub uses_left: i64,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl From<EinladungRecord> for EinladungAntwort {
    fn from(r: EinladungRecord) -> Self {
        Self {
            code: r.code,
            uses_left: r.uses_left,
            created_by: r.created_by,
            created_at: r.created_at,
        }
    }
}
