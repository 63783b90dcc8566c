//! Datenbankmodelle fuer das Forum
//!
//! Diese Typen repraesentieren Datensaetze aus der Datenbank.
//! Sie sind von den oeffentlichen API-Typen getrennt und dienen als
//! reine Datenuebertragungsobjekte.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thw_core::{Persistenz, Rolle, UserId};

// ---------------------------------------------------------------------------
// Benutzer
// ---------------------------------------------------------------------------

/// Benutzer-Datensatz aus der Datenbank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenutzerRecord {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Argon2id-PHC-String, niemals Klartext
    pub password_hash: String,
    pub rolle: Rolle,
    pub is_banned: bool,
    pub is_muted: bool,
    pub ban_reason: Option<String>,
    pub mute_reason: Option<String>,
    pub registriert_am: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub profil: BenutzerProfil,
}

/// Profilattribute ohne Einfluss auf den Kontostatus
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenutzerProfil {
    pub avatar_url: String,
    pub avatar_color: Option<String>,
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

/// Daten zum Erstellen eines neuen Benutzers
#[derive(Debug, Clone)]
pub struct NeuerBenutzer<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub avatar_url: &'a str,
}

/// Teilaktualisierung des Profils
///
/// `None` = Feld unveraendert, `Some(None)` = Feld leeren.
#[derive(Debug, Clone, Default)]
pub struct ProfilUpdate {
    pub avatar_url: Option<String>,
    pub avatar_color: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub about: Option<Option<String>>,
    pub dob_day: Option<Option<i64>>,
    pub dob_month: Option<Option<i64>>,
    pub dob_year: Option<Option<i64>>,
    pub show_dob_date: Option<bool>,
    pub show_dob_year: Option<bool>,
    pub receive_emails: Option<bool>,
}

impl ProfilUpdate {
    pub fn ist_leer(&self) -> bool {
        self.avatar_url.is_none()
            && self.avatar_color.is_none()
            && self.location.is_none()
            && self.website.is_none()
            && self.about.is_none()
            && self.dob_day.is_none()
            && self.dob_month.is_none()
            && self.dob_year.is_none()
            && self.show_dob_date.is_none()
            && self.show_dob_year.is_none()
            && self.receive_emails.is_none()
    }
}

/// Vollstaendiger Moderationsstand, wird atomar in einem UPDATE geschrieben
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandUpdate {
    pub rolle: Rolle,
    pub is_banned: bool,
    pub is_muted: bool,
    pub ban_reason: Option<String>,
    pub mute_reason: Option<String>,
}

impl From<&BenutzerRecord> for StandUpdate {
    fn from(r: &BenutzerRecord) -> Self {
        Self {
            rolle: r.rolle,
            is_banned: r.is_banned,
            is_muted: r.is_muted,
            ban_reason: r.ban_reason.clone(),
            mute_reason: r.mute_reason.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Einladungen
// ---------------------------------------------------------------------------

/// Wert von `uses_left` fuer unbegrenzt nutzbare Codes
pub const UNBEGRENZT: i64 = -1;

/// Einladung-Datensatz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EinladungRecord {
    pub code: String,
    /// Verbleibende Nutzungen (-1 = unbegrenzt)
    pub uses_left: i64,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl EinladungRecord {
    pub fn ist_unbegrenzt(&self) -> bool {
        self.uses_left == UNBEGRENZT
    }

    pub fn ist_nutzbar(&self) -> bool {
        self.ist_unbegrenzt() || self.uses_left > 0
    }
}

/// Daten zum Erstellen einer Einladung
#[derive(Debug, Clone)]
pub struct NeueEinladung<'a> {
    pub code: &'a str,
    pub uses_left: i64,
    pub created_by: Option<UserId>,
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Session-Datensatz. Gespeichert wird nur der SHA-256-Hash der Referenz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token_hash: String,
    pub user_id: UserId,
    pub persistenz: Persistenz,
    pub erstellt_am: DateTime<Utc>,
    pub laeuft_ab_am: DateTime<Utc>,
}

/// Daten zum Anlegen einer Session
#[derive(Debug, Clone)]
pub struct NeueSession<'a> {
    pub token_hash: &'a str,
    pub user_id: UserId,
    pub persistenz: Persistenz,
    pub erstellt_am: DateTime<Utc>,
    pub laeuft_ab_am: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Shoutbox
// ---------------------------------------------------------------------------

/// Shout mit den Anzeige-Daten des Verfassers (JOIN auf users)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoutRecord {
    pub id: i64,
    pub user_id: UserId,
    pub username: String,
    pub rolle: Rolle,
    pub avatar_url: String,
    pub avatar_color: Option<String>,
    pub message: String,
    pub time: DateTime<Utc>,
}

/// Daten zum Speichern eines Shouts
#[derive(Debug, Clone)]
pub struct NeuerShout<'a> {
    pub user_id: UserId,
    pub message: &'a str,
}

// ---------------------------------------------------------------------------
// IP-Protokoll
// ---------------------------------------------------------------------------

/// Zusammengefasste Nutzung einer IP-Adresse durch einen Benutzer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpLogRecord {
    pub ip: String,
    pub total: i64,
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}
