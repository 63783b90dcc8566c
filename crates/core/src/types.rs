//! Gemeinsame Identifikations- und Statustypen fuer das Forum
//!
//! Benutzer-IDs verwenden das Newtype-Pattern, damit sie nicht mit anderen
//! numerischen IDs (Shouts, Einladungen) verwechselt werden koennen.

use serde::{Deserialize, Serialize};

/// Eindeutige, numerische Benutzer-ID (vom Speicher vergeben)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Gibt den inneren Zahlenwert zurueck
    pub fn inner(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

/// Rolle eines Benutzerkontos
///
/// Wird als Text gespeichert. `Banned` ist gleichzeitig eine Rolle und
/// ein Sperrsignal; das `is_banned`-Flag existiert unabhaengig davon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Rolle {
    #[default]
    User,
    Moderator,
    Admin,
    Banned,
}

impl Rolle {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Moderator => "Moderator",
            Self::Admin => "Admin",
            Self::Banned => "Banned",
        }
    }

    /// Staff = Admin oder Moderator (fuer die oeffentliche Teamliste)
    pub fn ist_staff(&self) -> bool {
        matches!(self, Self::Admin | Self::Moderator)
    }
}

impl std::fmt::Display for Rolle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.als_str())
    }
}

impl std::str::FromStr for Rolle {
    type Err = String;

    /// Vergleicht ohne Gross-/Kleinschreibung und akzeptiert die Altwerte
    /// `member` und `admin` aus frueheren Datenbestaenden.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("user") || s.eq_ignore_ascii_case("member") {
            Ok(Self::User)
        } else if s.eq_ignore_ascii_case("moderator") {
            Ok(Self::Moderator)
        } else if s.eq_ignore_ascii_case("admin") {
            Ok(Self::Admin)
        } else if s.eq_ignore_ascii_case("banned") {
            Ok(Self::Banned)
        } else {
            Err(format!("Unbekannte Rolle: {s}"))
        }
    }
}

/// Lebensdauer einer Session
///
/// Beeinflusst nur, wie lange die Session gespeichert bleibt,
/// niemals die Validierungslogik.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Persistenz {
    /// Ueberlebt Browser-Neustarts ("angemeldet bleiben")
    Durable,
    /// Endet mit der Browser-Sitzung
    #[default]
    Ephemeral,
}

impl Persistenz {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Durable => "durable",
            Self::Ephemeral => "ephemeral",
        }
    }
}

impl std::str::FromStr for Persistenz {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "durable" => Ok(Self::Durable),
            "ephemeral" => Ok(Self::Ephemeral),
            other => Err(format!("Unbekannte Session-Persistenz: {other}")),
        }
    }
}
