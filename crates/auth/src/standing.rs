//! Standing Resolver
//!
//! Fuehrt die beiden unabhaengigen Sperrsignale eines Kontos (Rolle und
//! `is_banned`/`is_muted`-Flags) zu genau einer Entscheidung zusammen.
//! Login, Session-Revalidierung und Posten verwenden dieselbe Funktion.

use std::fmt;

use serde::Serialize;
use thw_core::Rolle;
use thw_db::models::BenutzerRecord;

/// Grund fuer eine verweigerte Aktion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "grund", rename_all = "camelCase")]
pub enum Verweigerung {
    /// Konto gebannt (Rolle `Banned` oder Flag gesetzt)
    Gebannt { begruendung: Option<String> },
    /// Konto stummgeschaltet, darf nicht posten
    Stummgeschaltet { begruendung: Option<String> },
    /// Aktion erfordert die Admin-Rolle
    KeinAdmin,
}

impl fmt::Display for Verweigerung {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gebannt { begruendung: Some(b) } => write!(f, "Konto gebannt ({b})"),
            Self::Gebannt { begruendung: None } => f.write_str("Konto gebannt"),
            Self::Stummgeschaltet { begruendung: Some(b) } => {
                write!(f, "Konto stummgeschaltet ({b})")
            }
            Self::Stummgeschaltet { begruendung: None } => f.write_str("Konto stummgeschaltet"),
            Self::KeinAdmin => f.write_str("Admin-Rolle erforderlich"),
        }
    }
}

/// Aufgeloester Kontostand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stand {
    Aktiv { darf_posten: bool },
    Verweigert(Verweigerung),
}

impl Stand {
    pub fn ist_verweigert(&self) -> bool {
        matches!(self, Self::Verweigert(_))
    }
}

/// Loest den Kontostand eines Benutzers auf.
///
/// Reihenfolge: Bann (Rolle ODER Flag) vor Stummschaltung vor aktiv.
/// Jedes der beiden Bann-Signale allein reicht fuer eine Verweigerung.
pub fn aufloesen(benutzer: &BenutzerRecord) -> Stand {
    if benutzer.rolle == Rolle::Banned || benutzer.is_banned {
        return Stand::Verweigert(Verweigerung::Gebannt {
            begruendung: benutzer.ban_reason.clone(),
        });
    }
    if benutzer.is_muted {
        return Stand::Aktiv { darf_posten: false };
    }
    Stand::Aktiv { darf_posten: true }
}
