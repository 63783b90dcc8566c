//! Authorization Gate
//!
//! Beantwortet pro Anfrage "darf dieser Akteur diese Aktion ausfuehren".
//! Der Akteur stammt immer aus der serverseitig validierten Session, niemals
//! aus einer vom Client gelieferten ID.

use std::sync::Arc;

use serde::Serialize;
use thw_core::{Rolle, UserId};
use thw_db::{models::BenutzerRecord, UserRepository};

use crate::error::{AuthError, AuthResult};
use crate::standing::{aufloesen, Stand, Verweigerung};

/// Geschuetzte Aktionen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Aktion {
    Login,
    Post,
    AdminAccess,
    AdminMutate,
}

impl Aktion {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Post => "post",
            Self::AdminAccess => "admin_access",
            Self::AdminMutate => "admin_mutate",
        }
    }
}

/// Ergebnis einer Pruefung
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entscheidung {
    Erlaubt,
    Verweigert(Verweigerung),
}

impl Entscheidung {
    pub fn ist_erlaubt(&self) -> bool {
        matches!(self, Self::Erlaubt)
    }

    /// Wandelt eine Verweigerung in den passenden Fehler um
    pub fn erzwingen(self) -> AuthResult<()> {
        match self {
            Self::Erlaubt => Ok(()),
            Self::Verweigert(Verweigerung::KeinAdmin) => Err(AuthError::NichtAutorisiert),
            Self::Verweigert(v) => Err(AuthError::Verweigert(v)),
        }
    }
}

/// Reine Entscheidungsfunktion ueber einem geladenen Benutzer
///
/// Admin-Aktionen pruefen zuerst den Kontostand, ein gebanntes Konto mit
/// Admin-Rolle erhaelt also keinen Zugang.
pub fn entscheiden(akteur: &BenutzerRecord, aktion: Aktion) -> Entscheidung {
    let stand = aufloesen(akteur);
    match (aktion, stand) {
        (_, Stand::Verweigert(v)) => Entscheidung::Verweigert(v),
        (Aktion::Login, Stand::Aktiv { .. }) => Entscheidung::Erlaubt,
        (Aktion::Post, Stand::Aktiv { darf_posten: true }) => Entscheidung::Erlaubt,
        (Aktion::Post, Stand::Aktiv { darf_posten: false }) => {
            Entscheidung::Verweigert(Verweigerung::Stummgeschaltet {
                begruendung: akteur.mute_reason.clone(),
            })
        }
        (Aktion::AdminAccess | Aktion::AdminMutate, Stand::Aktiv { .. }) => {
            if akteur.rolle == Rolle::Admin {
                Entscheidung::Erlaubt
            } else {
                Entscheidung::Verweigert(Verweigerung::KeinAdmin)
            }
        }
    }
}

/// Gate ueber dem Credential Store
pub struct AuthorizationGate<U: UserRepository> {
    user_repo: Arc<U>,
}

impl<U: UserRepository> AuthorizationGate<U> {
    pub fn neu(user_repo: Arc<U>) -> Arc<Self> {
        Arc::new(Self { user_repo })
    }

    /// Laedt den Akteur frisch aus dem Speicher und entscheidet.
    ///
    /// `ziel` wird nur protokolliert; ein Admin darf sich selbst bearbeiten.
    pub async fn autorisieren(
        &self,
        akteur_id: UserId,
        aktion: Aktion,
        ziel: Option<UserId>,
    ) -> AuthResult<(BenutzerRecord, Entscheidung)> {
        let akteur = self
            .user_repo
            .get_by_id(akteur_id)
            .await?
            .ok_or_else(|| AuthError::BenutzerNichtGefunden(akteur_id.to_string()))?;

        let entscheidung = entscheiden(&akteur, aktion);
        if let Entscheidung::Verweigert(ref grund) = entscheidung {
            tracing::warn!(
                akteur = %akteur_id,
                ziel = ?ziel.map(|z| z.inner()),
                aktion = aktion.als_str(),
                grund = %grund,
                "Aktion verweigert"
            );
        }

        Ok((akteur, entscheidung))
    }

    /// Wie [`Self::autorisieren`], liefert bei Erfolg den Akteur, sonst den Fehler
    pub async fn erzwingen(
        &self,
        akteur_id: UserId,
        aktion: Aktion,
        ziel: Option<UserId>,
    ) -> AuthResult<BenutzerRecord> {
        let (akteur, entscheidung) = self.autorisieren(akteur_id, aktion, ziel).await?;
        entscheidung.erzwingen()?;
        Ok(akteur)
    }
}
