//! Moderation Mutator
//!
//! Admin-Aenderungen an Rolle, Bann und Stummschaltung. Rolle und Bann-Flag
//! werden dabei in beide Richtungen synchron gehalten, sodass nach jeder
//! Aenderung gilt: `rolle == Banned` genau dann wenn `is_banned`.

use std::sync::Arc;

use thw_core::{Rolle, UserId};
use thw_db::{
    models::{BenutzerRecord, StandUpdate},
    SessionRepository, UserRepository,
};

use crate::authorization::{Aktion, AuthorizationGate};
use crate::error::{AuthError, AuthResult};
use crate::session::SessionStore;

/// Gewuenschte Aenderung; `None` = unveraendert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModerationsAenderung {
    pub rolle: Option<Rolle>,
    pub is_banned: Option<bool>,
    pub is_muted: Option<bool>,
    pub ban_reason: Option<String>,
    pub mute_reason: Option<String>,
}

/// Berechnet den neuen Stand aus gespeichertem Stand und Aenderung.
///
/// - Rolle `Banned` erzwingt `is_banned = true`
/// - `is_banned = true` erzwingt Rolle `Banned`, auch gegen eine explizite Rolle
/// - `is_banned = false` bei Rolle `Banned` setzt die Rolle auf `User`
/// - eine explizite Nicht-Banned-Rolle hebt einen bestehenden Bann auf,
///   sofern das Flag nicht mitgeschickt wurde
/// - Stummschaltung ist unabhaengig; Gruende entfallen mit ihrem Flag
pub fn stand_berechnen(alt: &BenutzerRecord, aenderung: &ModerationsAenderung) -> StandUpdate {
    let mut rolle = aenderung.rolle.unwrap_or(alt.rolle);
    let mut gebannt = aenderung.is_banned.unwrap_or(alt.is_banned);

    match (aenderung.rolle, aenderung.is_banned) {
        (Some(Rolle::Banned), _) => gebannt = true,
        (_, Some(true)) => rolle = Rolle::Banned,
        (_, Some(false)) if rolle == Rolle::Banned => rolle = Rolle::User,
        (Some(_), None) if alt.rolle == Rolle::Banned || alt.is_banned => gebannt = false,
        _ => {}
    }

    // Altdaten mit nur einem der beiden Signale angleichen
    if rolle == Rolle::Banned {
        gebannt = true;
    }
    if gebannt {
        rolle = Rolle::Banned;
    }

    let stumm = aenderung.is_muted.unwrap_or(alt.is_muted);

    StandUpdate {
        rolle,
        is_banned: gebannt,
        is_muted: stumm,
        ban_reason: grund(gebannt, &aenderung.ban_reason, &alt.ban_reason),
        mute_reason: grund(stumm, &aenderung.mute_reason, &alt.mute_reason),
    }
}

fn grund(aktiv: bool, neu: &Option<String>, alt: &Option<String>) -> Option<String> {
    if !aktiv {
        return None;
    }
    match neu {
        Some(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        None => alt.clone(),
    }
}

/// Service fuer Admin-Aenderungen am Kontostand
pub struct ModerationService<U: UserRepository, S: SessionRepository> {
    user_repo: Arc<U>,
    gate: Arc<AuthorizationGate<U>>,
    session_store: Arc<SessionStore<S>>,
}

impl<U: UserRepository, S: SessionRepository> ModerationService<U, S> {
    pub fn neu(
        user_repo: Arc<U>,
        gate: Arc<AuthorizationGate<U>>,
        session_store: Arc<SessionStore<S>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            user_repo,
            gate,
            session_store,
        })
    }

    /// Wendet eine Aenderung an.
    ///
    /// Fehler: `NichtAutorisiert` wenn der Akteur kein aktiver Admin ist,
    /// `BenutzerNichtGefunden` wenn das Ziel fehlt. Der neue Stand wird in
    /// einem einzigen UPDATE geschrieben; bei gleichzeitigen Aenderungen
    /// gewinnt die letzte.
    pub async fn aenderung_anwenden(
        &self,
        admin_id: UserId,
        ziel_id: UserId,
        aenderung: &ModerationsAenderung,
    ) -> AuthResult<BenutzerRecord> {
        self.gate
            .erzwingen(admin_id, Aktion::AdminMutate, Some(ziel_id))
            .await?;

        let alt = self
            .user_repo
            .get_by_id(ziel_id)
            .await?
            .ok_or_else(|| AuthError::BenutzerNichtGefunden(ziel_id.to_string()))?;

        let stand = stand_berechnen(&alt, aenderung);
        let gebannt = stand.is_banned;
        let neu = self.user_repo.update_standing(ziel_id, stand).await?;

        if gebannt {
            self.session_store.alle_invalidieren(ziel_id).await?;
        }

        tracing::info!(
            admin_id = %admin_id,
            ziel_id = %ziel_id,
            rolle = %neu.rolle,
            gebannt = neu.is_banned,
            stumm = neu.is_muted,
            "Moderationsaenderung angewendet"
        );

        Ok(neu)
    }
}
