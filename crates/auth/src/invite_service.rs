//! Invite-Service
//!
//! Ausgabe und Auflistung von Einladungscodes durch Admins. Der Verbrauch
//! eines Codes passiert ausschliesslich atomar bei der Registrierung im
//! Credential Store.

use std::sync::Arc;

use rand::RngCore;
use thw_core::UserId;
use thw_db::{
    models::{EinladungRecord, NeueEinladung, UNBEGRENZT},
    InviteRepository, UserRepository,
};

use crate::authorization::{Aktion, AuthorizationGate};
use crate::error::{AuthError, AuthResult};

/// Laenge des generierten Einladungscodes (Zeichen)
const INVITE_CODE_LAENGE: usize = 8;

/// Invite-Service – Verwaltung von Einladungscodes
pub struct InviteService<I: InviteRepository, U: UserRepository> {
    invite_repo: Arc<I>,
    gate: Arc<AuthorizationGate<U>>,
}

impl<I: InviteRepository, U: UserRepository> InviteService<I, U> {
    pub fn neu(invite_repo: Arc<I>, gate: Arc<AuthorizationGate<U>>) -> Arc<Self> {
        Arc::new(Self { invite_repo, gate })
    }

    /// Erstellt einen Einladungscode.
    ///
    /// - `code`: eigener Code, sonst zufaellig generiert
    /// - `uses_left`: Anzahl Nutzungen, `-1` = unbegrenzt
    pub async fn einladung_erstellen(
        &self,
        admin_id: UserId,
        code: Option<&str>,
        uses_left: i64,
    ) -> AuthResult<EinladungRecord> {
        self.gate
            .erzwingen(admin_id, Aktion::AdminMutate, None)
            .await?;
        self.anlegen(code, uses_left, Some(admin_id)).await
    }

    /// Listet alle Einladungen auf (nur Admins)
    pub async fn einladungen_listen(&self, admin_id: UserId) -> AuthResult<Vec<EinladungRecord>> {
        self.gate
            .erzwingen(admin_id, Aktion::AdminAccess, None)
            .await?;
        Ok(self.invite_repo.list().await?)
    }

    /// Legt einen Startcode beim Serverstart an, falls er noch nicht existiert
    pub async fn einladung_sicherstellen(
        &self,
        code: &str,
        uses_left: i64,
    ) -> AuthResult<EinladungRecord> {
        if let Some(vorhanden) = self.invite_repo.get_by_code(code).await? {
            return Ok(vorhanden);
        }
        self.anlegen(Some(code), uses_left, None).await
    }

    async fn anlegen(
        &self,
        code: Option<&str>,
        uses_left: i64,
        ersteller: Option<UserId>,
    ) -> AuthResult<EinladungRecord> {
        if uses_left < UNBEGRENZT || uses_left == 0 {
            return Err(AuthError::validierung(
                "uses_left muss positiv oder -1 (unbegrenzt) sein",
            ));
        }

        let code = match code {
            Some(c) => {
                let c = c.trim();
                code_pruefen(c)?;
                c.to_string()
            }
            None => invite_code_generieren(),
        };

        let einladung = self
            .invite_repo
            .create(NeueEinladung {
                code: &code,
                uses_left,
                created_by: ersteller,
            })
            .await?;

        tracing::info!(
            ersteller = ?ersteller.map(|u| u.inner()),
            code = %code,
            uses_left,
            "Einladung erstellt"
        );

        Ok(einladung)
    }
}

fn code_pruefen(code: &str) -> AuthResult<()> {
    let laenge_ok = (4..=32).contains(&code.len());
    let zeichen_ok = code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !laenge_ok || !zeichen_ok {
        return Err(AuthError::validierung(
            "Einladungscode: 4-32 Zeichen aus A-Z, a-z, 0-9, '-' und '_'",
        ));
    }
    Ok(())
}

/// Generiert einen zufaelligen Einladungscode ohne verwechselbare Zeichen
fn invite_code_generieren() -> String {
    const ZEICHEN: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut bytes = [0u8; INVITE_CODE_LAENGE];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
        .iter()
        .map(|b| ZEICHEN[(*b as usize) % ZEICHEN.len()] as char)
        .collect()
}
