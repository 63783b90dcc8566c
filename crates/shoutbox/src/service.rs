//! ShoutService – Shouts posten und auflisten

use std::sync::Arc;

use thw_auth::{Aktion, AuthorizationGate};
use thw_core::UserId;
use thw_db::{models::NeuerShout, ShoutRepository, UserRepository};

use crate::{
    error::{ShoutError, ShoutResult},
    types::ShoutNachricht,
};

/// Maximale Laenge eines Shouts in Zeichen
pub const MAX_SHOUT_LAENGE: usize = 500;

const STANDARD_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 100;

/// ShoutService verwaltet die Kurznachrichten der Startseite
pub struct ShoutService<H: ShoutRepository, U: UserRepository> {
    repo: Arc<H>,
    gate: Arc<AuthorizationGate<U>>,
}

impl<H: ShoutRepository, U: UserRepository> ShoutService<H, U> {
    /// Erstellt einen neuen ShoutService
    pub fn neu(repo: Arc<H>, gate: Arc<AuthorizationGate<U>>) -> Arc<Self> {
        Arc::new(Self { repo, gate })
    }

    /// Shout posten.
    ///
    /// Prueft zuerst das Gate (`Post`), gebannte und stummgeschaltete
    /// Konten erhalten eine Verweigerung mit Grund.
    pub async fn posten(&self, akteur_id: UserId, text: &str) -> ShoutResult<ShoutNachricht> {
        self.gate.erzwingen(akteur_id, Aktion::Post, None).await?;

        let text = text.trim();
        if text.is_empty() {
            return Err(ShoutError::UngueltigeEingabe(
                "Nachricht darf nicht leer sein".into(),
            ));
        }

        let laenge = text.chars().count();
        if laenge > MAX_SHOUT_LAENGE {
            return Err(ShoutError::UngueltigeEingabe(format!(
                "Nachricht zu lang: {laenge} Zeichen (Maximum: {MAX_SHOUT_LAENGE})"
            )));
        }

        let record = self
            .repo
            .create(NeuerShout {
                user_id: akteur_id,
                message: text,
            })
            .await?;

        tracing::debug!(user_id = %akteur_id, shout_id = record.id, "Shout gepostet");
        Ok(record.into())
    }

    /// Neueste Shouts zuerst (Default 50, hoechstens 100)
    pub async fn neueste(&self, limit: Option<i64>) -> ShoutResult<Vec<ShoutNachricht>> {
        let limit = limit.unwrap_or(STANDARD_LIMIT).clamp(1, MAX_LIMIT);
        let records = self.repo.recent(limit).await?;
        Ok(records.into_iter().map(ShoutNachricht::from).collect())
    }
}
