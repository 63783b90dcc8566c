//! Session Manager
//!
//! Stellt opake Session-Referenzen aus und validiert sie. Gespeichert wird
//! ausschliesslich der SHA-256-Hash der Referenz; die Referenz selbst kennt
//! nur der Client. Die Persistenz (durable/ephemeral) bestimmt allein die
//! Lebensdauer, niemals die Validierung.
//!
//! Zustaende: nicht ausgestellt -> aktiv -> widerrufen. Ein widerrufener
//! oder abgelaufener Eintrag wird nie wieder gueltig.

use std::{sync::Arc, time::Duration};

use base64::Engine as _;
use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use thw_core::{Persistenz, UserId};
use thw_db::{
    models::{NeueSession, SessionRecord},
    SessionRepository,
};

use crate::error::{AuthError, AuthResult};

/// Lebensdauern und Cleanup-Intervall
#[derive(Debug, Clone)]
pub struct SessionKonfig {
    pub ephemeral_ttl: Duration,
    pub durable_ttl: Duration,
    pub cleanup_intervall: Duration,
}

impl Default for SessionKonfig {
    fn default() -> Self {
        Self {
            ephemeral_ttl: Duration::from_secs(24 * 60 * 60),
            durable_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            cleanup_intervall: Duration::from_secs(15 * 60),
        }
    }
}

impl SessionKonfig {
    pub fn ttl(&self, persistenz: Persistenz) -> Duration {
        match persistenz {
            Persistenz::Durable => self.durable_ttl,
            Persistenz::Ephemeral => self.ephemeral_ttl,
        }
    }
}

/// Frisch ausgestellte Session inklusive Klartext-Referenz
#[derive(Debug, Clone)]
pub struct Session {
    /// Opake Referenz (URL-sicheres Base64), wird nur einmal herausgegeben
    pub token: String,
    pub user_id: UserId,
    pub persistenz: Persistenz,
    pub erstellt_am: DateTime<Utc>,
    pub laeuft_ab_am: DateTime<Utc>,
}

/// Session-Store ueber einem SessionRepository
pub struct SessionStore<S: SessionRepository> {
    repo: Arc<S>,
    konfig: SessionKonfig,
}

impl<S: SessionRepository> SessionStore<S> {
    pub fn neu(repo: Arc<S>, konfig: SessionKonfig) -> Arc<Self> {
        Arc::new(Self { repo, konfig })
    }

    pub fn konfig(&self) -> &SessionKonfig {
        &self.konfig
    }

    /// Erstellt eine neue Session fuer den angegebenen Benutzer
    pub async fn erstellen(&self, user_id: UserId, persistenz: Persistenz) -> AuthResult<Session> {
        let token = token_generieren();
        let hash = token_hash(&token);
        let jetzt = Utc::now();
        let ttl = chrono::Duration::from_std(self.konfig.ttl(persistenz))
            .map_err(|e| AuthError::intern(format!("Session-TTL ungueltig: {e}")))?;
        let laeuft_ab_am = jetzt + ttl;

        self.repo
            .create(NeueSession {
                token_hash: &hash,
                user_id,
                persistenz,
                erstellt_am: jetzt,
                laeuft_ab_am,
            })
            .await?;

        tracing::debug!(
            user_id = %user_id,
            persistenz = persistenz.als_str(),
            "Neue Session erstellt"
        );

        Ok(Session {
            token,
            user_id,
            persistenz,
            erstellt_am: jetzt,
            laeuft_ab_am,
        })
    }

    /// Validiert eine Session-Referenz.
    ///
    /// Unbekannte und abgelaufene Referenzen ergeben gleichermassen
    /// `SessionUngueltig`. Der Kontostand wird hier nicht geprueft.
    pub async fn validieren(&self, token: &str) -> AuthResult<SessionRecord> {
        let hash = token_hash(token);
        let session = self
            .repo
            .get(&hash)
            .await?
            .ok_or(AuthError::SessionUngueltig)?;

        if session.laeuft_ab_am <= Utc::now() {
            self.repo.delete(&hash).await?;
            tracing::debug!(user_id = %session.user_id, "Abgelaufene Session verworfen");
            return Err(AuthError::SessionUngueltig);
        }

        Ok(session)
    }

    /// Widerruft eine Session. Mehrfaches Widerrufen ist kein Fehler.
    pub async fn invalidieren(&self, token: &str) -> AuthResult<()> {
        let entfernt = self.repo.delete(&token_hash(token)).await?;
        if entfernt {
            tracing::debug!("Session invalidiert");
        }
        Ok(())
    }

    /// Widerruft alle Sessions eines Benutzers (Passwortwechsel, Bann)
    pub async fn alle_invalidieren(&self, user_id: UserId) -> AuthResult<u64> {
        let entfernt = self.repo.delete_for_user(user_id).await?;
        if entfernt > 0 {
            tracing::debug!(user_id = %user_id, anzahl = entfernt, "Alle User-Sessions invalidiert");
        }
        Ok(entfernt)
    }

    /// Entfernt abgelaufene Sessions und gibt deren Anzahl zurueck
    pub async fn cleanup_abgelaufene(&self) -> AuthResult<u64> {
        Ok(self.repo.cleanup_expired().await?)
    }
}

/// Generiert eine kryptografisch sichere Session-Referenz (256 Bit)
fn token_generieren() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 (hex) einer Session-Referenz, so wie sie gespeichert wird
pub fn token_hash(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeDb;

    fn store() -> (Arc<FakeDb>, Arc<SessionStore<FakeDb>>) {
        let db = Arc::new(FakeDb::default());
        let store = SessionStore::neu(Arc::clone(&db), SessionKonfig::default());
        (db, store)
    }

    #[tokio::test]
    async fn session_erstellen_und_validieren() {
        let (db, store) = store();
        let user_id = UserId(7);

        let session = store
            .erstellen(user_id, Persistenz::Ephemeral)
            .await
            .expect("Session-Erstellung fehlgeschlagen");
        assert_eq!(session.user_id, user_id);

        let validiert = store.validieren(&session.token).await.unwrap();
        assert_eq!(validiert.user_id, user_id);

        // Nur der Hash liegt im Speicher
        assert!(db.session_hashes().iter().all(|h| h != &session.token));
        assert!(db.session_hashes().contains(&token_hash(&session.token)));
    }

    #[tokio::test]
    async fn persistenz_bestimmt_nur_lebensdauer() {
        let (_, store) = store();

        let kurz = store.erstellen(UserId(1), Persistenz::Ephemeral).await.unwrap();
        let lang = store.erstellen(UserId(1), Persistenz::Durable).await.unwrap();

        assert_eq!(
            (kurz.laeuft_ab_am - kurz.erstellt_am).num_hours(),
            24
        );
        assert_eq!((lang.laeuft_ab_am - lang.erstellt_am).num_days(), 30);

        assert!(store.validieren(&kurz.token).await.is_ok());
        assert!(store.validieren(&lang.token).await.is_ok());
    }

    #[tokio::test]
    async fn unbekannte_session_gibt_fehler() {
        let (_, store) = store();
        let ergebnis = store.validieren("kein_gueltiger_token").await;
        assert!(matches!(ergebnis, Err(AuthError::SessionUngueltig)));
    }

    #[tokio::test]
    async fn abgelaufene_session_ist_ungueltig() {
        let db = Arc::new(FakeDb::default());
        let store = SessionStore::neu(
            Arc::clone(&db),
            SessionKonfig {
                ephemeral_ttl: Duration::ZERO,
                ..SessionKonfig::default()
            },
        );

        let session = store.erstellen(UserId(3), Persistenz::Ephemeral).await.unwrap();
        let ergebnis = store.validieren(&session.token).await;
        assert!(matches!(ergebnis, Err(AuthError::SessionUngueltig)));
        assert!(db.session_hashes().is_empty());
    }

    #[tokio::test]
    async fn invalidieren_ist_idempotent() {
        let (_, store) = store();
        let session = store.erstellen(UserId(2), Persistenz::Durable).await.unwrap();

        store.invalidieren(&session.token).await.unwrap();
        store.invalidieren(&session.token).await.unwrap();
        let ergebnis = store.validieren(&session.token).await;
        assert!(matches!(ergebnis, Err(AuthError::SessionUngueltig)));
    }

    #[tokio::test]
    async fn alle_user_sessions_invalidieren() {
        let (_, store) = store();
        let user_id = UserId(5);

        let s1 = store.erstellen(user_id, Persistenz::Ephemeral).await.unwrap();
        let _s2 = store.erstellen(user_id, Persistenz::Durable).await.unwrap();
        let andere = store.erstellen(UserId(6), Persistenz::Ephemeral).await.unwrap();

        let entfernt = store.alle_invalidieren(user_id).await.unwrap();
        assert_eq!(entfernt, 2);
        assert!(store.validieren(&s1.token).await.is_err());
        assert!(store.validieren(&andere.token).await.is_ok());
    }

    #[tokio::test]
    async fn token_sind_eindeutig() {
        let (_, store) = store();
        let s1 = store.erstellen(UserId(1), Persistenz::Ephemeral).await.unwrap();
        let s2 = store.erstellen(UserId(1), Persistenz::Ephemeral).await.unwrap();
        assert_ne!(s1.token, s2.token, "Session-Tokens muessen eindeutig sein");
        assert_eq!(s1.token.len(), 43);
    }
}
