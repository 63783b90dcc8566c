//! Auth-Service fuer das Forum
//!
//! Zentraler Einstiegspunkt fuer Registrierung, Login, Logout,
//! Self-Service am eigenen Konto und die Admin-Benutzerverwaltung.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thw_core::{Persistenz, Rolle, UserId};
use thw_db::{
    models::{BenutzerRecord, IpLogRecord, NeuerBenutzer, ProfilUpdate, StandUpdate},
    IpLogRepository, SessionRepository, UserRepository,
};

use crate::{
    authorization::{entscheiden, Aktion, AuthorizationGate, Entscheidung},
    error::{AuthError, AuthResult},
    moderation::{ModerationService, ModerationsAenderung},
    password::{
        passwort_blind_verifizieren, passwort_hashen, passwort_pruefen, passwort_verifizieren,
    },
    session::{Session, SessionStore},
    standing::{aufloesen, Stand},
};

/// Eingaben fuer eine Registrierung
#[derive(Debug, Clone)]
pub struct Registrierung<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub passwort: &'a str,
    pub einladungscode: &'a str,
}

/// Benutzeransicht fuer das eigene Konto und die Admin-Liste.
///
/// Enthaelt niemals das Geheimnis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenutzerUebersicht {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Rolle,
    pub registration_date: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub avatar_url: String,
    pub avatar_color: Option<String>,
    pub is_banned: bool,
    pub is_muted: bool,
    pub ban_reason: Option<String>,
    pub mute_reason: Option<String>,
}

impl From<&BenutzerRecord> for BenutzerUebersicht {
    fn from(r: &BenutzerRecord) -> Self {
        Self {
            id: r.id,
            username: r.username.clone(),
            email: r.email.clone(),
            role: r.rolle,
            registration_date: r.registriert_am,
            last_login: r.last_login,
            avatar_url: r.profil.avatar_url.clone(),
            avatar_color: r.profil.avatar_color.clone(),
            is_banned: r.is_banned,
            is_muted: r.is_muted,
            ban_reason: r.ban_reason.clone(),
            mute_reason: r.mute_reason.clone(),
        }
    }
}

/// Auth-Service – zentraler Einstiegspunkt fuer alle Kontovorgaenge
pub struct AuthService<U: UserRepository, S: SessionRepository, L: IpLogRepository> {
    user_repo: Arc<U>,
    ip_repo: Arc<L>,
    session_store: Arc<SessionStore<S>>,
    gate: Arc<AuthorizationGate<U>>,
    moderation: Arc<ModerationService<U, S>>,
}

impl<U: UserRepository, S: SessionRepository, L: IpLogRepository> AuthService<U, S, L> {
    pub fn neu(
        user_repo: Arc<U>,
        ip_repo: Arc<L>,
        session_store: Arc<SessionStore<S>>,
        gate: Arc<AuthorizationGate<U>>,
    ) -> Self {
        let moderation = ModerationService::neu(
            Arc::clone(&user_repo),
            Arc::clone(&gate),
            Arc::clone(&session_store),
        );
        Self {
            user_repo,
            ip_repo,
            session_store,
            gate,
            moderation,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore<S>> {
        &self.session_store
    }

    pub fn gate(&self) -> &Arc<AuthorizationGate<U>> {
        &self.gate
    }

    /// Registriert einen neuen Benutzer und meldet ihn direkt an.
    ///
    /// Einladung, Duplikatpruefung und Anlage laufen atomar im Credential
    /// Store. Auch der Auto-Login prueft den Kontostand.
    pub async fn registrieren(
        &self,
        daten: Registrierung<'_>,
        persistenz: Persistenz,
    ) -> AuthResult<(BenutzerRecord, Session)> {
        let username = daten.username.trim();
        let email = daten.email.trim();
        let code = daten.einladungscode.trim();

        username_pruefen(username)?;
        email_pruefen(email)?;
        passwort_pruefen(daten.passwort)?;
        if code.is_empty() {
            return Err(AuthError::EinladungUngueltig);
        }

        let passwort_hash = passwort_hashen(daten.passwort)?;
        let avatar_url = standard_avatar(username);

        let benutzer = self
            .user_repo
            .create(
                NeuerBenutzer {
                    username,
                    email,
                    password_hash: &passwort_hash,
                    avatar_url: &avatar_url,
                },
                code,
            )
            .await
            .map_err(|e| match AuthError::from(e) {
                AuthError::Duplikat(_) => {
                    AuthError::Duplikat("Benutzername oder E-Mail".into())
                }
                andere => andere,
            })?;

        tracing::info!(
            user_id = %benutzer.id,
            username = %benutzer.username,
            "Neuer Benutzer registriert"
        );

        entscheiden(&benutzer, Aktion::Login).erzwingen()?;
        let session = self.session_oeffnen(&benutzer, persistenz).await?;

        Ok((benutzer, session))
    }

    /// Meldet einen Benutzer per Benutzername oder E-Mail an.
    ///
    /// Der Kontostand wird erst nach erfolgreicher Passwortpruefung
    /// ausgewertet, ein falsches Passwort verraet also keinen Bann.
    pub async fn anmelden(
        &self,
        kennung: &str,
        passwort: &str,
        persistenz: Persistenz,
    ) -> AuthResult<(BenutzerRecord, Session)> {
        let kennung = kennung.trim();
        let Some(benutzer) = self.user_repo.find_by_identifier(kennung).await? else {
            // Gleiche Hash-Arbeit wie bei falschem Passwort
            passwort_blind_verifizieren(passwort);
            tracing::warn!(kennung = %kennung, "Fehlgeschlagener Login-Versuch");
            return Err(AuthError::UngueltigeAnmeldedaten);
        };

        let korrekt = match passwort_verifizieren(passwort, &benutzer.password_hash) {
            Ok(korrekt) => korrekt,
            Err(e) => {
                tracing::warn!(user_id = %benutzer.id, fehler = %e, "Gespeicherter Hash unlesbar");
                false
            }
        };
        if !korrekt {
            tracing::warn!(kennung = %kennung, "Fehlgeschlagener Login-Versuch");
            return Err(AuthError::UngueltigeAnmeldedaten);
        }

        if let Entscheidung::Verweigert(grund) = entscheiden(&benutzer, Aktion::Login) {
            tracing::warn!(user_id = %benutzer.id, grund = %grund, "Login verweigert");
            return Err(AuthError::Verweigert(grund));
        }

        let session = self.session_oeffnen(&benutzer, persistenz).await?;

        tracing::info!(
            user_id = %benutzer.id,
            username = %benutzer.username,
            persistenz = persistenz.als_str(),
            "Benutzer angemeldet"
        );

        Ok((benutzer, session))
    }

    async fn session_oeffnen(
        &self,
        benutzer: &BenutzerRecord,
        persistenz: Persistenz,
    ) -> AuthResult<Session> {
        self.user_repo.update_last_login(benutzer.id).await?;
        self.session_store.erstellen(benutzer.id, persistenz).await
    }

    /// Meldet ab. Unbekannte Referenzen sind kein Fehler.
    pub async fn abmelden(&self, token: &str) -> AuthResult<()> {
        self.session_store.invalidieren(token).await?;
        tracing::debug!("Session invalidiert (Abmeldung)");
        Ok(())
    }

    /// Liefert den Benutzer zu einer Session-Referenz.
    ///
    /// Der Kontostand wird bei jedem Aufruf neu aufgeloest; ist das Konto
    /// inzwischen gebannt, wird die Session widerrufen.
    pub async fn aktueller_benutzer(&self, token: &str) -> AuthResult<BenutzerRecord> {
        let session = self.session_store.validieren(token).await?;

        let Some(benutzer) = self.user_repo.get_by_id(session.user_id).await? else {
            self.session_store.invalidieren(token).await?;
            return Err(AuthError::SessionUngueltig);
        };

        if let Stand::Verweigert(grund) = aufloesen(&benutzer) {
            self.session_store.invalidieren(token).await?;
            tracing::info!(user_id = %benutzer.id, "Session eines gebannten Kontos widerrufen");
            return Err(AuthError::Verweigert(grund));
        }

        Ok(benutzer)
    }

    /// Oeffentliches Profil eines Benutzers
    pub async fn benutzer_laden(&self, id: UserId) -> AuthResult<BenutzerRecord> {
        self.user_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AuthError::BenutzerNichtGefunden(id.to_string()))
    }

    pub async fn benutzer_listen(&self) -> AuthResult<Vec<BenutzerRecord>> {
        Ok(self.user_repo.list().await?)
    }

    /// Admins und Moderatoren
    pub async fn team_listen(&self) -> AuthResult<Vec<BenutzerRecord>> {
        Ok(self.user_repo.list_staff().await?)
    }

    /// Aktualisiert Profilfelder des eigenen Kontos
    pub async fn profil_aktualisieren(
        &self,
        user_id: UserId,
        aenderung: ProfilUpdate,
    ) -> AuthResult<BenutzerRecord> {
        profil_pruefen(&aenderung)?;
        let benutzer = self.user_repo.update_profile(user_id, aenderung).await?;
        tracing::debug!(user_id = %user_id, "Profil aktualisiert");
        Ok(benutzer)
    }

    /// Aendert das Passwort des eigenen Kontos.
    ///
    /// Erfordert das alte Passwort. Danach sind alle Sessions des Benutzers
    /// widerrufen, auch die aktuelle.
    pub async fn passwort_aendern(
        &self,
        user_id: UserId,
        altes_passwort: &str,
        neues_passwort: &str,
    ) -> AuthResult<()> {
        let benutzer = self.benutzer_laden(user_id).await?;

        if !passwort_verifizieren(altes_passwort, &benutzer.password_hash).unwrap_or(false) {
            return Err(AuthError::UngueltigeAnmeldedaten);
        }
        passwort_pruefen(neues_passwort)?;

        let neuer_hash = passwort_hashen(neues_passwort)?;
        self.user_repo.update_secret(user_id, &neuer_hash).await?;

        let anzahl = self.session_store.alle_invalidieren(user_id).await?;
        tracing::info!(
            user_id = %user_id,
            invalidierte_sessions = anzahl,
            "Passwort geaendert, Sessions invalidiert"
        );

        Ok(())
    }

    /// Protokolliert die IP-Adresse einer Anfrage des Benutzers
    pub async fn ip_protokollieren(&self, user_id: UserId, ip: &str) -> AuthResult<()> {
        let ip = ip.trim();
        if ip.is_empty() || ip.len() > 64 {
            return Err(AuthError::validierung("Ungueltige IP-Adresse"));
        }
        self.ip_repo.record(user_id, ip).await?;
        Ok(())
    }

    pub async fn ip_verlauf(&self, user_id: UserId) -> AuthResult<Vec<IpLogRecord>> {
        Ok(self.ip_repo.list_for_user(user_id).await?)
    }

    /// Admin: alle Benutzer mit Moderationsstand
    pub async fn admin_benutzer_listen(
        &self,
        admin_id: UserId,
    ) -> AuthResult<Vec<BenutzerUebersicht>> {
        self.gate
            .erzwingen(admin_id, Aktion::AdminAccess, None)
            .await?;
        let benutzer = self.user_repo.list().await?;
        Ok(benutzer.iter().map(BenutzerUebersicht::from).collect())
    }

    /// Admin: Rolle, Bann und Stummschaltung eines Benutzers aendern
    pub async fn admin_benutzer_bearbeiten(
        &self,
        admin_id: UserId,
        ziel_id: UserId,
        aenderung: &ModerationsAenderung,
    ) -> AuthResult<BenutzerUebersicht> {
        let neu = self
            .moderation
            .aenderung_anwenden(admin_id, ziel_id, aenderung)
            .await?;
        Ok(BenutzerUebersicht::from(&neu))
    }

    /// Befoerdert einen Benutzer beim Serverstart zum Admin (Bootstrap)
    pub async fn admin_ernennen(&self, username: &str) -> AuthResult<BenutzerRecord> {
        let benutzer = self
            .user_repo
            .find_by_identifier(username)
            .await?
            .ok_or_else(|| AuthError::BenutzerNichtGefunden(username.to_string()))?;

        if benutzer.rolle == Rolle::Admin && !benutzer.is_banned {
            return Ok(benutzer);
        }

        let stand = StandUpdate {
            rolle: Rolle::Admin,
            is_banned: false,
            is_muted: benutzer.is_muted,
            ban_reason: None,
            mute_reason: benutzer.mute_reason.clone(),
        };
        let neu = self.user_repo.update_standing(benutzer.id, stand).await?;
        tracing::info!(user_id = %neu.id, username = %neu.username, "Benutzer zum Admin ernannt");
        Ok(neu)
    }
}

/// Standard-Avatar aus dem Benutzernamen
pub fn standard_avatar(username: &str) -> String {
    format!("https://ui-avatars.com/api/?name={username}&background=333333&color=cccccc")
}

fn username_pruefen(username: &str) -> AuthResult<()> {
    let laenge = username.chars().count();
    if !(3..=32).contains(&laenge) {
        return Err(AuthError::validierung(
            "Benutzername muss 3 bis 32 Zeichen lang sein",
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(AuthError::validierung(
            "Benutzername darf nur A-Z, a-z, 0-9, '_', '-' und '.' enthalten",
        ));
    }
    Ok(())
}

fn email_pruefen(email: &str) -> AuthResult<()> {
    let gueltig = email.len() <= 254
        && !email.chars().any(char::is_whitespace)
        && match email.split_once('@') {
            Some((lokal, domain)) => {
                !lokal.is_empty() && !domain.contains('@') && domain.contains('.')
            }
            None => false,
        };
    if !gueltig {
        return Err(AuthError::validierung("Ungueltige E-Mail-Adresse"));
    }
    Ok(())
}

fn profil_pruefen(p: &ProfilUpdate) -> AuthResult<()> {
    if let Some(url) = &p.avatar_url {
        if url.trim().is_empty() || url.len() > 2048 {
            return Err(AuthError::validierung("Ungueltige Avatar-URL"));
        }
    }
    for (feld, wert, max) in [
        ("location", &p.location, 100),
        ("website", &p.website, 255),
        ("about", &p.about, 5000),
        ("avatarColor", &p.avatar_color, 32),
    ] {
        if let Some(Some(text)) = wert {
            if text.chars().count() > max {
                return Err(AuthError::validierung(format!(
                    "{feld} darf hoechstens {max} Zeichen lang sein"
                )));
            }
        }
    }
    let im_bereich = |wert: Option<Option<i64>>, min: i64, max: i64| match wert {
        Some(Some(v)) => (min..=max).contains(&v),
        _ => true,
    };
    if !im_bereich(p.dob_day, 1, 31)
        || !im_bereich(p.dob_month, 1, 12)
        || !im_bereich(p.dob_year, 1900, 2100)
    {
        return Err(AuthError::validierung("Ungueltiges Geburtsdatum"));
    }
    Ok(())
}
