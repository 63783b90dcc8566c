//! In-Memory-Fakes der Repositories fuer Unit-Tests

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use chrono::Utc;
use thw_core::{Rolle, UserId};
use thw_db::{
    models::{
        BenutzerProfil, BenutzerRecord, EinladungRecord, IpLogRecord, NeueEinladung, NeueSession,
        NeuerBenutzer, ProfilUpdate, SessionRecord, StandUpdate, UNBEGRENZT,
    },
    DbError, DbResult, InviteRepository, IpLogRepository, SessionRepository, UserRepository,
};

#[derive(Default)]
pub(crate) struct FakeDb {
    benutzer: Mutex<Vec<BenutzerRecord>>,
    einladungen: Mutex<Vec<EinladungRecord>>,
    sessions: Mutex<Vec<SessionRecord>>,
    ip_logs: Mutex<Vec<(UserId, IpLogRecord)>>,
    /// Simuliert einen nicht erreichbaren Speicher
    ausfall: AtomicBool,
}

impl FakeDb {
    pub(crate) fn mit_einladung(code: &str, uses_left: i64) -> Self {
        let db = Self::default();
        db.einladungen.lock().unwrap().push(EinladungRecord {
            code: code.into(),
            uses_left,
            created_by: None,
            created_at: Utc::now(),
        });
        db
    }

    pub(crate) fn ausfall_setzen(&self, ausfall: bool) {
        self.ausfall.store(ausfall, Ordering::SeqCst);
    }

    pub(crate) fn session_hashes(&self) -> Vec<String> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.token_hash.clone())
            .collect()
    }

    pub(crate) fn uses_left(&self, code: &str) -> Option<i64> {
        self.einladungen
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.code == code)
            .map(|e| e.uses_left)
    }

    /// Setzt den Stand direkt, an allen Sync-Regeln vorbei (Altdaten)
    pub(crate) fn stand_setzen(&self, id: UserId, rolle: Rolle, gebannt: bool, stumm: bool) {
        let mut benutzer = self.benutzer.lock().unwrap();
        let u = benutzer.iter_mut().find(|u| u.id == id).unwrap();
        u.rolle = rolle;
        u.is_banned = gebannt;
        u.is_muted = stumm;
    }

    fn pruefen(&self) -> DbResult<()> {
        if self.ausfall.load(Ordering::SeqCst) {
            return Err(DbError::NichtVerfuegbar("pool timed out".into()));
        }
        Ok(())
    }
}

impl UserRepository for FakeDb {
    async fn create(
        &self,
        data: NeuerBenutzer<'_>,
        einladungscode: &str,
    ) -> DbResult<BenutzerRecord> {
        self.pruefen()?;
        let mut einladungen = self.einladungen.lock().unwrap();
        let einladung = einladungen
            .iter_mut()
            .find(|e| e.code == einladungscode)
            .ok_or(DbError::EinladungUngueltig)?;
        if !einladung.ist_nutzbar() {
            return Err(DbError::EinladungErschoepft);
        }

        let mut benutzer = self.benutzer.lock().unwrap();
        if benutzer.iter().any(|u| {
            u.username.eq_ignore_ascii_case(data.username) || u.email.eq_ignore_ascii_case(data.email)
        }) {
            return Err(DbError::Eindeutigkeit("users.username".into()));
        }

        let record = BenutzerRecord {
            id: UserId(benutzer.len() as i64 + 1),
            username: data.username.into(),
            email: data.email.into(),
            password_hash: data.password_hash.into(),
            rolle: Rolle::User,
            is_banned: false,
            is_muted: false,
            ban_reason: None,
            mute_reason: None,
            registriert_am: Utc::now(),
            last_login: None,
            profil: BenutzerProfil {
                avatar_url: data.avatar_url.into(),
                ..Default::default()
            },
        };
        benutzer.push(record.clone());
        if einladung.uses_left != UNBEGRENZT {
            einladung.uses_left -= 1;
        }
        Ok(record)
    }

    async fn get_by_id(&self, id: UserId) -> DbResult<Option<BenutzerRecord>> {
        self.pruefen()?;
        Ok(self
            .benutzer
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_by_identifier(&self, identifier: &str) -> DbResult<Option<BenutzerRecord>> {
        self.pruefen()?;
        Ok(self
            .benutzer
            .lock()
            .unwrap()
            .iter()
            .find(|u| {
                u.username.eq_ignore_ascii_case(identifier)
                    || u.email.eq_ignore_ascii_case(identifier)
            })
            .cloned())
    }

    async fn list(&self) -> DbResult<Vec<BenutzerRecord>> {
        self.pruefen()?;
        let mut alle = self.benutzer.lock().unwrap().clone();
        alle.reverse();
        Ok(alle)
    }

    async fn list_staff(&self) -> DbResult<Vec<BenutzerRecord>> {
        self.pruefen()?;
        Ok(self
            .benutzer
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.rolle.ist_staff())
            .cloned()
            .collect())
    }

    async fn update_profile(&self, id: UserId, data: ProfilUpdate) -> DbResult<BenutzerRecord> {
        self.pruefen()?;
        let mut benutzer = self.benutzer.lock().unwrap();
        let u = benutzer
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| DbError::nicht_gefunden(id.to_string()))?;
        let p = &mut u.profil;
        if let Some(v) = data.avatar_url {
            p.avatar_url = v;
        }
        if let Some(v) = data.avatar_color {
            p.avatar_color = v;
        }
        if let Some(v) = data.location {
            p.location = v;
        }
        if let Some(v) = data.website {
            p.website = v;
        }
        if let Some(v) = data.about {
            p.about = v;
        }
        if let Some(v) = data.dob_day {
            p.dob_day = v;
        }
        if let Some(v) = data.dob_month {
            p.dob_month = v;
        }
        if let Some(v) = data.dob_year {
            p.dob_year = v;
        }
        if let Some(v) = data.show_dob_date {
            p.show_dob_date = v;
        }
        if let Some(v) = data.show_dob_year {
            p.show_dob_year = v;
        }
        if let Some(v) = data.receive_emails {
            p.receive_emails = v;
        }
        Ok(u.clone())
    }

    async fn update_secret(&self, id: UserId, password_hash: &str) -> DbResult<()> {
        self.pruefen()?;
        let mut benutzer = self.benutzer.lock().unwrap();
        let u = benutzer
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| DbError::nicht_gefunden(id.to_string()))?;
        u.password_hash = password_hash.into();
        Ok(())
    }

    async fn update_standing(&self, id: UserId, stand: StandUpdate) -> DbResult<BenutzerRecord> {
        self.pruefen()?;
        let mut benutzer = self.benutzer.lock().unwrap();
        let u = benutzer
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| DbError::nicht_gefunden(id.to_string()))?;
        u.rolle = stand.rolle;
        u.is_banned = stand.is_banned;
        u.is_muted = stand.is_muted;
        u.ban_reason = stand.ban_reason;
        u.mute_reason = stand.mute_reason;
        Ok(u.clone())
    }

    async fn update_last_login(&self, id: UserId) -> DbResult<()> {
        self.pruefen()?;
        if let Some(u) = self.benutzer.lock().unwrap().iter_mut().find(|u| u.id == id) {
            u.last_login = Some(Utc::now());
        }
        Ok(())
    }
}

impl InviteRepository for FakeDb {
    async fn create(&self, data: NeueEinladung<'_>) -> DbResult<EinladungRecord> {
        self.pruefen()?;
        let mut einladungen = self.einladungen.lock().unwrap();
        if einladungen.iter().any(|e| e.code == data.code) {
            return Err(DbError::Eindeutigkeit(data.code.into()));
        }
        let record = EinladungRecord {
            code: data.code.into(),
            uses_left: data.uses_left,
            created_by: data.created_by,
            created_at: Utc::now(),
        };
        einladungen.push(record.clone());
        Ok(record)
    }

    async fn get_by_code(&self, code: &str) -> DbResult<Option<EinladungRecord>> {
        self.pruefen()?;
        Ok(self
            .einladungen
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.code == code)
            .cloned())
    }

    async fn list(&self) -> DbResult<Vec<EinladungRecord>> {
        self.pruefen()?;
        Ok(self.einladungen.lock().unwrap().clone())
    }
}

impl SessionRepository for FakeDb {
    async fn create(&self, data: NeueSession<'_>) -> DbResult<SessionRecord> {
        self.pruefen()?;
        let record = SessionRecord {
            token_hash: data.token_hash.into(),
            user_id: data.user_id,
            persistenz: data.persistenz,
            erstellt_am: data.erstellt_am,
            laeuft_ab_am: data.laeuft_ab_am,
        };
        self.sessions.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn get(&self, token_hash: &str) -> DbResult<Option<SessionRecord>> {
        self.pruefen()?;
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.token_hash == token_hash)
            .cloned())
    }

    async fn delete(&self, token_hash: &str) -> DbResult<bool> {
        self.pruefen()?;
        let mut sessions = self.sessions.lock().unwrap();
        let vorher = sessions.len();
        sessions.retain(|s| s.token_hash != token_hash);
        Ok(sessions.len() < vorher)
    }

    async fn delete_for_user(&self, user_id: UserId) -> DbResult<u64> {
        self.pruefen()?;
        let mut sessions = self.sessions.lock().unwrap();
        let vorher = sessions.len();
        sessions.retain(|s| s.user_id != user_id);
        Ok((vorher - sessions.len()) as u64)
    }

    async fn cleanup_expired(&self) -> DbResult<u64> {
        self.pruefen()?;
        let jetzt = Utc::now();
        let mut sessions = self.sessions.lock().unwrap();
        let vorher = sessions.len();
        sessions.retain(|s| s.laeuft_ab_am > jetzt);
        Ok((vorher - sessions.len()) as u64)
    }
}

impl IpLogRepository for FakeDb {
    async fn record(&self, user_id: UserId, ip: &str) -> DbResult<()> {
        self.pruefen()?;
        let jetzt = Utc::now();
        let mut logs = self.ip_logs.lock().unwrap();
        match logs.iter_mut().find(|(u, l)| *u == user_id && l.ip == ip) {
            Some((_, l)) => {
                l.total += 1;
                l.latest = jetzt;
            }
            None => logs.push((
                user_id,
                IpLogRecord {
                    ip: ip.into(),
                    total: 1,
                    earliest: jetzt,
                    latest: jetzt,
                },
            )),
        }
        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId) -> DbResult<Vec<IpLogRecord>> {
        self.pruefen()?;
        Ok(self
            .ip_logs
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, l)| l.clone())
            .collect())
    }
}
