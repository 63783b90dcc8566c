//! Axum-State der REST-Schicht

use std::sync::Arc;

use thw_auth::{
    Aktion, AuthError, AuthService, AuthorizationGate, InviteService, SessionKonfig, SessionStore,
    Verweigerung,
};
use thw_db::SqliteDb;
use thw_observability::{ForumMetriken, HealthState};
use thw_shoutbox::ShoutService;

use crate::error::ApiError;
use crate::rate_limit::RateLimiter;

pub type Auth = AuthService<SqliteDb, SqliteDb, SqliteDb>;
pub type Shouts = ShoutService<SqliteDb, SqliteDb>;
pub type Einladungen = InviteService<SqliteDb, SqliteDb>;

/// Geteilter Zustand aller Handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqliteDb>,
    pub auth: Arc<Auth>,
    pub shouts: Arc<Shouts>,
    pub einladungen: Arc<Einladungen>,
    pub metriken: ForumMetriken,
    pub health: HealthState,
    pub rate_limiter: Arc<RateLimiter>,
    /// Setzt das `Secure`-Attribut am Session-Cookie
    pub cookie_secure: bool,
    /// `X-Forwarded-For` wird nur hinter einem eigenen Reverse Proxy ausgewertet
    pub trusted_proxy: bool,
}

impl AppState {
    /// Verdrahtet alle Services ueber einer Datenbank
    pub fn neu(
        db: Arc<SqliteDb>,
        session_konfig: SessionKonfig,
        rate_limiter: Arc<RateLimiter>,
        metriken: ForumMetriken,
        cookie_secure: bool,
    ) -> Self {
        let sessions = SessionStore::neu(Arc::clone(&db), session_konfig);
        let gate = AuthorizationGate::neu(Arc::clone(&db));
        let auth = Arc::new(AuthService::neu(
            Arc::clone(&db),
            Arc::clone(&db),
            sessions,
            Arc::clone(&gate),
        ));
        let shouts = ShoutService::neu(Arc::clone(&db), Arc::clone(&gate));
        let einladungen = InviteService::neu(Arc::clone(&db), gate);

        Self {
            db,
            auth,
            shouts,
            einladungen,
            metriken,
            health: HealthState::neu(),
            rate_limiter,
            cookie_secure,
            trusted_proxy: false,
        }
    }

    /// Wertet `X-Forwarded-For` fuer Rate Limiting und IP-Protokoll aus
    pub fn mit_trusted_proxy(mut self, trusted_proxy: bool) -> Self {
        self.trusted_proxy = trusted_proxy;
        self
    }

    /// Zaehlt Verweigerungen des Gates fuer die Metriken
    pub fn verweigerung_erfassen(&self, aktion: Aktion, fehler: &ApiError) {
        let grund = match (fehler.verweigerung(), fehler) {
            (Some(v), _) => verweigerung_label(v),
            (None, ApiError::Auth(AuthError::NichtAutorisiert)) => "kein_admin",
            _ => return,
        };
        self.metriken.verweigerung_zaehlen(aktion.als_str(), grund);
    }
}

fn verweigerung_label(v: &Verweigerung) -> &'static str {
    match v {
        Verweigerung::Gebannt { .. } => "gebannt",
        Verweigerung::Stummgeschaltet { .. } => "stummgeschaltet",
        Verweigerung::KeinAdmin => "kein_admin",
    }
}
