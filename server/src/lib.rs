//! thw-server – Bibliotheks-Root
//!
//! Verdrahtet Datenbank, Auth-Kern und REST-Schicht zu einem lauffaehigen
//! Forum-Server.

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use config::ServerConfig;
use thw_api::{ApiServer, AppState, RateLimiter};
use thw_auth::{AuthError, SessionStore};
use thw_db::SqliteDb;
use thw_observability::ForumMetriken;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Datenbankverbindung herstellen (inkl. Migrationen)
    /// 2. Services verdrahten und Bootstrap-Werte anlegen
    /// 3. Cleanup-Tasks fuer Sessions und Rate Limiter starten
    /// 4. REST-API starten und auf Ctrl-C warten
    pub async fn starten(self) -> Result<()> {
        let api_konfig = self.config.api_konfig()?;
        tracing::info!(
            forum = %self.config.server.name,
            api = %api_konfig.bind_addr,
            "Server startet"
        );

        tracing::info!(url = %self.config.datenbank.url, "Datenbankverbindung wird hergestellt");
        let db = Arc::new(SqliteDb::oeffnen(&self.config.datenbank_config()).await?);

        let rate_limiter = RateLimiter::neu(self.config.rate_limit.clone());
        let state = AppState::neu(
            Arc::clone(&db),
            self.config.session_konfig(),
            Arc::clone(&rate_limiter),
            ForumMetriken::neu()?,
            self.config.server.cookie_secure,
        )
        .mit_trusted_proxy(self.config.netzwerk.trusted_proxy);

        self.bootstrap(&state).await?;

        session_cleanup_starten(Arc::clone(state.auth.sessions()));
        rate_limiter_cleanup_starten(rate_limiter);

        ApiServer::neu(api_konfig)
            .starten(state, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(fehler = %e, "Shutdown-Signal nicht empfangbar");
                }
                tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            })
            .await?;

        db.schliessen().await;
        Ok(())
    }

    /// Legt den Startcode an und ernennt den konfigurierten Admin
    async fn bootstrap(&self, state: &AppState) -> Result<()> {
        let bootstrap = &self.config.bootstrap;

        if let Some(code) = bootstrap.einladungscode.as_deref() {
            let einladung = state
                .einladungen
                .einladung_sicherstellen(code, bootstrap.einladung_nutzungen)
                .await?;
            tracing::info!(
                code = %einladung.code,
                uses_left = einladung.uses_left,
                "Start-Einladung bereit"
            );
        }

        if let Some(username) = bootstrap.admin.as_deref() {
            match state.auth.admin_ernennen(username).await {
                Ok(admin) => tracing::info!(user_id = %admin.id, username = %admin.username, "Bootstrap-Admin aktiv"),
                // Konto existiert noch nicht, beim naechsten Start erneut versuchen
                Err(AuthError::BenutzerNichtGefunden(_)) => {
                    tracing::warn!(username, "Bootstrap-Admin noch nicht registriert");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }
}

/// Entfernt periodisch abgelaufene Sessions
fn session_cleanup_starten(sessions: Arc<SessionStore<SqliteDb>>) {
    let intervall = sessions.konfig().cleanup_intervall;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(intervall);
        loop {
            ticker.tick().await;
            match sessions.cleanup_abgelaufene().await {
                Ok(anzahl) if anzahl > 0 => {
                    tracing::debug!(anzahl, "Abgelaufene Sessions bereinigt");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(fehler = %e, "Session-Cleanup fehlgeschlagen");
                }
            }
        }
    });
}

fn rate_limiter_cleanup_starten(limiter: Arc<RateLimiter>) {
    tokio::spawn(async move {
        let mut intervall = tokio::time::interval(Duration::from_secs(60));
        loop {
            intervall.tick().await;
            limiter.cleanup();
        }
    });
}
