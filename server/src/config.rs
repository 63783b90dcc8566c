//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use thw_api::{ApiServerKonfig, RateLimitKonfig};
use thw_auth::SessionKonfig;
use thw_db::DatabaseConfig;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Datenbank-Einstellungen
    pub datenbank: DatenbankEinstellungen,
    /// Session-Lebensdauern
    pub sessions: SessionEinstellungen,
    /// Limits fuer Login und Registrierung pro IP
    pub rate_limit: RateLimitKonfig,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Startwerte fuer eine frische Installation
    pub bootstrap: BootstrapEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Forums
    pub name: String,
    /// Setzt `Secure` am Session-Cookie (nur hinter HTTPS aktivieren)
    pub cookie_secure: bool,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "THW Club".into(),
            cookie_secure: false,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    pub bind_adresse: String,
    /// Port fuer die REST-API
    pub api_port: u16,
    /// CORS-Origins fuer REST (leer = alle erlaubt)
    pub cors_origins: Vec<String>,
    /// Nur aktivieren, wenn ein eigener Reverse Proxy `X-Forwarded-For` setzt
    pub trusted_proxy: bool,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "127.0.0.1".into(),
            api_port: 3000,
            cors_origins: vec![],
            trusted_proxy: false,
        }
    }
}

/// Datenbank-Einstellungen
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    /// Verbindungs-URL
    pub url: String,
    /// Maximale Verbindungspool-Groesse
    pub max_verbindungen: u32,
    pub wal: bool,
    /// Wartezeit auf eine freie Pool-Verbindung in Sekunden
    pub acquire_timeout_sek: u64,
    /// Wartezeit auf eine gesperrte Datenbank in Sekunden
    pub busy_timeout_sek: u64,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        Self {
            url: "sqlite://thw_club.db".into(),
            max_verbindungen: 5,
            wal: true,
            acquire_timeout_sek: 5,
            busy_timeout_sek: 5,
        }
    }
}

/// Session-Lebensdauern
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionEinstellungen {
    /// Lebensdauer ohne "Angemeldet bleiben" in Stunden
    pub ephemeral_stunden: u64,
    /// Lebensdauer mit "Angemeldet bleiben" in Tagen
    pub durable_tage: u64,
    pub cleanup_minuten: u64,
}

impl Default for SessionEinstellungen {
    fn default() -> Self {
        Self {
            ephemeral_stunden: 24,
            durable_tage: 30,
            cleanup_minuten: 15,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Startwerte fuer eine frische Installation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BootstrapEinstellungen {
    /// Einladungscode, der beim Start angelegt wird falls er fehlt
    pub einladungscode: Option<String>,
    /// Nutzungen des Startcodes (-1 = unbegrenzt)
    pub einladung_nutzungen: i64,
    /// Benutzername, der beim Start zum Admin ernannt wird
    pub admin: Option<String>,
}

impl Default for BootstrapEinstellungen {
    fn default() -> Self {
        Self {
            einladungscode: None,
            einladung_nutzungen: 1,
            admin: None,
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Gibt die Bind-Adresse fuer die REST-API zurueck
    pub fn api_bind_adresse(&self) -> anyhow::Result<SocketAddr> {
        let adresse = format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.api_port);
        adresse
            .parse()
            .map_err(|e| anyhow::anyhow!("Ungueltige Bind-Adresse '{adresse}': {e}"))
    }

    pub fn api_konfig(&self) -> anyhow::Result<ApiServerKonfig> {
        Ok(ApiServerKonfig {
            bind_addr: self.api_bind_adresse()?,
            cors_origins: self.netzwerk.cors_origins.clone(),
        })
    }

    pub fn datenbank_config(&self) -> DatabaseConfig {
        let d = &self.datenbank;
        DatabaseConfig {
            url: d.url.clone(),
            max_verbindungen: d.max_verbindungen,
            sqlite_wal: d.wal,
            acquire_timeout: Duration::from_secs(d.acquire_timeout_sek),
            busy_timeout: Duration::from_secs(d.busy_timeout_sek),
        }
    }

    pub fn session_konfig(&self) -> SessionKonfig {
        let s = &self.sessions;
        SessionKonfig {
            ephemeral_ttl: Duration::from_secs(s.ephemeral_stunden * 60 * 60),
            durable_ttl: Duration::from_secs(s.durable_tage * 24 * 60 * 60),
            cleanup_intervall: Duration::from_secs(s.cleanup_minuten.max(1) * 60),
        }
    }
}
