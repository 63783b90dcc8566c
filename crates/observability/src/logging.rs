//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable (ueberschreibt die Konfigurationsdatei):
//! - `THW_LOG_LEVEL`: Filter-Direktive (trace/debug/info/warn/error oder
//!   EnvFilter-Syntax wie `thw_auth=debug,info`), Standard: info
//! - `THW_LOG_FORMAT`: Format (text/json), Standard: text

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "THW_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "THW_LOG_FORMAT";

/// Initialisiert das Logging-System.
///
/// `level` und `format` stammen aus der Konfiguration und werden von den
/// Umgebungsvariablen ueberschrieben. Ein unbrauchbarer Filter faellt auf
/// `info` zurueck.
pub fn logging_initialisieren(level: &str, format: &str) -> Result<()> {
    let (level, format) = einstellungen_aufloesen(
        level,
        format,
        std::env::var(ENV_LOG_LEVEL).ok(),
        std::env::var(ENV_LOG_FORMAT).ok(),
    );

    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));

    match format.as_str() {
        "json" => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Logging-Initialisierung fehlgeschlagen: {e}"))?,
        _ => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Logging-Initialisierung fehlgeschlagen: {e}"))?,
    }

    Ok(())
}

/// Umgebung vor Konfiguration; ungueltige Formate werden zu `text`.
fn einstellungen_aufloesen(
    level: &str,
    format: &str,
    level_env: Option<String>,
    format_env: Option<String>,
) -> (String, String) {
    let level = level_env
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| level.to_string());
    let format = format_env.unwrap_or_else(|| format.to_string());
    let format = if log_format_gueltig(&format) {
        format
    } else {
        "text".to_string()
    };
    (level, format)
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}
