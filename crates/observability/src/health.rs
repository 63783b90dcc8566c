//! Health-Check fuer das Forum
//!
//! Endpoint: `GET /api/health`
//! Response: JSON mit Status, Version, Uptime und Speicherstatus

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Status des Health-Checks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub db_connected: bool,
}

/// Geteilter Zustand fuer den Health-Check-Handler
#[derive(Clone)]
pub struct HealthState {
    pub start_time: Arc<Instant>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::neu()
    }
}

impl HealthState {
    pub fn neu() -> Self {
        Self {
            start_time: Arc::new(Instant::now()),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Baut die Antwort aus dem Ergebnis des Speicher-Pings.
    ///
    /// Ohne Speicher kann das Forum nichts beantworten, daher 503.
    pub fn antwort(&self, db_connected: bool) -> (StatusCode, Json<HealthResponse>) {
        let (status, http_status) = if db_connected {
            (HealthStatus::Healthy, StatusCode::OK)
        } else {
            (HealthStatus::Unhealthy, StatusCode::SERVICE_UNAVAILABLE)
        };

        let response = HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.uptime_seconds(),
            db_connected,
        };

        (http_status, Json(response))
    }
}
