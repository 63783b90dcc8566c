//! Prometheus-kompatible Metriken fuer das Forum
//!
//! Registrierte Metriken:
//! - `thw_registrierungen_total` – Counter: Erfolgreiche Registrierungen
//! - `thw_logins_total` – Counter: Login-Versuche (ergebnis)
//! - `thw_verweigerungen_total` – Counter: Verweigerte Aktionen (aktion, grund)
//! - `thw_moderation_aenderungen_total` – Counter: Admin-Aenderungen am Kontostand
//! - `thw_shouts_total` – Counter: Gepostete Shouts
//! - `thw_http_requests_total` – Counter: HTTP-Anfragen (method, path, status)
//! - `thw_http_request_duration_seconds` – Histogram: HTTP-Antwortzeit

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Alle Forum-Prometheus-Metriken
#[derive(Clone)]
pub struct ForumMetriken {
    pub registry: Arc<Registry>,

    // Konto-Metriken
    pub registrierungen_total: IntCounter,
    pub logins_total: IntCounterVec,
    pub verweigerungen_total: IntCounterVec,
    pub moderation_aenderungen_total: IntCounter,

    // Shoutbox
    pub shouts_total: IntCounter,

    // HTTP-Metriken
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
}

impl ForumMetriken {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let registrierungen_total = IntCounter::with_opts(Opts::new(
            "thw_registrierungen_total",
            "Anzahl erfolgreicher Registrierungen",
        ))?;
        registry.register(Box::new(registrierungen_total.clone()))?;

        let logins_total = IntCounterVec::new(
            Opts::new("thw_logins_total", "Login-Versuche nach Ergebnis"),
            &["ergebnis"],
        )?;
        registry.register(Box::new(logins_total.clone()))?;

        let verweigerungen_total = IntCounterVec::new(
            Opts::new(
                "thw_verweigerungen_total",
                "Vom Authorization Gate verweigerte Aktionen",
            ),
            &["aktion", "grund"],
        )?;
        registry.register(Box::new(verweigerungen_total.clone()))?;

        let moderation_aenderungen_total = IntCounter::with_opts(Opts::new(
            "thw_moderation_aenderungen_total",
            "Admin-Aenderungen an Rolle, Bann und Stummschaltung",
        ))?;
        registry.register(Box::new(moderation_aenderungen_total.clone()))?;

        let shouts_total = IntCounter::with_opts(Opts::new(
            "thw_shouts_total",
            "Anzahl geposteter Shouts",
        ))?;
        registry.register(Box::new(shouts_total.clone()))?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("thw_http_requests_total", "Gesamtanzahl HTTP-Anfragen"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "thw_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            registrierungen_total,
            logins_total,
            verweigerungen_total,
            moderation_aenderungen_total,
            shouts_total,
            http_requests_total,
            http_request_duration_seconds,
        })
    }

    /// Login-Ergebnis zaehlen (`erfolg`, `ungueltig`, `verweigert`, `fehler`)
    pub fn login_zaehlen(&self, ergebnis: &str) {
        self.logins_total.with_label_values(&[ergebnis]).inc();
    }

    pub fn verweigerung_zaehlen(&self, aktion: &str, grund: &str) {
        self.verweigerungen_total
            .with_label_values(&[aktion, grund])
            .inc();
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router<S>(metriken: ForumMetriken) -> Router<S> {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<ForumMetriken>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
