//! Axum HTTP-Server fuer die REST-API

use std::net::SocketAddr;

use anyhow::Result;
use axum::http::{HeaderValue, Method};
use tower_http::cors::CorsLayer;

use crate::routes::router;
use crate::state::AppState;

/// REST-Server-Konfiguration
#[derive(Debug, Clone)]
pub struct ApiServerKonfig {
    pub bind_addr: SocketAddr,
    /// Erlaubte CORS-Origins. Leer = alle Origins erlaubt (nur fuer Entwicklung).
    pub cors_origins: Vec<String>,
}

impl Default for ApiServerKonfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            cors_origins: vec![],
        }
    }
}

/// Axum HTTP-Server des Forums
pub struct ApiServer {
    konfig: ApiServerKonfig,
}

impl ApiServer {
    pub fn neu(konfig: ApiServerKonfig) -> Self {
        Self { konfig }
    }

    fn cors(&self) -> CorsLayer {
        if self.konfig.cors_origins.is_empty() {
            return CorsLayer::permissive();
        }
        let origins: Vec<HeaderValue> = self
            .konfig
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ])
            .allow_credentials(true)
    }

    /// Startet den Server und laeuft bis `shutdown` aufgeloest wird
    pub async fn starten(
        self,
        state: AppState,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let app = router(state).layer(self.cors());

        let listener = tokio::net::TcpListener::bind(self.konfig.bind_addr).await?;
        tracing::info!(addr = %self.konfig.bind_addr, "REST-Server gestartet");

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;

        tracing::info!("REST-Server beendet");
        Ok(())
    }
}
