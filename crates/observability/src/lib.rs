//! # thw-observability
//!
//! Observability-Crate fuer das Forum:
//! - Prometheus-kompatible Metriken (`/metrics`)
//! - Health-Antwort fuer `/api/health`
//! - Structured Logging via tracing-subscriber (Text oder JSON)
//! - Request-Timing Middleware

pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;

pub use health::{HealthResponse, HealthState, HealthStatus};
pub use logging::logging_initialisieren;
pub use metrics::{metrics_router, ForumMetriken};
pub use middleware::timing_middleware;
