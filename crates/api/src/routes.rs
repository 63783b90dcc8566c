//! Route-Definitionen fuer die REST-API (/api/...)

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use thw_observability::{metrics_router, timing_middleware};

use crate::handlers;
use crate::state::AppState;

/// Erstellt den vollstaendigen Router inklusive `/metrics`, Timing und Tracing
pub fn router(state: AppState) -> Router {
    let metriken = state.metriken.clone();

    api_router()
        .with_state(state)
        .merge(metrics_router(metriken.clone()))
        .layer(middleware::from_fn_with_state(metriken, timing_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Alle /api/-Routen
pub fn api_router() -> Router<AppState> {
    Router::new()
        // System
        .route("/api/health", get(handlers::system::health))
        // Anmeldung
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
        // Benutzer
        .route("/api/users", get(handlers::users::list_users))
        .route("/api/users/staff", get(handlers::users::list_staff))
        .route("/api/users/me", put(handlers::users::update_me))
        .route("/api/users/me/avatar", put(handlers::users::update_avatar))
        .route("/api/users/me/password", put(handlers::users::update_password))
        .route(
            "/api/users/me/ip",
            get(handlers::users::ip_history).post(handlers::users::log_ip),
        )
        .route("/api/users/:id", get(handlers::users::get_user))
        // Shoutbox
        .route(
            "/api/shouts",
            get(handlers::shouts::list_shouts).post(handlers::shouts::post_shout),
        )
        // Admin
        .route("/api/admin/users", get(handlers::admin::list_users))
        .route("/api/admin/users/:id", put(handlers::admin::edit_user))
        .route(
            "/api/admin/invites",
            get(handlers::admin::list_invites).post(handlers::admin::create_invite),
        )
}
