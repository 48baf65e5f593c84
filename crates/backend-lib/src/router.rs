// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP router.
use crate::handlers::auth;
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the HTTP router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/password-strength", post(auth::password_strength))
        .route("/health", get(auth::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new())
        .with_state(state)
}
