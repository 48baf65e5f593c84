// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! HTTP handlers for the account endpoints.
//!
//! The bearer token is read from `Authorization: Bearer <token>` or, failing
//! that, from the session cookie set by register and login.
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{
        header::{AUTHORIZATION, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use authgate_common::{
    AuthResponse, LoginRequest, LogoutResponse, PasswordStrengthRequest,
    PasswordStrengthResponse, RegisterRequest, WhoAmIResponse,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::AppState;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "authgate_session";

const CLEARED_COOKIE: &str = "authgate_session=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0";

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let response = state.auth.register(request).await?;
    let cookie = session_cookie(&state, &response.session_token)?;
    Ok((StatusCode::CREATED, [(SET_COOKIE, cookie)], Json(response)))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;

    if !state.auth_rate_limiter.check_rate_limit(&request.username) {
        return Err(AppError::AuthRateLimited);
    }

    let username = request.username.clone();
    let response: AuthResponse = match state.auth.login(request).await {
        Ok(response) => response,
        Err(err) => {
            // unknown usernames are not tracked; only a real account can be locked
            if matches!(err, AppError::BadPassword) {
                state.auth_rate_limiter.record_failed_attempt(&username);
            }
            return Err(err);
        },
    };
    state.auth_rate_limiter.record_success(&username);

    let cookie = session_cookie(&state, &response.session_token)?;
    Ok(([(SET_COOKIE, cookie)], Json(response)))
}

/// `GET /api/auth/me`
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<WhoAmIResponse>, AppError> {
    let token = session_token(&headers).ok_or(AppError::Unauthenticated)?;
    let user = state.auth.who_am_i(&token).await?;
    Ok(Json(WhoAmIResponse { user }))
}

/// `POST /api/auth/logout`. Succeeds with or without a live session.
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = session_token(&headers) {
        state.auth.logout(&token).await;
    }
    (
        [(SET_COOKIE, HeaderValue::from_static(CLEARED_COOKIE))],
        Json(LogoutResponse::default()),
    )
}

/// `POST /api/auth/password-strength`
pub async fn password_strength(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PasswordStrengthRequest>, JsonRejection>,
) -> Result<Json<PasswordStrengthResponse>, AppError> {
    let Json(request) = payload?;
    Ok(Json(state.auth.password_strength(&request.password)))
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

/// Extract the session token from the request headers
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn session_cookie(state: &AppState, token: &str) -> Result<HeaderValue, AppError> {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        state.settings.session.ttl_secs
    );
    if state.settings.server.secure_cookies {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::Internal(format!("invalid cookie header: {e}")))
}
