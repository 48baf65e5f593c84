// ================
// common/src/lib.rs
// ================
//! Request and response shapes exchanged between `authgate` clients and the server.
//!
//! Field names are camelCase on the wire (`sessionToken`, `createdAt`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque user identifier
pub type UserId = Uuid;

/// Body of `POST /api/auth/register`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// Optional repeat of `password`; when present it must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_password: Option<String>,
}

/// Body of `POST /api/auth/login`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public projection of a user record. Never carries the password hash.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Returned by register and login
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserView,
    /// Bearer token; possession implies authentication.
    pub session_token: String,
}

/// Returned by `GET /api/auth/me`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WhoAmIResponse {
    pub user: UserView,
}

/// Returned by logout, always `{}`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LogoutResponse {}

/// Body of `POST /api/auth/password-strength`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PasswordStrengthRequest {
    pub password: String,
}

/// Strength indicator computed with the same policy used at registration
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PasswordStrengthResponse {
    /// Number of satisfied checks, `0..=max_score`
    pub score: u8,
    pub max_score: u8,
    /// Empty for an empty password
    pub label: String,
    /// Whether registration would accept this password
    pub meets_policy: bool,
}

/// Error envelope: `{"error": {"code": ..., "message": ...}}`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}
