use async_trait::async_trait;
use authgate_common::{
    AuthResponse, LoginRequest, PasswordStrengthResponse, RegisterRequest, UserView,
};

use crate::error::AppError;

/// The four account operations, plus the strength indicator that shares the
/// registration password policy.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create a user and an initial session. Fails with `InvalidInput` or `DuplicateUsername`.
    async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError>;

    /// Verify credentials and issue a new session. Fails with `InvalidInput`,
    /// `UserNotFound` or `BadPassword`.
    async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError>;

    /// Resolve a bearer token to its user. Fails with `Unauthenticated`.
    async fn who_am_i(&self, session_token: &str) -> Result<UserView, AppError>;

    /// Destroy a session. Always succeeds.
    async fn logout(&self, session_token: &str);

    fn password_strength(&self, password: &str) -> PasswordStrengthResponse;
}
