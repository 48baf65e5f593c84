use async_trait::async_trait;
use authgate_common::{
    AuthResponse, LoginRequest, PasswordStrengthResponse, RegisterRequest, UserView,
};
use metrics::counter;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use zeroize::Zeroizing;

use super::password::{password_strength, strength_label, MAX_STRENGTH_SCORE};
use super::{AuthService, CredentialStore, PasswordRequirements, SessionManager, User};
use crate::error::AppError;
use crate::metrics::{LOGIN_FAILED, LOGIN_SUCCEEDED};
use crate::validation;

/// Default number of scrypt operations allowed to run at once
pub const DEFAULT_MAX_CONCURRENT_HASHES: usize = 4;

/// Composes the credential store and the session manager.
///
/// Holds no records of its own; every record lives in one of the two stores.
/// Each hash or verify holds a permit from `hash_permits` while it runs, so
/// scrypt memory is bounded by the permit count.
pub struct DefaultAuth {
    users: Arc<CredentialStore>,
    sessions: SessionManager,
    requirements: PasswordRequirements,
    hash_permits: Arc<Semaphore>,
}

impl DefaultAuth {
    pub fn new(
        users: Arc<CredentialStore>,
        sessions: SessionManager,
        requirements: PasswordRequirements,
    ) -> Self {
        Self {
            users,
            sessions,
            requirements,
            hash_permits: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT_HASHES)),
        }
    }

    /// Limit concurrent scrypt operations to `max` (at least one)
    pub fn with_max_concurrent_hashes(mut self, max: usize) -> Self {
        self.hash_permits = Arc::new(Semaphore::new(max.max(1)));
        self
    }

    async fn hash_permit(&self) -> Result<OwnedSemaphorePermit, AppError> {
        Arc::clone(&self.hash_permits)
            .acquire_owned()
            .await
            .map_err(|e| AppError::Internal(format!("hash limiter closed: {e}")))
    }

    async fn issue(&self, user: &User) -> Result<AuthResponse, AppError> {
        let session = self.sessions.create_session(user.id).await?;
        Ok(AuthResponse {
            user: UserView::from(user),
            session_token: session.id,
        })
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        validation::validate_register(&request, &self.requirements)?;

        let RegisterRequest {
            username, password, ..
        } = request;
        let password = Zeroizing::new(password);

        if self.users.get_user_by_username(&username).is_some() {
            tracing::info!(%username, "registration rejected: username taken");
            return Err(AppError::DuplicateUsername);
        }

        // scrypt is CPU-bound; keep it off the async workers
        let permit = self.hash_permit().await?;
        let users = Arc::clone(&self.users);
        let user = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            users.create_user(&username, &password)
        })
        .await??;

        self.issue(&user).await
    }

    async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        validation::validate_login(&request)?;

        let LoginRequest { username, password } = request;
        let password = Zeroizing::new(password);

        let Some(user) = self.users.get_user_by_username(&username) else {
            counter!(LOGIN_FAILED).increment(1);
            tracing::info!(%username, "login failed: unknown user");
            return Err(AppError::UserNotFound);
        };

        let permit = self.hash_permit().await?;
        let users = Arc::clone(&self.users);
        let stored_hash = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            users.verify_password(&password, &stored_hash)
        })
        .await?;

        if !verified {
            counter!(LOGIN_FAILED).increment(1);
            tracing::info!(user_id = %user.id, "login failed: bad password");
            return Err(AppError::BadPassword);
        }

        counter!(LOGIN_SUCCEEDED).increment(1);
        tracing::info!(user_id = %user.id, "login succeeded");
        self.issue(&user).await
    }

    async fn who_am_i(&self, session_token: &str) -> Result<UserView, AppError> {
        let session = self
            .sessions
            .get_session(session_token)
            .await
            .ok_or(AppError::Unauthenticated)?;

        match self.users.get_user(&session.user_id) {
            Some(user) => Ok(UserView::from(&user)),
            None => {
                tracing::warn!(
                    user_id = %session.user_id,
                    "session references a missing user; destroying it"
                );
                self.sessions.delete_session(session_token).await;
                Err(AppError::Unauthenticated)
            },
        }
    }

    async fn logout(&self, session_token: &str) {
        self.sessions.delete_session(session_token).await;
    }

    fn password_strength(&self, password: &str) -> PasswordStrengthResponse {
        let score = password_strength(password, &self.requirements);
        PasswordStrengthResponse {
            score,
            max_score: MAX_STRENGTH_SCORE,
            label: if password.is_empty() {
                String::new()
            } else {
                strength_label(score).to_string()
            },
            meets_policy: validation::validate_new_password(password, &self.requirements).is_ok(),
        }
    }
}
