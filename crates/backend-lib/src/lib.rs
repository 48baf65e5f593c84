// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core of the `authgate` authentication service: credential store, session
//! manager, the account facade over both, and the HTTP adapter.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod router;
pub mod validation;

use crate::auth::{
    AuthRateLimiter, AuthService, Clock, CredentialStore, DefaultAuth, PasswordHasher,
    SessionManager, SystemClock,
};
use crate::config::Settings;
use crate::error::AppError;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Account operations
    pub auth: Arc<dyn AuthService>,
    /// Session manager, shared with `auth`
    pub sessions: SessionManager,
    /// Settings the state was built from
    pub settings: Arc<Settings>,
    /// Login lockout
    pub auth_rate_limiter: Arc<AuthRateLimiter>,
}

impl AppState {
    /// Create a new application state on the system clock
    pub fn new(settings: &Settings) -> Result<Self, AppError> {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Create a new application state with an explicit time source
    pub fn with_clock(settings: &Settings, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let hasher = PasswordHasher::new(settings.hashing.scrypt_log_n)?;
        let users = Arc::new(CredentialStore::new(hasher, Arc::clone(&clock)));
        let sessions = SessionManager::new(settings.session_ttl(), clock);
        let auth = Arc::new(
            DefaultAuth::new(
                users,
                sessions.clone(),
                settings.password_requirements.clone(),
            )
            .with_max_concurrent_hashes(settings.hashing.max_concurrent),
        );
        let auth_rate_limiter = Arc::new(AuthRateLimiter::new(
            settings.rate_limit.max_attempts,
            settings.lockout_duration(),
        ));

        Ok(Self {
            auth,
            sessions,
            settings: Arc::new(settings.clone()),
            auth_rate_limiter,
        })
    }

    /// Start the session sweeper and the rate limiter cleanup.
    /// Both run on the configured sweep interval until aborted.
    pub fn spawn_maintenance(&self) -> Vec<JoinHandle<()>> {
        let every = self.settings.sweep_interval();
        let sweeper = self.sessions.spawn_sweeper(every);

        let auth_rate_limiter = Arc::clone(&self.auth_rate_limiter);
        let limiter_cleanup = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                auth_rate_limiter.cleanup();
                tracing::debug!(
                    tracked = auth_rate_limiter.tracked(),
                    "auth rate limiter cleanup finished"
                );
            }
        });

        vec![sweeper, limiter_cleanup]
    }
}
