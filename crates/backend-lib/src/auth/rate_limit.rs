// ============================
// crates/backend-lib/src/auth/rate_limit.rs
// ============================
//! Rate limiting for login attempts.
//!
//! Counters are keyed by username. Only wrong-password failures against an
//! existing account are recorded.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default number of failed attempts before rate limiting
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default lockout duration (5 minutes)
pub const DEFAULT_LOCKOUT_DURATION: Duration = Duration::from_secs(5 * 60);

/// Default ceiling on tracked accounts
pub const DEFAULT_MAX_TRACKED: usize = 100_000;

/// Entry in the rate limit map
#[derive(Debug, Clone)]
struct RateLimitEntry {
    /// Number of failed attempts
    failed_attempts: u32,
    /// Time of the last failed attempt
    last_failure: Instant,
    /// When the lockout expires, if locked out
    lockout_expiry: Option<Instant>,
}

/// Failed-login counter keyed by username
#[derive(Debug, Clone)]
pub struct AuthRateLimiter {
    attempts: Arc<DashMap<String, RateLimitEntry>>,
    max_attempts: u32,
    lockout_duration: Duration,
    max_tracked: usize,
}

impl Default for AuthRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_LOCKOUT_DURATION)
    }
}

impl AuthRateLimiter {
    /// Create a new auth rate limiter
    pub fn new(max_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_attempts,
            lockout_duration,
            max_tracked: DEFAULT_MAX_TRACKED,
        }
    }

    /// Cap the number of tracked accounts
    pub fn with_max_tracked(mut self, max_tracked: usize) -> Self {
        self.max_tracked = max_tracked;
        self
    }

    /// Record a wrong password for an existing account
    pub fn record_failed_attempt(&self, username: &str) {
        let now = Instant::now();

        if !self.attempts.contains_key(username) && self.attempts.len() >= self.max_tracked {
            self.cleanup();
            if self.attempts.len() >= self.max_tracked {
                tracing::warn!(
                    tracked = self.attempts.len(),
                    "auth rate limiter full; failure not tracked"
                );
                return;
            }
        }

        let mut entry = self
            .attempts
            .entry(username.to_string())
            .or_insert_with(|| RateLimitEntry {
                failed_attempts: 0,
                last_failure: now,
                lockout_expiry: None,
            });

        // a lapsed lockout starts a fresh count
        if entry.lockout_expiry.is_some_and(|expiry| now >= expiry) {
            entry.failed_attempts = 0;
            entry.lockout_expiry = None;
        }

        entry.failed_attempts += 1;
        entry.last_failure = now;

        if entry.failed_attempts >= self.max_attempts && entry.lockout_expiry.is_none() {
            entry.lockout_expiry = Some(now + self.lockout_duration);
            tracing::warn!(
                username,
                attempts = entry.failed_attempts,
                lockout_secs = self.lockout_duration.as_secs(),
                "login locked out after repeated failures"
            );
        }
    }

    /// Record a successful authentication
    pub fn record_success(&self, username: &str) {
        self.attempts.remove(username);
    }

    /// Check if an account may attempt authentication
    pub fn check_rate_limit(&self, username: &str) -> bool {
        match self.attempts.get(username) {
            Some(entry) => !entry
                .lockout_expiry
                .is_some_and(|expiry| Instant::now() < expiry),
            None => true,
        }
    }

    /// Drop lapsed lockouts and counters idle for a full lockout window
    pub fn cleanup(&self) {
        let now = Instant::now();
        let window = self.lockout_duration;

        self.attempts.retain(|_, entry| match entry.lockout_expiry {
            Some(expiry) => now < expiry,
            None => now.duration_since(entry.last_failure) < window,
        });
    }

    /// Number of tracked keys
    pub fn tracked(&self) -> usize {
        self.attempts.len()
    }
}
