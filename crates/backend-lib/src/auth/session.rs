// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Session token handling and management.
use authgate_common::UserId;
use chrono::{DateTime, TimeDelta, Utc};
use metrics::{counter, gauge};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{sync::RwLock, task::JoinHandle, time::MissedTickBehavior};

use super::clock::{Clock, SystemClock};
use super::token_generator::generate_secure_token;
use crate::error::AppError;
use crate::metrics::{SESSION_ACTIVE, SESSION_CREATED, SESSION_DELETED, SESSION_EXPIRED};

/// Session TTL (time to live)
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24); // 24 hours

/// Default interval between expiry sweeps
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60); // 1 hour

/// Session information. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token
    pub id: String,
    /// Non-owning reference to the user
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A session is valid strictly before `expires_at`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Session manager for handling authentication tokens.
///
/// Expired sessions are reclaimed two ways: lazily when looked up, and in bulk
/// by [`SessionManager::sweep_expired`]. Both take the write lock, so a sweep
/// holds off lookups for the duration of one scan of the map.
#[derive(Debug, Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SESSION_TTL, Arc::new(SystemClock))
    }
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let ttl = TimeDelta::from_std(ttl).unwrap_or_else(|_| TimeDelta::MAX);
        SessionManager {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            clock,
        }
    }

    /// Issue a session for `user_id`. The caller has already verified the user exists.
    pub async fn create_session(&self, user_id: UserId) -> Result<Session, AppError> {
        let id = generate_secure_token()?;
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let session = Session {
            id: id.clone(),
            user_id,
            created_at: now,
            expires_at,
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(id, session.clone());

        counter!(SESSION_CREATED).increment(1);
        gauge!(SESSION_ACTIVE).set(sessions.len() as f64);

        Ok(session)
    }

    /// Get a live session by token. An expired session found here is deleted.
    pub async fn get_session(&self, id: &str) -> Option<Session> {
        let now = self.clock.now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                None => return None,
                Some(session) if session.is_valid_at(now) => return Some(session.clone()),
                Some(_) => {},
            }
        }

        let mut sessions = self.sessions.write().await;
        if sessions.get(id).is_some_and(|s| !s.is_valid_at(now)) {
            sessions.remove(id);
            counter!(SESSION_EXPIRED).increment(1);
            gauge!(SESSION_ACTIVE).set(sessions.len() as f64);
            tracing::debug!("expired session removed on lookup");
        }
        None
    }

    /// Delete a session. Deleting an unknown token is not an error.
    pub async fn delete_session(&self, id: &str) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(id).is_some() {
            counter!(SESSION_DELETED).increment(1);
            gauge!(SESSION_ACTIVE).set(sessions.len() as f64);
        }
    }

    /// Remove every expired session, returning how many were removed
    pub async fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        let before_count = sessions.len();

        sessions.retain(|_, session| session.is_valid_at(now));

        let after_count = sessions.len();
        let removed = before_count - after_count;

        if removed > 0 {
            counter!(SESSION_EXPIRED).increment(removed as u64);
        }
        gauge!(SESSION_ACTIVE).set(after_count as f64);

        removed
    }

    /// Run [`Self::sweep_expired`] every `every`, starting one interval from now
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let removed = manager.sweep_expired().await;
                tracing::debug!(removed, "session sweep finished");
            }
        })
    }

    /// Number of stored sessions, including expired ones not yet reclaimed
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;
    use uuid::Uuid;

    fn manager() -> (SessionManager, ManualClock) {
        let clock = ManualClock::default();
        let manager = SessionManager::new(SESSION_TTL, Arc::new(clock.clone()));
        (manager, clock)
    }

    fn ttl() -> TimeDelta {
        TimeDelta::from_std(SESSION_TTL).unwrap()
    }

    #[tokio::test]
    async fn test_session_management() {
        let (manager, clock) = manager();
        let user_id = Uuid::new_v4();

        let session = manager.create_session(user_id).await.unwrap();
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.created_at, clock.now());
        assert_eq!(session.expires_at - session.created_at, ttl());

        let fetched = manager.get_session(&session.id).await.unwrap();
        assert_eq!(fetched, session);

        assert!(manager.get_session("invalid_token").await.is_none());
    }

    #[tokio::test]
    async fn test_session_valid_until_ttl_boundary() {
        let (manager, clock) = manager();
        let session = manager.create_session(Uuid::new_v4()).await.unwrap();

        clock.advance(ttl() - TimeDelta::seconds(1));
        assert!(manager.get_session(&session.id).await.is_some());

        clock.advance(TimeDelta::seconds(1));
        assert!(manager.get_session(&session.id).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_deleted_not_hidden() {
        let (manager, clock) = manager();
        let session = manager.create_session(Uuid::new_v4()).await.unwrap();
        assert_eq!(manager.len().await, 1);

        clock.advance(ttl() + TimeDelta::minutes(5));
        assert!(manager.get_session(&session.id).await.is_none());
        assert_eq!(manager.len().await, 0);

        // turning the clock back cannot resurrect it
        clock.advance(-ttl());
        assert!(manager.get_session(&session.id).await.is_none());
    }

    #[tokio::test]
    async fn test_oversized_ttl_saturates() {
        let clock = ManualClock::default();
        let manager = SessionManager::new(Duration::MAX, Arc::new(clock.clone()));
        assert_eq!(manager.ttl, TimeDelta::MAX);

        let session = manager.create_session(Uuid::new_v4()).await.unwrap();
        assert_eq!(session.expires_at, DateTime::<Utc>::MAX_UTC);

        clock.advance(TimeDelta::days(365 * 100));
        assert!(manager.get_session(&session.id).await.is_some());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (manager, _clock) = manager();
        let session = manager.create_session(Uuid::new_v4()).await.unwrap();

        manager.delete_session(&session.id).await;
        assert!(manager.get_session(&session.id).await.is_none());

        manager.delete_session(&session.id).await;
        manager.delete_session("never-existed").await;
        assert!(manager.is_empty().await);
    }

    #[tokio::test]
    async fn test_multiple_sessions_per_user() {
        let (manager, _clock) = manager();
        let user_id = Uuid::new_v4();

        let a = manager.create_session(user_id).await.unwrap();
        let b = manager.create_session(user_id).await.unwrap();
        assert_ne!(a.id, b.id);

        manager.delete_session(&a.id).await;
        assert!(manager.get_session(&a.id).await.is_none());
        assert_eq!(manager.get_session(&b.id).await.unwrap().user_id, user_id);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let (manager, clock) = manager();
        let old = manager.create_session(Uuid::new_v4()).await.unwrap();

        clock.advance(TimeDelta::hours(12));
        let fresh = manager.create_session(Uuid::new_v4()).await.unwrap();

        clock.advance(TimeDelta::hours(12));
        assert_eq!(manager.sweep_expired().await, 1);
        assert_eq!(manager.len().await, 1);
        assert!(manager.get_session(&old.id).await.is_none());
        assert!(manager.get_session(&fresh.id).await.is_some());

        assert_eq!(manager.sweep_expired().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_task_reclaims_abandoned_sessions() {
        let (manager, clock) = manager();
        for _ in 0..3 {
            manager.create_session(Uuid::new_v4()).await.unwrap();
        }

        let every = Duration::from_secs(60);
        let handle = manager.spawn_sweeper(every);

        clock.advance(ttl());
        tokio::time::sleep(every + Duration::from_millis(10)).await;
        tokio::task::yield_now().await;

        assert_eq!(manager.len().await, 0);
        handle.abort();
    }
}
