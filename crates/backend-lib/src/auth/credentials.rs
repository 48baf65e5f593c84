// ============================
// crates/backend-lib/src/auth/credentials.rs
// ============================
//! In-memory credential store: user records, username index and password hashing.
use authgate_common::{UserId, UserView};
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use metrics::counter;
use std::{fmt, sync::Arc};
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use super::password::PasswordHasher;
use crate::error::AppError;
use crate::metrics::USER_REGISTERED;

/// A registered account. Immutable once created.
#[derive(Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            id: user.id,
            username: user.username.clone(),
            created_at: user.created_at,
        }
    }
}

/// Owns every [`User`].
///
/// Records live in `users`; `by_username` maps an exact username to its id and
/// is the uniqueness guard. A user record is inserted before its index entry,
/// so a lookup through the index never finds a dangling id.
#[derive(Debug)]
pub struct CredentialStore {
    users: DashMap<UserId, User>,
    by_username: DashMap<String, UserId>,
    hasher: PasswordHasher,
    clock: Arc<dyn Clock>,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(PasswordHasher::default(), Arc::new(SystemClock))
    }
}

impl CredentialStore {
    pub fn new(hasher: PasswordHasher, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: DashMap::new(),
            by_username: DashMap::new(),
            hasher,
            clock,
        }
    }

    /// Create a user, failing with `DuplicateUsername` if the name is taken.
    ///
    /// The password is hashed before the username slot is claimed, so no map
    /// lock is held during the hash. Claiming the slot goes through the index
    /// entry, which makes check-and-insert atomic per username.
    pub fn create_user(&self, username: &str, plain_password: &str) -> Result<User, AppError> {
        if self.by_username.contains_key(username) {
            return Err(AppError::DuplicateUsername);
        }

        let password_hash = self.hasher.hash(plain_password)?;

        match self.by_username.entry(username.to_string()) {
            Entry::Occupied(_) => Err(AppError::DuplicateUsername),
            Entry::Vacant(slot) => {
                let user = User {
                    id: Uuid::new_v4(),
                    username: username.to_string(),
                    password_hash,
                    created_at: self.clock.now(),
                };
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);

                counter!(USER_REGISTERED).increment(1);
                tracing::info!(user_id = %user.id, username = %user.username, "user created");
                Ok(user)
            },
        }
    }

    /// Look up a user by id
    pub fn get_user(&self, id: &UserId) -> Option<User> {
        self.users.get(id).map(|user| user.clone())
    }

    /// Look up a user by exact, case-sensitive username. O(1) through the index.
    pub fn get_user_by_username(&self, username: &str) -> Option<User> {
        let id = *self.by_username.get(username)?;
        self.get_user(&id)
    }

    /// Verify a plaintext password against a stored hash. Never fails; a
    /// malformed hash is a mismatch.
    pub fn verify_password(&self, plain_password: &str, stored_hash: &str) -> bool {
        self.hasher.verify(plain_password, stored_hash)
    }

    /// Hash a password with this store's work factor
    pub fn hash_password(&self, plain_password: &str) -> Result<String, AppError> {
        self.hasher.hash(plain_password)
    }

    /// Number of registered users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;
    use chrono::TimeZone;

    fn store() -> CredentialStore {
        CredentialStore::new(
            PasswordHasher::new(4).unwrap(),
            Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())),
        )
    }

    #[test]
    fn test_create_and_lookup() {
        let store = store();
        let user = store.create_user("alice", "Secret123!").unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(
            user.created_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
        assert_ne!(user.password_hash, "Secret123!");

        let by_id = store.get_user(&user.id).unwrap();
        assert_eq!(by_id.username, "alice");

        let by_name = store.get_user_by_username("alice").unwrap();
        assert_eq!(by_name.id, user.id);

        assert!(store.verify_password("Secret123!", &by_name.password_hash));
        assert!(!store.verify_password("wrong", &by_name.password_hash));
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let store = store();
        store.create_user("bob", "Password1").unwrap();

        let err = store.create_user("bob", "Other-password").unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_usernames_are_case_sensitive() {
        let store = store();
        let lower = store.create_user("carol", "Password1").unwrap();
        let upper = store.create_user("Carol", "Password1").unwrap();

        assert_ne!(lower.id, upper.id);
        assert!(store.get_user_by_username("CAROL").is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_missing_lookups_return_none() {
        let store = store();
        assert!(store.is_empty());
        assert!(store.get_user(&Uuid::new_v4()).is_none());
        assert!(store.get_user_by_username("nobody").is_none());
    }

    #[test]
    fn test_concurrent_create_same_username_single_winner() {
        let store = store();

        let outcomes: Vec<Result<User, AppError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let store = &store;
                    scope.spawn(move || store.create_user("dave", &format!("Password-{i}")))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(outcomes
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, AppError::DuplicateUsername)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_hash_password_round_trip() {
        let store = store();
        let hash = store.hash_password("Rotated-456").unwrap();

        assert!(hash.starts_with("$scrypt$"));
        assert!(store.verify_password("Rotated-456", &hash));
        assert!(!store.verify_password("Rotated-457", &hash));
        assert_ne!(hash, store.hash_password("Rotated-456").unwrap());
        // hashing alone registers nobody
        assert!(store.is_empty());
    }

    #[test]
    fn test_debug_redacts_hash() {
        let store = store();
        let user = store.create_user("erin", "Password1").unwrap();
        let printed = format!("{user:?}");
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains(&user.password_hash));
    }

    #[test]
    fn test_user_view_omits_hash() {
        let store = store();
        let user = store.create_user("frank", "Password1").unwrap();
        let view = UserView::from(&user);
        assert_eq!(view.id, user.id);
        assert_eq!(view.username, "frank");
        assert_eq!(view.created_at, user.created_at);
    }
}
