// ==============================
// crates/backend-lib/tests/auth_flow.rs
// ==============================
//! End-to-end account flows through the `AuthService` facade.
use authgate_common::{LoginRequest, RegisterRequest};
use backend_lib::auth::{
    AuthService, CredentialStore, DefaultAuth, ManualClock, PasswordHasher,
    PasswordRequirements, SessionManager, SESSION_TTL,
};
use backend_lib::error::AppError;
use chrono::TimeDelta;
use std::sync::Arc;
use uuid::Uuid;

struct Harness {
    auth: DefaultAuth,
    users: Arc<CredentialStore>,
    sessions: SessionManager,
    clock: ManualClock,
}

fn harness() -> Harness {
    let clock = ManualClock::default();
    let users = Arc::new(CredentialStore::new(
        PasswordHasher::new(4).unwrap(),
        Arc::new(clock.clone()),
    ));
    let sessions = SessionManager::new(SESSION_TTL, Arc::new(clock.clone()));
    let auth = DefaultAuth::new(
        Arc::clone(&users),
        sessions.clone(),
        PasswordRequirements::default(),
    );
    Harness {
        auth,
        users,
        sessions,
        clock,
    }
}

fn register(username: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        password: password.to_string(),
        confirm_password: None,
    }
}

fn login(username: &str, password: &str) -> LoginRequest {
    LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_alice_multi_session_flow() {
    let h = harness();

    let registered = h.auth.register(register("alice", "Secret123!")).await.unwrap();
    let token_a = registered.session_token.clone();
    assert_eq!(registered.user.username, "alice");

    let err = h.auth.login(login("alice", "wrong")).await.unwrap_err();
    assert!(matches!(err, AppError::BadPassword));
    assert_eq!(h.sessions.len().await, 1, "failed login must not create a session");

    let logged_in = h.auth.login(login("alice", "Secret123!")).await.unwrap();
    let token_b = logged_in.session_token.clone();
    assert_ne!(token_a, token_b);
    assert_eq!(logged_in.user.id, registered.user.id);

    let me_a = h.auth.who_am_i(&token_a).await.unwrap();
    let me_b = h.auth.who_am_i(&token_b).await.unwrap();
    assert_eq!(me_a.id, registered.user.id);
    assert_eq!(me_b.id, registered.user.id);

    h.auth.logout(&token_a).await;
    assert!(matches!(
        h.auth.who_am_i(&token_a).await,
        Err(AppError::Unauthenticated)
    ));
    assert_eq!(h.auth.who_am_i(&token_b).await.unwrap().id, registered.user.id);
}

#[tokio::test]
async fn test_duplicate_registration_leaves_one_record() {
    let h = harness();

    h.auth.register(register("bob", "Password1")).await.unwrap();
    let err = h
        .auth
        .register(register("bob", "Different1"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DuplicateUsername));
    assert_eq!(h.users.len(), 1);
    assert_eq!(h.sessions.len().await, 1);
}

#[tokio::test]
async fn test_concurrent_registration_single_winner() {
    let h = Arc::new(harness());

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let h = Arc::clone(&h);
            tokio::spawn(async move {
                h.auth
                    .register(register("carol", &format!("Password-{i}")))
                    .await
            })
        })
        .collect();

    let mut winners = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => winners += 1,
            Err(AppError::DuplicateUsername) => {},
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(h.users.len(), 1);
    assert_eq!(h.sessions.len().await, 1);
}

#[tokio::test]
async fn test_unknown_user_login() {
    let h = harness();
    let err = h.auth.login(login("nobody", "Secret123!")).await.unwrap_err();
    assert!(matches!(err, AppError::UserNotFound));
    assert!(err.is_credential_failure());
    assert!(h.sessions.is_empty().await);
}

#[tokio::test]
async fn test_invalid_input_is_rejected_before_store() {
    let h = harness();

    let short_name = h.auth.register(register("al", "Secret123!")).await;
    assert!(matches!(short_name, Err(AppError::InvalidInput(_))));

    let empty_password = h.auth.login(login("alice", "")).await;
    assert!(matches!(empty_password, Err(AppError::InvalidInput(_))));

    let mismatch = h
        .auth
        .register(RegisterRequest {
            username: "alice".to_string(),
            password: "Secret123!".to_string(),
            confirm_password: Some("Secret123?".to_string()),
        })
        .await;
    assert!(matches!(mismatch, Err(AppError::InvalidInput(_))));

    assert!(h.users.is_empty());
    assert!(h.sessions.is_empty().await);
}

#[tokio::test]
async fn test_session_expires_after_ttl() {
    let h = harness();
    let response = h.auth.register(register("dave", "Secret123!")).await.unwrap();
    let ttl = TimeDelta::from_std(SESSION_TTL).unwrap();

    h.clock.advance(ttl - TimeDelta::milliseconds(1));
    assert!(h.auth.who_am_i(&response.session_token).await.is_ok());

    h.clock.advance(TimeDelta::milliseconds(1));
    assert!(matches!(
        h.auth.who_am_i(&response.session_token).await,
        Err(AppError::Unauthenticated)
    ));
    assert!(h.sessions.is_empty().await);

    // the account outlives the session
    assert!(h.auth.login(login("dave", "Secret123!")).await.is_ok());
}

#[tokio::test]
async fn test_session_for_missing_user_is_destroyed() {
    let h = harness();
    let orphan = h.sessions.create_session(Uuid::new_v4()).await.unwrap();

    assert!(matches!(
        h.auth.who_am_i(&orphan.id).await,
        Err(AppError::Unauthenticated)
    ));
    assert!(h.sessions.get_session(&orphan.id).await.is_none());
    assert!(h.sessions.is_empty().await);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let h = harness();
    let response = h.auth.register(register("erin", "Secret123!")).await.unwrap();

    h.auth.logout(&response.session_token).await;
    h.auth.logout(&response.session_token).await;
    h.auth.logout("not-a-token").await;

    assert!(h.auth.who_am_i(&response.session_token).await.is_err());
}
