// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod clock;
pub mod credentials;
pub mod password;
pub mod rate_limit;
pub mod session;
pub mod token_generator;
mod service;
mod service_impl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::{CredentialStore, User};
pub use password::{
    password_strength, strength_label, validate_password_strength, PasswordHasher,
    PasswordRequirements, MAX_STRENGTH_SCORE, MIN_PASSWORD_LENGTH,
};
pub use rate_limit::AuthRateLimiter;
pub use service::AuthService;
pub use service_impl::{DefaultAuth, DEFAULT_MAX_CONCURRENT_HASHES};
pub use session::{Session, SessionManager, SESSION_TTL, SWEEP_INTERVAL};
