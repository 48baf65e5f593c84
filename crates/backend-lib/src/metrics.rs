// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const USER_REGISTERED: &str = "auth.user.registered";
pub const LOGIN_SUCCEEDED: &str = "auth.login.succeeded";
pub const LOGIN_FAILED: &str = "auth.login.failed";
pub const SESSION_CREATED: &str = "session.created";
pub const SESSION_DELETED: &str = "session.deleted";
pub const SESSION_EXPIRED: &str = "session.expired";
pub const SESSION_ACTIVE: &str = "session.active";
