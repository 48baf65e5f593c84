// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request validation, applied before the credential store is touched.

use crate::auth::{validate_password_strength, PasswordRequirements};
use crate::error::AppError;
use authgate_common::{LoginRequest, RegisterRequest};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 64;
pub const MAX_PASSWORD_LENGTH: usize = 128;

// no whitespace or control characters anywhere in a username
static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s\p{Cc}]+$").expect("username pattern compiles"));

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Validate a username. Usernames are compared exactly, so nothing is trimmed.
pub fn validate_username(username: &str) -> ValidationResult<&str> {
    if username.is_empty() {
        return Err(ValidationError::InvalidUsername(
            "Username cannot be empty".to_string(),
        ));
    }

    let length = username.chars().count();
    if length < MIN_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername(format!(
            "Username must be at least {MIN_USERNAME_LENGTH} characters"
        )));
    }
    if length > MAX_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername(format!(
            "Username cannot exceed {MAX_USERNAME_LENGTH} characters"
        )));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::InvalidUsername(
            "Username cannot contain whitespace or control characters".to_string(),
        ));
    }

    Ok(username)
}

/// Validate a password presented at login: present and bounded, no policy
pub fn validate_login_password(password: &str) -> ValidationResult<&str> {
    if password.is_empty() {
        return Err(ValidationError::InvalidPassword(
            "Password cannot be empty".to_string(),
        ));
    }
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password cannot exceed {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(password)
}

/// Validate a new password against the configured policy
pub fn validate_new_password<'a>(
    password: &'a str,
    requirements: &PasswordRequirements,
) -> ValidationResult<&'a str> {
    validate_login_password(password)?;

    if !validate_password_strength(password, requirements) {
        return Err(ValidationError::InvalidPassword(describe_policy(requirements)));
    }

    Ok(password)
}

/// Validate a registration request
pub fn validate_register(
    request: &RegisterRequest,
    requirements: &PasswordRequirements,
) -> ValidationResult<()> {
    validate_username(&request.username)?;
    validate_new_password(&request.password, requirements)?;

    if let Some(confirm) = &request.confirm_password {
        if confirm != &request.password {
            return Err(ValidationError::PasswordMismatch);
        }
    }

    Ok(())
}

/// Validate a login request
pub fn validate_login(request: &LoginRequest) -> ValidationResult<()> {
    validate_username(&request.username)?;
    validate_login_password(&request.password)?;
    Ok(())
}

fn describe_policy(requirements: &PasswordRequirements) -> String {
    let mut rules = vec![format!("at least {} characters", requirements.min_length)];
    if requirements.require_uppercase {
        rules.push("an uppercase letter".to_string());
    }
    if requirements.require_lowercase {
        rules.push("a lowercase letter".to_string());
    }
    if requirements.require_digit {
        rules.push("a digit".to_string());
    }
    if requirements.require_special {
        rules.push("a special character".to_string());
    }
    format!("Password must contain {}", rules.join(", "))
}
