// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing, verification and strength policy.
use rand::{rngs::OsRng, TryRngCore};
use scrypt::{
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Params, Scrypt,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Number of checks scored by [`password_strength`]
pub const MAX_STRENGTH_SCORE: u8 = 5;

const SALT_BYTES: usize = 16;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

const STRENGTH_LABELS: [&str; 6] = ["", "Very weak", "Weak", "Fair", "Good", "Strong"];

/// Salted scrypt hasher with a configurable work factor.
///
/// The cost is encoded in every PHC string it produces, so hashes made under an
/// older cost still verify after the cost is raised.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    params: Params,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::recommended(),
        }
    }
}

impl PasswordHasher {
    /// Create a hasher with cost `2^log_n`
    pub fn new(log_n: u8) -> Result<Self, AppError> {
        let params = Params::new(log_n, SCRYPT_R, SCRYPT_P, Params::RECOMMENDED_LEN)
            .map_err(|e| AppError::Internal(format!("invalid scrypt parameters: {e}")))?;
        Ok(Self { params })
    }

    /// Hash a password into a PHC string with a fresh random salt
    pub fn hash(&self, plain: &str) -> Result<String, AppError> {
        let mut salt_bytes = [0u8; SALT_BYTES];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|e| AppError::Internal(format!("entropy source unavailable: {e}")))?;
        let salt = SaltString::encode_b64(&salt_bytes)?;

        let hash = Scrypt
            .hash_password_customized(plain.as_bytes(), None, None, self.params, &salt)?
            .to_string();
        Ok(hash)
    }

    /// Verify a password against a stored hash. A malformed hash is a mismatch.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
    }
}

/// Password complexity requirements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordRequirements {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            require_uppercase: false,
            require_lowercase: false,
            require_digit: false,
            require_special: false,
        }
    }
}

/// Check if a password meets the complexity requirements
pub fn validate_password_strength(password: &str, requirements: &PasswordRequirements) -> bool {
    if password.chars().count() < requirements.min_length {
        return false;
    }

    if requirements.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
        return false;
    }

    if requirements.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
        return false;
    }

    if requirements.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    if requirements.require_special && !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        return false;
    }

    true
}

/// Score a password from 0 to [`MAX_STRENGTH_SCORE`]: one point each for
/// reaching `min_length`, an ASCII lowercase letter, an ASCII uppercase
/// letter, a digit and any character outside `[A-Za-z0-9]`.
pub fn password_strength(password: &str, requirements: &PasswordRequirements) -> u8 {
    let checks = [
        password.chars().count() >= requirements.min_length,
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    checks.iter().filter(|passed| **passed).count() as u8
}

/// Human label for a strength score; empty for 0
pub fn strength_label(score: u8) -> &'static str {
    STRENGTH_LABELS
        .get(usize::from(score))
        .copied()
        .unwrap_or("Strong")
}
