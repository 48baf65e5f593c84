// ============================
// crates/backend-lib/src/auth/token_generator.rs
// ============================
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
/** Secure token generation for session bearer tokens.
Tokens come straight from the operating system's entropy source; a counter
or seeded PRNG would make them guessable. */
use rand::{rngs::OsRng, TryRngCore};

use crate::error::AppError;

/// Default token size in bytes (32 bytes = 256 bits of entropy)
const DEFAULT_TOKEN_BYTES: usize = 32;

/** Generate a cryptographically secure random token
# Returns
A base64 URL-safe encoded string without padding */
pub fn generate_secure_token() -> Result<String, AppError> {
    generate_secure_token_with_size(DEFAULT_TOKEN_BYTES)
}

/** Generate a cryptographically secure random token with specified size
# Arguments
* `bytes` - The size of the random token in bytes
# Errors
`AppError::Internal` if the OS entropy source is unavailable */
pub fn generate_secure_token_with_size(bytes: usize) -> Result<String, AppError> {
    let mut buffer = vec![0u8; bytes];
    OsRng
        .try_fill_bytes(&mut buffer)
        .map_err(|e| AppError::Internal(format!("entropy source unavailable: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(buffer))
}
