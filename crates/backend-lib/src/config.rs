// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Layers, lowest priority first: compiled defaults, a TOML file, then
//! `AUTHGATE_*` environment variables with `__` separating nested keys
//! (`AUTHGATE_SESSION__TTL_SECS=3600`).
use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::auth::{PasswordRequirements, DEFAULT_MAX_CONCURRENT_HASHES};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "AUTHGATE_";

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const MAX_SESSION_TTL_SECS: u64 = 365 * 24 * 60 * 60;
const MIN_PASSWORD_LENGTH_FLOOR: usize = 6;

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    pub session: SessionSettings,
    pub password_requirements: PasswordRequirements,
    pub hashing: HashingSettings,
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashingSettings {
    /// scrypt cost exponent; each step doubles hashing time and memory
    pub scrypt_log_n: u8,
    /// scrypt operations allowed to run at once
    pub max_concurrent: usize,
}

/// Login lockout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub max_attempts: u32,
    pub lockout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            log_level: "info".to_string(),
            session: SessionSettings::default(),
            password_requirements: PasswordRequirements::default(),
            hashing: HashingSettings::default(),
            rate_limit: RateLimitSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            secure_cookies: false,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 60 * 60 * 24, // 24 hours
            sweep_interval_secs: 60 * 60,
        }
    }
}

impl Default for HashingSettings {
    fn default() -> Self {
        // scrypt's recommended cost
        Self {
            scrypt_log_n: 17,
            max_concurrent: DEFAULT_MAX_CONCURRENT_HASHES,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_secs: 5 * 60,
        }
    }
}

impl Settings {
    /// Load from `config.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from the given TOML file (if present) and the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("failed to load settings from {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!("invalid log level: {}", self.log_level);
        }

        if self.session.ttl_secs == 0 || self.session.ttl_secs > MAX_SESSION_TTL_SECS {
            bail!(
                "session.ttl_secs must be between 1 and {MAX_SESSION_TTL_SECS}, got {}",
                self.session.ttl_secs
            );
        }
        if self.session.sweep_interval_secs == 0 {
            bail!("session.sweep_interval_secs must be positive");
        }

        if self.password_requirements.min_length < MIN_PASSWORD_LENGTH_FLOOR {
            bail!(
                "password_requirements.min_length must be at least {MIN_PASSWORD_LENGTH_FLOOR}"
            );
        }

        if !(1..=20).contains(&self.hashing.scrypt_log_n) {
            bail!(
                "hashing.scrypt_log_n must be between 1 and 20, got {}",
                self.hashing.scrypt_log_n
            );
        }

        if self.hashing.max_concurrent == 0 {
            bail!("hashing.max_concurrent must be positive");
        }

        if self.rate_limit.max_attempts == 0 || self.rate_limit.lockout_secs == 0 {
            bail!("rate_limit.max_attempts and rate_limit.lockout_secs must be positive");
        }

        Ok(())
    }

    /// Socket address to bind
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .with_context(|| {
                format!("invalid bind address {}:{}", self.server.host, self.server.port)
            })
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session.sweep_interval_secs)
    }

    pub fn lockout_duration(&self) -> Duration {
        Duration::from_secs(self.rate_limit.lockout_secs)
    }
}
