// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup. Core logic receives the resulting
//! `Config` by reference and never looks at the process environment itself.

use std::env;
use std::time::Duration;

const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);
const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const DEFAULT_BCRYPT_COST: u32 = 12;
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

/// Deployment environment. Controls cookie hardening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }
}

/// Where user, goal and workout documents live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Firestore,
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Server port
    pub port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Frontend URL (allowed CORS origin)
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Document store selection
    pub storage: StorageBackend,
    /// Lifetime of access tokens (and the `token` cookie)
    pub access_token_ttl: Duration,
    /// Lifetime of refresh tokens (and the `refreshToken` cookie)
    pub refresh_token_ttl: Duration,
    /// bcrypt work factor
    pub bcrypt_cost: u32,

    // --- Secrets ---
    /// HS256 key for access tokens (raw bytes)
    pub jwt_access_secret: Vec<u8>,
    /// HS256 key for refresh tokens (raw bytes), distinct from the access key
    pub jwt_refresh_secret: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: 8080,
            environment: Environment::Development,
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            storage: StorageBackend::Memory,
            access_token_ttl: DEFAULT_ACCESS_TTL,
            refresh_token_ttl: DEFAULT_REFRESH_TTL,
            bcrypt_cost: MIN_BCRYPT_COST,
            jwt_access_secret: b"test_access_key_32_bytes_minimum!".to_vec(),
            jwt_refresh_secret: b"test_refresh_key_32_bytes_minimum".to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_access_secret = required("JWT_ACCESS_SECRET_KEY")?.into_bytes();
        let jwt_refresh_secret = required("JWT_REFRESH_SECRET_KEY")?.into_bytes();
        if jwt_access_secret == jwt_refresh_secret {
            return Err(ConfigError::Invalid {
                key: "JWT_REFRESH_SECRET_KEY",
                reason: "must differ from JWT_ACCESS_SECRET_KEY".to_string(),
            });
        }

        let storage = match env::var("STORAGE_BACKEND").as_deref() {
            Ok("memory") => StorageBackend::Memory,
            Ok("firestore") | Err(_) => StorageBackend::Firestore,
            Ok(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORAGE_BACKEND",
                    reason: format!("unknown backend '{}'", other),
                })
            }
        };

        let bcrypt_cost = match env::var("BCRYPT_COST") {
            Ok(raw) => parse_bcrypt_cost(&raw)?,
            Err(_) => DEFAULT_BCRYPT_COST,
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            environment: Environment::parse(&env::var("APP_ENV").unwrap_or_default()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            storage,
            access_token_ttl: ttl_var("JWT_ACCESS_EXPIRES_IN", DEFAULT_ACCESS_TTL)?,
            refresh_token_ttl: ttl_var("JWT_REFRESH_EXPIRES_IN", DEFAULT_REFRESH_TTL)?,
            bcrypt_cost,
            jwt_access_secret,
            jwt_refresh_secret,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn ttl_var(key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(key) {
        Ok(raw) => parse_ttl(&raw).ok_or(ConfigError::Invalid {
            key,
            reason: format!("'{}' is not a duration", raw),
        }),
        Err(_) => Ok(default),
    }
}

/// Parse a bcrypt work factor, accepting only what bcrypt supports (4-31).
pub fn parse_bcrypt_cost(raw: &str) -> Result<u32, ConfigError> {
    let cost: u32 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key: "BCRYPT_COST",
        reason: format!("'{}' is not a number", raw),
    })?;

    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(ConfigError::Invalid {
            key: "BCRYPT_COST",
            reason: format!(
                "{} is outside {}..={}",
                cost,
                MIN_BCRYPT_COST,
                MAX_BCRYPT_COST
            ),
        });
    }

    Ok(cost)
}

/// Parse a token lifetime such as `900`, `30s`, `15m`, `12h` or `7d`.
///
/// A bare number is seconds. Zero is rejected.
pub fn parse_ttl(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let value: u64 = digits.parse().ok()?;

    let multiplier = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return None,
    };

    value
        .checked_mul(multiplier)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
