// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed session tokens (HS256 JWTs).
//!
//! Access and refresh tokens are signed with two different secrets and carry
//! their kind in `typ`, so one can never stand in for the other.

use crate::config::Config;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub typ: TokenKind,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Unique token ID
    pub jti: String,
}

impl Claims {
    /// Claims for `user_id` expiring `ttl` from now.
    pub fn new(user_id: &str, role: Option<String>, typ: TokenKind, ttl: Duration) -> Self {
        let now = unix_now();
        Self {
            sub: user_id.to_string(),
            role,
            typ,
            iat: now,
            exp: now.saturating_add(ttl.as_secs() as usize),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Bad signature, malformed token, wrong kind, or expired.
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

fn unix_now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or(0)
}

/// Sign `claims` with `secret`.
pub fn issue(claims: &Claims, secret: &[u8]) -> Result<String, TokenError> {
    Ok(encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret),
    )?)
}

/// Verify signature and expiry of `token` against `secret`.
pub fn verify(token: &str, secret: &[u8]) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "JWT verification failed");
            TokenError::InvalidToken
        })
}

/// SHA-256 digest (hex) of a token, as stored on the user record.
pub fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and verifies both token kinds with the configured secrets.
#[derive(Clone)]
pub struct TokenService {
    access_secret: Vec<u8>,
    refresh_secret: Vec<u8>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &Config) -> Self {
        Self {
            access_secret: config.jwt_access_secret.clone(),
            refresh_secret: config.jwt_refresh_secret.clone(),
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
        }
    }

    fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => &self.access_secret,
            TokenKind::Refresh => &self.refresh_secret,
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    pub fn issue(
        &self,
        kind: TokenKind,
        user_id: &str,
        role: Option<String>,
    ) -> Result<String, TokenError> {
        let claims = Claims::new(user_id, role, kind, self.ttl(kind));
        issue(&claims, self.secret(kind))
    }

    /// Issue a new access/refresh pair for a user.
    pub fn issue_pair(&self, user_id: &str, role: Option<String>) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue(TokenKind::Access, user_id, role.clone())?,
            refresh_token: self.issue(TokenKind::Refresh, user_id, role)?,
        })
    }

    /// Verify a token of the given kind.
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, TokenError> {
        let claims = verify(token, self.secret(kind))?;
        if claims.typ != kind {
            return Err(TokenError::InvalidToken);
        }
        Ok(claims)
    }
}
