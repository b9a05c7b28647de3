// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing with bcrypt.
//!
//! Plain functions over strings, independent of any storage. The async
//! wrappers move the CPU-heavy work onto the blocking pool.

use crate::error::AppError;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Stand-in password for [`PasswordHasher::verify_dummy`].
const DUMMY_PASSWORD: &str = "no-such-account-placeholder";

/// Hash a password with a fresh random salt.
pub fn hash_password(plaintext: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plaintext, cost)
}

/// Check a password against a stored bcrypt hash.
pub fn verify_password(plaintext: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(plaintext, hash)
}

/// bcrypt hasher with a fixed work factor.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    /// Hash of [`DUMMY_PASSWORD`] at `cost`, computed on first use.
    dummy_hash: Arc<OnceCell<String>>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Run a full verify against a throwaway hash of the same cost.
    ///
    /// Used when there is no stored hash to check (unknown account) so the
    /// failure takes as long as a wrong password. The outcome is discarded.
    pub async fn verify_dummy(&self, plaintext: &str) -> Result<(), AppError> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| self.hash(DUMMY_PASSWORD))
            .await?;
        self.verify(plaintext, hash).await.map(|_| ())
    }

    pub async fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        let plaintext = plaintext.to_string();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || hash_password(&plaintext, cost))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing task failed: {}", e)))?
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))
    }

    pub async fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, AppError> {
        let plaintext = plaintext.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || verify_password(&plaintext, &hash))
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Password verification task failed: {}", e))
            })?
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Password verification error: {}", e)))
    }
}
