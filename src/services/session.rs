// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle: register, login, refresh-token rotation and logout.
//!
//! Each user has at most one live refresh token. Its SHA-256 digest is kept on
//! the user record; login and refresh overwrite it, logout clears it. A token
//! whose digest no longer matches is dead even if its signature is valid.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::user::normalize_email;
use crate::models::{Gender, Level, User, UserProfile};
use crate::services::password::PasswordHasher;
use crate::services::token::{digest, TokenKind, TokenPair, TokenService};
use crate::time_utils::format_utc_rfc3339;
use chrono::NaiveDate;
use subtle::ConstantTimeEq;

const INVALID_CREDENTIALS: &str = "Invalid email or password.";

/// Everything needed to create an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub gender: Gender,
    pub height: f64,
    pub weight: f64,
    pub level: Option<Level>,
}

/// Editable profile attributes.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub gender: Gender,
    pub height: f64,
    pub weight: f64,
    pub level: Option<Level>,
    pub profile_picture: Option<String>,
}

/// Result of a successful register or login.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

/// Orchestrates the credential store, password hasher and token service.
#[derive(Clone)]
pub struct SessionManager {
    db: FirestoreDb,
    tokens: TokenService,
    hasher: PasswordHasher,
}

impl SessionManager {
    pub fn new(db: FirestoreDb, tokens: TokenService, hasher: PasswordHasher) -> Self {
        Self { db, tokens, hasher }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    fn issue_pair(&self, user: &User) -> Result<TokenPair> {
        self.tokens
            .issue_pair(&user.id, user.role.clone())
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Failed to issue tokens");
                AppError::MissingTokens
            })
    }

    /// Create an account and open its first session.
    pub async fn register(&self, account: NewAccount) -> Result<Session> {
        let email = normalize_email(&account.email);

        if self.db.find_user_by_email(&email).await?.is_some() {
            tracing::info!("Registration rejected: email already in use");
            return Err(AppError::Conflict("Email already in use.".to_string()));
        }

        let password_hash = self.hasher.hash(&account.password).await?;
        let now = format_utc_rfc3339(chrono::Utc::now());

        let mut user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            password_hash,
            refresh_token_hash: None,
            role: None,
            first_name: account.first_name.trim().to_string(),
            last_name: account.last_name.trim().to_string(),
            dob: account.dob,
            gender: account.gender,
            height: account.height,
            weight: account.weight,
            level: account.level.unwrap_or_default(),
            profile_picture: None,
            created_at: now.clone(),
            updated_at: now,
        };

        let tokens = self.issue_pair(&user)?;
        user.refresh_token_hash = Some(digest(&tokens.refresh_token));

        self.db.create_user(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(Session {
            user: user.into(),
            tokens,
        })
    }

    /// Authenticate with email and password, replacing any previous session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = normalize_email(email);

        let Some(mut user) = self.db.find_user_by_email(&email).await? else {
            // Pay for a bcrypt verify anyway so timing matches a wrong password
            if let Err(e) = self.hasher.verify_dummy(password).await {
                tracing::error!(error = %e, "Dummy password verification failed");
            }
            tracing::info!("Login failed: unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !self.hasher.verify(password, &user.password_hash).await? {
            tracing::info!(user_id = %user.id, "Login failed: wrong password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let tokens = self.issue_pair(&user)?;
        user.refresh_token_hash = Some(digest(&tokens.refresh_token));
        user.updated_at = format_utc_rfc3339(chrono::Utc::now());
        self.db.set_refresh_token(&user).await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(Session {
            user: user.into(),
            tokens,
        })
    }

    /// Exchange a refresh token for a brand-new pair, retiring the old one.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<TokenPair> {
        let refresh_token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Refresh token missing.".to_string()))?;

        let claims = self
            .tokens
            .verify(TokenKind::Refresh, refresh_token)
            .map_err(|_| AppError::Forbidden("Invalid or expired refresh token.".to_string()))?;

        let mismatch = || AppError::Forbidden("Refresh token mismatch.".to_string());

        let mut user = self.db.get_user(&claims.sub).await?.ok_or_else(mismatch)?;

        let presented = digest(refresh_token);
        let matches = user
            .refresh_token_hash
            .as_deref()
            .map(|stored| bool::from(stored.as_bytes().ct_eq(presented.as_bytes())))
            .unwrap_or(false);

        if !matches {
            tracing::warn!(user_id = %user.id, "Refresh token replay or revoked session");
            return Err(mismatch());
        }

        let tokens = self.issue_pair(&user)?;
        user.refresh_token_hash = Some(digest(&tokens.refresh_token));
        user.updated_at = format_utc_rfc3339(chrono::Utc::now());
        self.db.set_refresh_token(&user).await?;

        tracing::debug!(user_id = %user.id, "Refresh token rotated");

        Ok(tokens)
    }

    /// Revoke the session identified by `refresh_token`, if any.
    ///
    /// Never fails: an unknown token or a store error only gets logged, the
    /// caller clears cookies regardless.
    pub async fn logout(&self, refresh_token: Option<&str>) {
        let Some(token) = refresh_token.filter(|t| !t.is_empty()) else {
            return;
        };

        let mut user = match self.db.find_user_by_refresh_hash(&digest(token)).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::debug!("Logout with unknown refresh token");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to look up session during logout");
                return;
            }
        };

        user.refresh_token_hash = None;
        user.updated_at = format_utc_rfc3339(chrono::Utc::now());

        match self.db.set_refresh_token(&user).await {
            Ok(()) => tracing::info!(user_id = %user.id, "User logged out"),
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to revoke refresh token")
            }
        }
    }

    /// Load the profile of an authenticated user.
    pub async fn profile(&self, user_id: &str) -> Result<UserProfile> {
        self.db
            .get_user(user_id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
    }

    /// Replace the editable profile attributes of an authenticated user.
    pub async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<UserProfile> {
        let mut user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

        user.first_name = update.first_name.trim().to_string();
        user.last_name = update.last_name.trim().to_string();
        user.dob = update.dob;
        user.gender = update.gender;
        user.height = update.height;
        user.weight = update.weight;
        user.level = update.level.unwrap_or_default();
        user.profile_picture = update.profile_picture.filter(|p| !p.trim().is_empty());
        user.updated_at = format_utc_rfc3339(chrono::Utc::now());

        self.db.update_profile(&user).await?;

        tracing::info!(user_id = %user.id, "Profile updated");

        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::password::verify_password;

    fn manager() -> (SessionManager, FirestoreDb) {
        let config = Config::default();
        let db = FirestoreDb::new_in_memory();
        let manager = SessionManager::new(
            db.clone(),
            TokenService::new(&config),
            PasswordHasher::new(config.bcrypt_cost),
        );
        (manager, db)
    }

    fn account(email: &str, password: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            password: password.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            dob: NaiveDate::from_ymd_opt(1990, 12, 10).unwrap(),
            gender: Gender::Female,
            height: 168.0,
            weight: 58.5,
            level: None,
        }
    }

    #[tokio::test]
    async fn test_register_stores_hash_and_refresh_digest() {
        let (sessions, db) = manager();
        let session = sessions.register(account("a@x.com", "secret1")).await.unwrap();

        let stored = db.get_user(&session.user.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "secret1");
        assert!(verify_password("secret1", &stored.password_hash).unwrap());
        assert_eq!(
            stored.refresh_token_hash.as_deref(),
            Some(digest(&session.tokens.refresh_token).as_str())
        );
        assert_eq!(stored.level, Level::Beginner);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts_case_insensitively() {
        let (sessions, db) = manager();
        let first = sessions.register(account("a@x.com", "secret1")).await.unwrap();
        let before = db.get_user(&first.user.id).await.unwrap().unwrap();

        let err = sessions
            .register(account("  A@X.COM ", "other-pass"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let after = db.get_user(&first.user.id).await.unwrap().unwrap();
        assert_eq!(before.refresh_token_hash, after.refresh_token_hash);
    }

    #[tokio::test]
    async fn test_login_errors_are_indistinguishable() {
        let (sessions, _) = manager();
        sessions.register(account("a@x.com", "secret1")).await.unwrap();

        let unknown = sessions.login("b@x.com", "secret1").await.unwrap_err();
        let wrong = sessions.login("a@x.com", "wrong").await.unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(matches!(unknown, AppError::Unauthorized(_)));
        assert!(matches!(wrong, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_rotation_kills_previous_tokens() {
        let (sessions, _) = manager();
        let registered = sessions.register(account("a@x.com", "secret1")).await.unwrap();
        let logged_in = sessions.login("A@x.com", "secret1").await.unwrap();

        // Login revoked the registration session
        let err = sessions
            .refresh(Some(&registered.tokens.refresh_token))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let rotated = sessions
            .refresh(Some(&logged_in.tokens.refresh_token))
            .await
            .unwrap();
        assert_ne!(rotated.refresh_token, logged_in.tokens.refresh_token);

        let replay = sessions
            .refresh(Some(&logged_in.tokens.refresh_token))
            .await
            .unwrap_err();
        assert_eq!(replay.to_string(), "Refresh token mismatch.");

        assert!(sessions.refresh(Some(&rotated.refresh_token)).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_email_costs_a_bcrypt_verify() {
        let config = Config {
            bcrypt_cost: 8,
            ..Config::default()
        };
        let sessions = SessionManager::new(
            FirestoreDb::new_in_memory(),
            TokenService::new(&config),
            PasswordHasher::new(config.bcrypt_cost),
        );
        sessions.register(account("a@x.com", "secret1")).await.unwrap();

        // First unknown-email login also builds the cached dummy hash
        sessions.login("b@x.com", "secret1").await.unwrap_err();

        let started = std::time::Instant::now();
        sessions.login("b@x.com", "secret1").await.unwrap_err();
        let unknown = started.elapsed();

        let started = std::time::Instant::now();
        sessions.login("a@x.com", "wrong").await.unwrap_err();
        let wrong = started.elapsed();

        assert!(
            unknown * 10 >= wrong,
            "unknown email {unknown:?} vs wrong password {wrong:?}"
        );
    }

    #[tokio::test]
    async fn test_refresh_without_token_is_unauthorized() {
        let (sessions, _) = manager();
        assert!(matches!(
            sessions.refresh(None).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            sessions.refresh(Some("")).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let (sessions, _) = manager();
        let session = sessions.register(account("a@x.com", "secret1")).await.unwrap();

        let err = sessions
            .refresh(Some(&session.tokens.access_token))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid or expired refresh token.");
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let (sessions, db) = manager();
        let session = sessions.register(account("a@x.com", "secret1")).await.unwrap();

        sessions.logout(Some(&session.tokens.refresh_token)).await;

        let stored = db.get_user(&session.user.id).await.unwrap().unwrap();
        assert!(stored.refresh_token_hash.is_none());
        assert!(sessions
            .refresh(Some(&session.tokens.refresh_token))
            .await
            .is_err());

        // Idempotent
        sessions.logout(Some(&session.tokens.refresh_token)).await;
        sessions.logout(None).await;
    }

    #[tokio::test]
    async fn test_update_profile_keeps_session() {
        let (sessions, db) = manager();
        let session = sessions.register(account("a@x.com", "secret1")).await.unwrap();

        let updated = sessions
            .update_profile(
                &session.user.id,
                ProfileUpdate {
                    first_name: " Grace ".to_string(),
                    last_name: "Hopper".to_string(),
                    dob: NaiveDate::from_ymd_opt(1906, 12, 9).unwrap(),
                    gender: Gender::Female,
                    height: 165.0,
                    weight: 55.0,
                    level: Some(Level::Advanced),
                    profile_picture: Some("https://img.example/grace.png".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.first_name, "Grace");
        assert_eq!(updated.level, Level::Advanced);

        let stored = db.get_user(&session.user.id).await.unwrap().unwrap();
        assert!(stored.refresh_token_hash.is_some());
        assert_eq!(stored.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_profile_of_missing_user_is_not_found() {
        let (sessions, _) = manager();
        assert!(matches!(
            sessions.profile("ghost").await,
            Err(AppError::NotFound(_))
        ));
    }
}
