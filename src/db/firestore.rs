// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (credential records and profiles)
//! - Goals
//! - Workouts
//!
//! The same API is served from an in-process [`MemoryStore`] when the
//! database is created with [`FirestoreDb::new_in_memory`].

use crate::db::collections;
use crate::db::memory::MemoryStore;
use crate::error::AppError;
use crate::models::{Goal, User, Workout};
use firestore::errors::FirestoreError;
use firestore::paths;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Uniqueness marker for a normalized email, keyed by its digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmailClaim {
    email: String,
    user_id: String,
}

/// Document ID of the claim for `email`. Hashed because emails may contain
/// characters Firestore does not allow in document IDs.
fn email_claim_id(email: &str) -> String {
    hex::encode(Sha256::digest(email.as_bytes()))
}

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a database backed by process memory (development, tests).
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::new())),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Memory(mem) => Ok(mem.get_user(user_id)),
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::USERS)
                .obj()
                .one(user_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
        }
    }

    /// Find a user by normalized email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Memory(mem) => Ok(mem.find_user_by_email(email)),
            Backend::Firestore(client) => {
                let users: Vec<User> = client
                    .fluent()
                    .select()
                    .from(collections::USERS)
                    .filter(|q| q.for_all([q.field("email").eq(email)]))
                    .limit(1)
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(users.into_iter().next())
            }
        }
    }

    /// Find the user whose live refresh token has the given digest.
    pub async fn find_user_by_refresh_hash(&self, hash: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Memory(mem) => Ok(mem.find_user_by_refresh_hash(hash)),
            Backend::Firestore(client) => {
                let users: Vec<User> = client
                    .fluent()
                    .select()
                    .from(collections::USERS)
                    .filter(|q| q.for_all([q.field("refresh_token_hash").eq(hash)]))
                    .limit(1)
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(users.into_iter().next())
            }
        }
    }

    /// Create a new user. Fails with `Conflict` if the email is taken.
    ///
    /// On Firestore the email is claimed first by creating
    /// `emails/{sha256(email)}`; the create fails with AlreadyExists for the
    /// loser of a concurrent registration. The claim is released if the user
    /// document cannot be written.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(mem) => mem.create_user(user),
            Backend::Firestore(client) => {
                let claim_id = email_claim_id(&user.email);
                let claim = EmailClaim {
                    email: user.email.clone(),
                    user_id: user.id.clone(),
                };

                let claimed: Result<EmailClaim, FirestoreError> = client
                    .fluent()
                    .insert()
                    .into(collections::EMAILS)
                    .document_id(&claim_id)
                    .object(&claim)
                    .execute()
                    .await;

                match claimed {
                    Ok(_) => {}
                    Err(FirestoreError::DataConflictError(_)) => {
                        return Err(AppError::Conflict("Email already in use.".to_string()))
                    }
                    Err(e) => return Err(AppError::Database(e.to_string())),
                }

                let inserted: Result<User, FirestoreError> = client
                    .fluent()
                    .insert()
                    .into(collections::USERS)
                    .document_id(&user.id)
                    .object(user)
                    .execute()
                    .await;

                if let Err(e) = inserted {
                    if let Err(release) = client
                        .fluent()
                        .delete()
                        .from(collections::EMAILS)
                        .document_id(&claim_id)
                        .execute()
                        .await
                    {
                        tracing::warn!(error = %release, "Failed to release email claim");
                    }
                    return Err(AppError::Database(e.to_string()));
                }

                Ok(())
            }
        }
    }

    /// Write the editable profile fields of a user.
    pub async fn update_profile(&self, user: &User) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(mem) => mem.update_profile(user),
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .fields(paths!(User::{
                        first_name,
                        last_name,
                        dob,
                        gender,
                        height,
                        weight,
                        level,
                        profile_picture,
                        updated_at
                    }))
                    .in_col(collections::USERS)
                    .document_id(&user.id)
                    .object(user)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
        }
    }

    /// Write only the refresh token digest (and `updated_at`) of a user.
    ///
    /// Unconditional overwrite: concurrent rotations resolve last-write-wins.
    pub async fn set_refresh_token(&self, user: &User) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(mem) => mem.set_refresh_token(user),
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .fields(paths!(User::{refresh_token_hash, updated_at}))
                    .in_col(collections::USERS)
                    .document_id(&user.id)
                    .object(user)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
        }
    }

    // ─── Goal Operations ─────────────────────────────────────────

    /// Get all goals owned by a user, newest first.
    pub async fn get_goals_for_user(&self, user_id: &str) -> Result<Vec<Goal>, AppError> {
        let mut goals: Vec<Goal> = match &self.backend {
            Backend::Memory(mem) => mem.goals_for_user(user_id),
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collections::GOALS)
                .filter(|q| q.for_all([q.field("userId").eq(user_id)]))
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
        };

        // Sorted here rather than in the query to avoid a composite index
        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(goals)
    }

    /// Get a goal by ID, only if it belongs to `user_id`.
    pub async fn get_goal(&self, user_id: &str, goal_id: &str) -> Result<Option<Goal>, AppError> {
        let goal: Option<Goal> = match &self.backend {
            Backend::Memory(mem) => mem.get_goal(goal_id),
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::GOALS)
                .obj()
                .one(goal_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
        };

        Ok(goal.filter(|g| g.user_id == user_id))
    }

    /// Create or replace a goal.
    pub async fn set_goal(&self, goal: &Goal) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(mem) => mem.set_goal(goal),
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::GOALS)
                    .document_id(&goal.id)
                    .object(goal)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// Delete a goal by ID. Ownership must be checked by the caller.
    pub async fn delete_goal(&self, goal_id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(mem) => mem.delete_goal(goal_id),
            Backend::Firestore(client) => {
                client
                    .fluent()
                    .delete()
                    .from(collections::GOALS)
                    .document_id(goal_id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
        }
        Ok(())
    }

    // ─── Workout Operations ──────────────────────────────────────

    /// Get all workouts owned by a user, most recent workout date first.
    pub async fn get_workouts_for_user(&self, user_id: &str) -> Result<Vec<Workout>, AppError> {
        let mut workouts: Vec<Workout> = match &self.backend {
            Backend::Memory(mem) => mem.workouts_for_user(user_id),
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collections::WORKOUTS)
                .filter(|q| q.for_all([q.field("userId").eq(user_id)]))
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
        };

        workouts.sort_by(|a, b| b.workout_date.cmp(&a.workout_date));
        Ok(workouts)
    }

    /// Get a workout by ID, only if it belongs to `user_id`.
    pub async fn get_workout(
        &self,
        user_id: &str,
        workout_id: &str,
    ) -> Result<Option<Workout>, AppError> {
        let workout: Option<Workout> = match &self.backend {
            Backend::Memory(mem) => mem.get_workout(workout_id),
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::WORKOUTS)
                .obj()
                .one(workout_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
        };

        Ok(workout.filter(|w| w.user_id == user_id))
    }

    /// Create or replace a workout.
    pub async fn set_workout(&self, workout: &Workout) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(mem) => mem.set_workout(workout),
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::WORKOUTS)
                    .document_id(&workout.id)
                    .object(workout)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// Delete a workout by ID. Ownership must be checked by the caller.
    pub async fn delete_workout(&self, workout_id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(mem) => mem.delete_workout(workout_id),
            Backend::Firestore(client) => {
                client
                    .fluent()
                    .delete()
                    .from(collections::WORKOUTS)
                    .document_id(workout_id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
        }
        Ok(())
    }
}
