// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Mirrors the Firestore collections with `DashMap`s so the API can run
//! without GCP (local development, tests). Per-document writes are atomic;
//! there are no multi-document transactions.

use crate::error::AppError;
use crate::models::{Goal, User, Workout};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    /// Normalized email -> user ID
    emails: DashMap<String, String>,
    goals: DashMap<String, Goal>,
    workouts: DashMap<String, Workout>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Users ───────────────────────────────────────────────────

    pub fn get_user(&self, user_id: &str) -> Option<User> {
        self.users.get(user_id).map(|u| u.clone())
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        let user_id = self.emails.get(email)?.clone();
        self.get_user(&user_id)
    }

    pub fn find_user_by_refresh_hash(&self, hash: &str) -> Option<User> {
        self.users
            .iter()
            .find(|u| u.refresh_token_hash.as_deref() == Some(hash))
            .map(|u| u.clone())
    }

    /// Insert a new user, claiming its email atomically.
    pub fn create_user(&self, user: &User) -> Result<(), AppError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict("Email already in use.".to_string())),
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
                self.users.insert(user.id.clone(), user.clone());
                Ok(())
            }
        }
    }

    /// Replace profile fields of an existing user.
    ///
    /// The stored email, password hash and refresh token are kept so a
    /// profile edit never races a session rotation.
    pub fn update_profile(&self, user: &User) -> Result<(), AppError> {
        let mut stored = self
            .users
            .get_mut(&user.id)
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

        stored.first_name = user.first_name.clone();
        stored.last_name = user.last_name.clone();
        stored.dob = user.dob;
        stored.gender = user.gender;
        stored.height = user.height;
        stored.weight = user.weight;
        stored.level = user.level;
        stored.profile_picture = user.profile_picture.clone();
        stored.updated_at = user.updated_at.clone();
        Ok(())
    }

    /// Write the user's refresh token digest (or its absence). Last write wins.
    pub fn set_refresh_token(&self, user: &User) -> Result<(), AppError> {
        let mut stored = self
            .users
            .get_mut(&user.id)
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

        stored.refresh_token_hash = user.refresh_token_hash.clone();
        stored.updated_at = user.updated_at.clone();
        Ok(())
    }

    // ─── Goals ───────────────────────────────────────────────────

    pub fn goals_for_user(&self, user_id: &str) -> Vec<Goal> {
        self.goals
            .iter()
            .filter(|g| g.user_id == user_id)
            .map(|g| g.clone())
            .collect()
    }

    pub fn get_goal(&self, goal_id: &str) -> Option<Goal> {
        self.goals.get(goal_id).map(|g| g.clone())
    }

    pub fn set_goal(&self, goal: &Goal) {
        self.goals.insert(goal.id.clone(), goal.clone());
    }

    pub fn delete_goal(&self, goal_id: &str) {
        self.goals.remove(goal_id);
    }

    // ─── Workouts ────────────────────────────────────────────────

    pub fn workouts_for_user(&self, user_id: &str) -> Vec<Workout> {
        self.workouts
            .iter()
            .filter(|w| w.user_id == user_id)
            .map(|w| w.clone())
            .collect()
    }

    pub fn get_workout(&self, workout_id: &str) -> Option<Workout> {
        self.workouts.get(workout_id).map(|w| w.clone())
    }

    pub fn set_workout(&self, workout: &Workout) {
        self.workouts.insert(workout.id.clone(), workout.clone());
    }

    pub fn delete_workout(&self, workout_id: &str) {
        self.workouts.remove(workout_id);
    }
}
