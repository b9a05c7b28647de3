// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Fitness tracker: user accounts, workout logging and goal tracking.
//!
//! This crate provides the backend API. Sessions are a short-lived access
//! token plus a rotating refresh token, both carried in http-only cookies.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{PasswordHasher, SessionManager, TokenService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub sessions: SessionManager,
}

impl AppState {
    /// Wire the session services to `db` using the settings in `config`.
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        let sessions = SessionManager::new(
            db.clone(),
            TokenService::new(&config),
            PasswordHasher::new(config.bcrypt_cost),
        );

        Self {
            config,
            db,
            sessions,
        }
    }
}
