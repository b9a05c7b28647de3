// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod password;
pub mod session;
pub mod token;

pub use password::PasswordHasher;
pub use session::{NewAccount, ProfileUpdate, Session, SessionManager};
pub use token::{TokenKind, TokenPair, TokenService};
