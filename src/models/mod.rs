// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod goal;
pub mod user;
pub mod workout;

pub use goal::{Goal, GoalType, GoalUnit};
pub use user::{Gender, Level, User, UserProfile};
pub use workout::{ExerciseType, Workout};
