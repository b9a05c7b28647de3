// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Fitness goal model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    WeightLoss,
    WeightGain,
    WorkoutFrequency,
    Calories,
    Distance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum GoalUnit {
    #[serde(rename = "kg")]
    Kg,
    #[serde(rename = "lbs")]
    Lbs,
    #[serde(rename = "km")]
    Km,
    #[serde(rename = "calories")]
    Calories,
    #[serde(rename = "workouts/week")]
    WorkoutsPerWeek,
}

/// Goal document, stored and returned as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    /// Goal ID (also used as document ID)
    pub id: String,
    /// Owning user ID
    pub user_id: String,
    pub goal_type: GoalType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub current_value: f64,
    pub target_value: f64,
    pub unit: GoalUnit,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub target_date: DateTime<Utc>,
    #[serde(default)]
    pub is_completed: bool,
    pub created_at: String,
    pub updated_at: String,
}
