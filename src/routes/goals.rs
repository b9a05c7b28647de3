// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Goal routes. All require authentication; a goal owned by someone else
//! is reported exactly like a missing one.

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{Goal, GoalType, GoalUnit};
use crate::routes::extract::{not_blank, ValidJson};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/goals", get(list_goals).post(create_goal))
        .route(
            "/goals/{id}",
            get(get_goal)
                .put(replace_goal)
                .patch(complete_goal)
                .delete(delete_goal),
        )
}

fn not_found() -> AppError {
    AppError::NotFound("Goal not found.".to_string())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GoalRequest {
    pub goal_type: GoalType,
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "Current value must be a positive number"))]
    pub current_value: f64,
    #[validate(range(min = 0.0, message = "Target value must be a positive number"))]
    pub target_value: f64,
    pub unit: GoalUnit,
    pub target_date: DateTime<Utc>,
    #[serde(default)]
    pub is_completed: bool,
}

impl GoalRequest {
    /// Apply the request onto `goal`, leaving identity and `created_at` alone.
    fn apply(self, goal: &mut Goal) {
        goal.goal_type = self.goal_type;
        goal.title = self.title.trim().to_string();
        goal.description = self.description.filter(|d| !d.trim().is_empty());
        goal.current_value = self.current_value;
        goal.target_value = self.target_value;
        goal.unit = self.unit;
        goal.target_date = self.target_date;
        goal.is_completed = self.is_completed;
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GoalResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub goal: Goal,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GoalListResponse {
    pub success: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub count: usize,
    pub goals: Vec<Goal>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteGoalResponse {
    pub success: bool,
    pub message: String,
}

async fn create_goal(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidJson(body): ValidJson<GoalRequest>,
) -> Result<(StatusCode, Json<GoalResponse>)> {
    let now = format_utc_rfc3339(Utc::now());
    let mut goal = Goal {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.user_id,
        goal_type: body.goal_type,
        title: String::new(),
        description: None,
        current_value: 0.0,
        target_value: 0.0,
        unit: body.unit,
        target_date: body.target_date,
        is_completed: false,
        created_at: now.clone(),
        updated_at: now,
    };
    body.apply(&mut goal);

    state.db.set_goal(&goal).await?;
    tracing::info!(user_id = %goal.user_id, goal_id = %goal.id, "Goal created");

    Ok((
        StatusCode::CREATED,
        Json(GoalResponse {
            success: true,
            message: Some("Goal created successfully.".to_string()),
            goal,
        }),
    ))
}

/// List the caller's goals, newest first.
async fn list_goals(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<GoalListResponse>> {
    let goals = state.db.get_goals_for_user(&user.user_id).await?;

    Ok(Json(GoalListResponse {
        success: true,
        count: goals.len(),
        goals,
    }))
}

async fn get_goal(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<GoalResponse>> {
    let goal = state
        .db
        .get_goal(&user.user_id, &id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(GoalResponse {
        success: true,
        message: None,
        goal,
    }))
}

/// Replace every editable field of a goal.
async fn replace_goal(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<GoalRequest>,
) -> Result<Json<GoalResponse>> {
    let mut goal = state
        .db
        .get_goal(&user.user_id, &id)
        .await?
        .ok_or_else(not_found)?;

    body.apply(&mut goal);
    goal.updated_at = format_utc_rfc3339(Utc::now());
    state.db.set_goal(&goal).await?;

    Ok(Json(GoalResponse {
        success: true,
        message: Some("Goal updated successfully.".to_string()),
        goal,
    }))
}

async fn complete_goal(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<GoalResponse>> {
    let mut goal = state
        .db
        .get_goal(&user.user_id, &id)
        .await?
        .ok_or_else(not_found)?;

    goal.is_completed = true;
    goal.updated_at = format_utc_rfc3339(Utc::now());
    state.db.set_goal(&goal).await?;

    tracing::info!(user_id = %goal.user_id, goal_id = %goal.id, "Goal completed");

    Ok(Json(GoalResponse {
        success: true,
        message: Some("Goal marked as completed.".to_string()),
        goal,
    }))
}

async fn delete_goal(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteGoalResponse>> {
    if state.db.get_goal(&user.user_id, &id).await?.is_none() {
        return Err(not_found());
    }

    state.db.delete_goal(&id).await?;

    Ok(Json(DeleteGoalResponse {
        success: true,
        message: "Goal deleted successfully.".to_string(),
    }))
}
