// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout log routes.

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{ExerciseType, Workout};
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
        .route("/workouts", get(list_workouts).post(create_workout))
        .route(
            "/workouts/{id}",
            get(get_workout).put(replace_workout).delete(delete_workout),
        )
}

fn not_found() -> AppError {
    AppError::NotFound("Workout not found.".to_string())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRequest {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    pub exercise_type: ExerciseType,
    #[validate(range(exclusive_min = 0.0, message = "Duration must be a positive number"))]
    pub duration: f64,
    #[validate(range(
        exclusive_min = 0.0,
        message = "Calories burned must be a positive number"
    ))]
    pub calories_burned: f64,
    pub workout_date: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub workout: Workout,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutListResponse {
    pub success: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub count: usize,
    pub workouts: Vec<Workout>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteWorkoutResponse {
    pub success: bool,
    pub message: String,
}

async fn create_workout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidJson(body): ValidJson<WorkoutRequest>,
) -> Result<(StatusCode, Json<WorkoutResponse>)> {
    let now = format_utc_rfc3339(Utc::now());
    let workout = Workout {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.user_id,
        name: body.name.trim().to_string(),
        exercise_type: body.exercise_type,
        duration: body.duration,
        calories_burned: body.calories_burned,
        workout_date: body.workout_date,
        notes: body.notes.filter(|n| !n.trim().is_empty()),
        created_at: now.clone(),
        updated_at: now,
    };

    state.db.set_workout(&workout).await?;
    tracing::info!(
        user_id = %workout.user_id,
        workout_id = %workout.id,
        "Workout logged"
    );

    Ok((
        StatusCode::CREATED,
        Json(WorkoutResponse {
            success: true,
            message: Some("Workout created successfully.".to_string()),
            workout,
        }),
    ))
}

/// List every workout of the caller, most recent first.
async fn list_workouts(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<WorkoutListResponse>> {
    let workouts = state.db.get_workouts_for_user(&user.user_id).await?;

    Ok(Json(WorkoutListResponse {
        success: true,
        count: workouts.len(),
        workouts,
    }))
}

async fn get_workout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<WorkoutResponse>> {
    let workout = state
        .db
        .get_workout(&user.user_id, &id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(WorkoutResponse {
        success: true,
        message: None,
        workout,
    }))
}

async fn replace_workout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<WorkoutRequest>,
) -> Result<Json<WorkoutResponse>> {
    let mut workout = state
        .db
        .get_workout(&user.user_id, &id)
        .await?
        .ok_or_else(not_found)?;

    workout.name = body.name.trim().to_string();
    workout.exercise_type = body.exercise_type;
    workout.duration = body.duration;
    workout.calories_burned = body.calories_burned;
    workout.workout_date = body.workout_date;
    workout.notes = body.notes.filter(|n| !n.trim().is_empty());
    workout.updated_at = format_utc_rfc3339(Utc::now());

    state.db.set_workout(&workout).await?;

    Ok(Json(WorkoutResponse {
        success: true,
        message: Some("Workout updated successfully.".to_string()),
        workout,
    }))
}

async fn delete_workout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteWorkoutResponse>> {
    if state.db.get_workout(&user.user_id, &id).await?.is_none() {
        return Err(not_found());
    }

    state.db.delete_workout(&id).await?;

    Ok(Json(DeleteWorkoutResponse {
        success: true,
        message: "Workout deleted successfully.".to_string(),
    }))
}
