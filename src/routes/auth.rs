// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and session routes: register, login, refresh, logout, profile.
//!
//! Tokens travel in http-only cookies. The access token is also echoed in
//! the body for clients that send it as a bearer header; the refresh token
//! never is.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::config::Config;
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::{Gender, Level, UserProfile};
use crate::routes::extract::{not_blank, ValidJson};
use crate::services::{NewAccount, ProfileUpdate, TokenPair};
use crate::AppState;

/// Access token cookie.
pub const ACCESS_COOKIE: &str = "token";
/// Refresh token cookie.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Routes reachable without an access token.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .route("/logout", post(logout))
}

/// Routes behind the auth gate (applied in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/update", patch(update_profile))
}

// ─── Cookies ─────────────────────────────────────────────────

/// Build a session cookie.
///
/// Production: `SameSite=Strict` and `Secure`. Elsewhere: `SameSite=Lax`,
/// no `Secure`, so plain-http localhost works.
fn session_cookie(
    name: &'static str,
    value: String,
    max_age: Duration,
    config: &Config,
) -> Cookie<'static> {
    let same_site = if config.is_production() {
        SameSite::Strict
    } else {
        SameSite::Lax
    };

    Cookie::build((name, value))
        .http_only(true)
        .secure(config.is_production())
        .same_site(same_site)
        .path("/")
        .max_age(time::Duration::seconds(
            i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX),
        ))
        .build()
}

fn set_session_cookies(jar: CookieJar, tokens: &TokenPair, config: &Config) -> CookieJar {
    jar.add(session_cookie(
        ACCESS_COOKIE,
        tokens.access_token.clone(),
        config.access_token_ttl,
        config,
    ))
    .add(session_cookie(
        REFRESH_COOKIE,
        tokens.refresh_token.clone(),
        config.refresh_token_ttl,
        config,
    ))
}

/// Expire both session cookies with the attributes they were set with.
///
/// Uses `add` with a removal cookie rather than `remove`, so the
/// `Set-Cookie` headers are sent even when the request carried no cookies.
fn clear_session_cookies(jar: CookieJar, config: &Config) -> CookieJar {
    [ACCESS_COOKIE, REFRESH_COOKIE]
        .into_iter()
        .fold(jar, |jar, name| {
            let mut cookie = session_cookie(name, String::new(), Duration::ZERO, config);
            cookie.make_removal();
            jar.add(cookie)
        })
}

// ─── Request / Response Bodies ───────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[validate(custom(function = "not_blank", message = "First name is required"))]
    pub first_name: String,
    #[validate(custom(function = "not_blank", message = "Last name is required"))]
    pub last_name: String,
    pub dob: NaiveDate,
    pub gender: Gender,
    #[validate(range(exclusive_min = 0.0, message = "Height must be a positive number"))]
    pub height: f64,
    #[validate(range(exclusive_min = 0.0, message = "Weight must be a positive number"))]
    pub weight: f64,
    #[serde(default)]
    pub level: Option<Level>,
}

impl From<RegisterRequest> for NewAccount {
    fn from(req: RegisterRequest) -> Self {
        Self {
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            dob: req.dob,
            gender: req.gender,
            height: req.height,
            weight: req.weight,
            level: req.level,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(custom(function = "not_blank", message = "First name is required"))]
    pub first_name: String,
    #[validate(custom(function = "not_blank", message = "Last name is required"))]
    pub last_name: String,
    pub dob: NaiveDate,
    pub gender: Gender,
    #[validate(range(exclusive_min = 0.0, message = "Height must be a positive number"))]
    pub height: f64,
    #[validate(range(exclusive_min = 0.0, message = "Weight must be a positive number"))]
    pub weight: f64,
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default)]
    #[validate(url(message = "Profile picture must be a URL"))]
    pub profile_picture: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            dob: req.dob,
            gender: req.gender,
            height: req.height,
            weight: req.weight,
            level: req.level,
            profile_picture: req.profile_picture,
        }
    }
}

/// Register/login response: profile plus the access token.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub user: UserProfile,
    pub token: String,
}

/// Refresh response: only the new access token.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub success: bool,
    pub data: UserProfile,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateProfileResponse {
    pub success: bool,
    pub message: String,
    pub user: UserProfile,
}

// ─── Handlers ────────────────────────────────────────────────

/// Create an account and start a session.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidJson(body): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let session = state.sessions.register(body.into()).await?;
    let jar = set_session_cookies(jar, &session.tokens, &state.config);

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            success: true,
            message: "User registered successfully".to_string(),
            user: session.user,
            token: session.tokens.access_token,
        }),
    ))
}

/// Authenticate and start a new session, revoking any previous one.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidJson(body): ValidJson<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let session = state.sessions.login(&body.email, &body.password).await?;
    let jar = set_session_cookies(jar, &session.tokens, &state.config);

    Ok((
        jar,
        Json(AuthResponse {
            success: true,
            message: "Login successful".to_string(),
            user: session.user,
            token: session.tokens.access_token,
        }),
    ))
}

/// Rotate the refresh token from the cookie into a brand-new pair.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<TokenResponse>)> {
    let presented = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    let tokens = state.sessions.refresh(presented.as_deref()).await?;
    let jar = set_session_cookies(jar, &tokens, &state.config);

    Ok((
        jar,
        Json(TokenResponse {
            success: true,
            token: tokens.access_token,
        }),
    ))
}

/// Revoke the current session (if recognised) and clear cookies. Always 200.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let presented = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    state.sessions.logout(presented.as_deref()).await;

    (
        clear_session_cookies(jar, &state.config),
        Json(MessageResponse {
            success: true,
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// Get current user profile.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProfileResponse>> {
    let profile = state.sessions.profile(&user.user_id).await?;

    Ok(Json(ProfileResponse {
        success: true,
        data: profile,
    }))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidJson(body): ValidJson<UpdateProfileRequest>,
) -> Result<Json<UpdateProfileResponse>> {
    let profile = state
        .sessions
        .update_profile(&user.user_id, body.into())
        .await?;

    Ok(Json(UpdateProfileResponse {
        success: true,
        message: "Profile updated successfully".to_string(),
        user: profile,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[test]
    fn test_development_cookie_attributes() {
        let config = Config::default();
        let cookie = session_cookie(
            ACCESS_COOKIE,
            "abc".to_string(),
            Duration::from_secs(900),
            &config,
        );
        let rendered = cookie.to_string();

        assert!(rendered.starts_with("token=abc"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=900"));
        assert!(!rendered.contains("Secure"));
    }

    #[test]
    fn test_production_cookie_attributes() {
        let config = Config {
            environment: Environment::Production,
            ..Config::default()
        };
        let cookie = session_cookie(
            REFRESH_COOKIE,
            "xyz".to_string(),
            config.refresh_token_ttl,
            &config,
        );
        let rendered = cookie.to_string();

        assert!(rendered.starts_with("refreshToken=xyz"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Strict"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("Max-Age=604800"));
    }
}
