// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::routes::auth::ACCESS_COOKIE;
use crate::services::TokenKind;
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Option<String>,
}

/// Middleware that requires a valid access token.
///
/// The `token` cookie is checked first, then an `Authorization: Bearer`
/// header. Absent or malformed credentials are 401; a token that fails
/// verification is 403. The gate never refreshes tokens itself.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let missing = || AppError::Unauthorized("Token missing or malformed.".to_string());

    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(ACCESS_COOKIE).filter(|c| !c.value().is_empty()) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => return Err(missing()),
        }
    };

    let claims = state
        .sessions
        .tokens()
        .verify(TokenKind::Access, &token)
        .map_err(|_| AppError::Forbidden("Invalid or expired token.".to_string()))?;

    let auth_user = AuthUser {
        user_id: claims.sub,
        role: claims.role,
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Identity of the caller, as attached by [`require_auth`].
///
/// Handlers behind the gate take this extractor; if the gate did not run the
/// request is refused rather than treated as anonymous.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthUser>() {
            Some(user) => Ok(CurrentUser(user.clone())),
            None => Err(AppError::Unauthorized(
                "Unauthorized: No user ID found.".to_string(),
            )),
        }
    }
}
