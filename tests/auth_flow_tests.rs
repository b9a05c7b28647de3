// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end session lifecycle tests.
//!
//! Register, login, refresh rotation, replay detection and logout, driven
//! through the router against the in-memory store.

use axum::http::StatusCode;
use fitness_tracker::services::password::verify_password;
use serde_json::json;

mod common;
use common::{body_json, cookie_value, register, registration, request, send};

#[tokio::test]
async fn test_register_login_refresh_logout_scenario() {
    let (app, state) = common::create_test_app();

    // Register
    let body = registration("a@x.com", "secret1");
    let response = send(&app, request("POST", "/register", Some(&body), None)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let access = cookie_value(&response, "token");
    let refresh = cookie_value(&response, "refreshToken");
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "User registered successfully");
    assert_eq!(json["user"]["email"], "a@x.com");
    assert_eq!(json["user"]["level"], "beginner");
    assert_eq!(json["token"], access.as_str());
    assert!(json["user"].get("passwordHash").is_none());
    assert!(json["user"].get("refreshTokenHash").is_none());

    // Stored hash verifies and is not the plaintext
    let user_id = json["user"]["id"].as_str().unwrap().to_string();
    let stored = state.db.get_user(&user_id).await.unwrap().unwrap();
    assert_ne!(stored.password_hash, "secret1");
    assert!(verify_password("secret1", &stored.password_hash).unwrap());

    // Access token opens the profile
    let response = send(
        &app,
        request("GET", "/profile", None, Some(&format!("token={access}"))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], user_id.as_str());

    // Refresh rotates both tokens
    let response = send(
        &app,
        request(
            "POST",
            "/refresh-token",
            None,
            Some(&format!("refreshToken={refresh}")),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = cookie_value(&response, "refreshToken");
    assert_ne!(rotated, refresh);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert!(json["token"].as_str().is_some_and(|t| !t.is_empty()));

    // Replaying the retired token fails
    let response = send(
        &app,
        request(
            "POST",
            "/refresh-token",
            None,
            Some(&format!("refreshToken={refresh}")),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Refresh token mismatch.");

    // Logout revokes the live token
    let response = send(
        &app,
        request(
            "POST",
            "/logout",
            None,
            Some(&format!("refreshToken={rotated}")),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        request(
            "POST",
            "/refresh-token",
            None,
            Some(&format!("refreshToken={rotated}")),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let stored = state.db.get_user(&user_id).await.unwrap().unwrap();
    assert!(stored.refresh_token_hash.is_none());
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let (app, state) = common::create_test_app();
    let first = register(&app, "a@x.com", "secret1").await;
    let before = state.db.get_user(&first.user_id).await.unwrap().unwrap();

    let body = registration("A@X.com", "another1");
    let response = send(&app, request("POST", "/register", Some(&body), None)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(common::set_cookie_headers(&response).is_empty());
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Email already in use.");

    // The existing session is untouched
    let after = state.db.get_user(&first.user_id).await.unwrap().unwrap();
    assert_eq!(before.refresh_token_hash, after.refresh_token_hash);
    assert_eq!(before.password_hash, after.password_hash);
}

#[tokio::test]
async fn test_login_sets_cookies_and_revokes_previous_session() {
    let (app, _) = common::create_test_app();
    let registered = register(&app, "a@x.com", "secret1").await;

    let body = json!({ "email": "A@x.COM", "password": "secret1" });
    let response = send(&app, request("POST", "/login", Some(&body), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let refresh = cookie_value(&response, "refreshToken");
    let json = body_json(response).await;
    assert_eq!(json["message"], "Login successful");
    assert_eq!(json["user"]["id"], registered.user_id.as_str());

    // Only one live refresh token per user
    let response = send(
        &app,
        request(
            "POST",
            "/refresh-token",
            None,
            Some(&registered.refresh_cookie()),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        request(
            "POST",
            "/refresh-token",
            None,
            Some(&format!("refreshToken={refresh}")),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (app, _) = common::create_test_app();
    register(&app, "a@x.com", "secret1").await;

    let unknown = json!({ "email": "b@x.com", "password": "secret1" });
    let response = send(&app, request("POST", "/login", Some(&unknown), None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(common::set_cookie_headers(&response).is_empty());
    let unknown_body = body_json(response).await;

    let wrong = json!({ "email": "a@x.com", "password": "wrong-password" });
    let response = send(&app, request("POST", "/login", Some(&wrong), None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let wrong_body = body_json(response).await;

    assert_eq!(unknown_body, wrong_body);
    assert_eq!(wrong_body["message"], "Invalid email or password.");
}

#[tokio::test]
async fn test_refresh_without_cookie_is_unauthorized() {
    let (app, _) = common::create_test_app();

    let response = send(&app, request("POST", "/refresh-token", None, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Refresh token missing.");
}

#[tokio::test]
async fn test_refresh_rejects_garbage_and_access_tokens() {
    let (app, _) = common::create_test_app();
    let session = register(&app, "a@x.com", "secret1").await;

    let response = send(
        &app,
        request("POST", "/refresh-token", None, Some("refreshToken=not-a-jwt")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // An access token is signed with the other secret
    let response = send(
        &app,
        request(
            "POST",
            "/refresh-token",
            None,
            Some(&format!("refreshToken={}", session.access_token)),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Invalid or expired refresh token.");
}

#[tokio::test]
async fn test_logout_always_succeeds() {
    let (app, _) = common::create_test_app();

    for cookie in [None, Some("refreshToken=garbage")] {
        let response = send(&app, request("POST", "/logout", None, cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Logged out successfully");
    }

    // Twice with the same live token
    let session = register(&app, "a@x.com", "secret1").await;
    for _ in 0..2 {
        let response = send(
            &app,
            request("POST", "/logout", None, Some(&session.refresh_cookie())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_update_profile() {
    let (app, _) = common::create_test_app();
    let session = register(&app, "a@x.com", "secret1").await;

    let body = json!({
        "firstName": "Grace",
        "lastName": "Hopper",
        "dob": "1906-12-09",
        "gender": "female",
        "height": 165.0,
        "weight": 55.0,
        "level": "advanced",
        "profilePicture": "https://img.example/grace.png"
    });
    let response = send(
        &app,
        request("PATCH", "/update", Some(&body), Some(&session.access_cookie())),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["user"]["firstName"], "Grace");
    assert_eq!(json["user"]["level"], "advanced");
    assert_eq!(json["user"]["email"], "a@x.com");

    // Profile edits leave the session alive
    let response = send(
        &app,
        request("POST", "/refresh-token", None, Some(&session.refresh_cookie())),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}
