// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use fitness_tracker::config::Config;
use fitness_tracker::db::FirestoreDb;
use fitness_tracker::routes::create_router;
use fitness_tracker::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app on the in-memory store with the default test config.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, FirestoreDb::new_in_memory()));
    (create_router(state.clone()), state)
}

/// Registration body for `email`/`password` with valid profile fields.
#[allow(dead_code)]
pub fn registration(email: &str, password: &str) -> Value {
    json!({
        "email": email,
        "password": password,
        "firstName": "Ada",
        "lastName": "Lovelace",
        "dob": "1990-12-10",
        "gender": "female",
        "height": 168.0,
        "weight": 58.5
    })
}

/// Build a request with an optional JSON body and optional Cookie header.
#[allow(dead_code)]
pub fn request(method: &str, uri: &str, body: Option<&Value>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[allow(dead_code)]
pub async fn send(app: &axum::Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

/// Value of cookie `name` as set on `response`.
#[allow(dead_code)]
pub fn cookie_value(response: &Response, name: &str) -> String {
    let header = find_cookie(&set_cookie_headers(response), name);
    header
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, value)| value.to_string())
        .unwrap()
}

/// Tokens of a freshly started session.
#[allow(dead_code)]
pub struct TestSession {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[allow(dead_code)]
impl TestSession {
    pub fn access_cookie(&self) -> String {
        format!("token={}", self.access_token)
    }

    pub fn refresh_cookie(&self) -> String {
        format!("refreshToken={}", self.refresh_token)
    }
}

/// Register `email` and return the session it started.
#[allow(dead_code)]
pub async fn register(app: &axum::Router, email: &str, password: &str) -> TestSession {
    let body = registration(email, password);
    let response = send(app, request("POST", "/register", Some(&body), None)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let access_token = cookie_value(&response, "token");
    let refresh_token = cookie_value(&response, "refreshToken");
    let json = body_json(response).await;

    TestSession {
        user_id: json["user"]["id"].as_str().unwrap().to_string(),
        access_token,
        refresh_token,
    }
}
