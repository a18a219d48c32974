// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end tests for the HTTP surface, driving the router directly via
// `tower::ServiceExt::oneshot` against in-memory stores and the simulated
// backend.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use druckwerk_core::AppConfig;
use druckwerk_print::{Backend, SimulatedBackend};
use druckwerk_server::{AppState, build_router};
use druckwerk_store::{JobStore, UserStore};

const BOUNDARY: &str = "X-DRUCKWERK-TEST-BOUNDARY";

fn test_app(upload_dir: &std::path::Path) -> Router {
    let mut config = AppConfig::default();
    config.secret_key = "test-secret".into();
    config.upload_dir = upload_dir.to_path_buf();

    let users = UserStore::open_in_memory().expect("open users");
    let jobs = JobStore::open_in_memory().expect("open jobs");
    let backend = Backend::Simulated(SimulatedBackend::new(Duration::from_millis(50)));

    build_router(AppState::new(users, jobs, backend, &config))
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    send(app, request).await
}

async fn send_authed(app: &Router, method: &str, uri: &str, token: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request");
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, value)
}

async fn register_and_login(app: &Router, username: &str) -> String {
    let creds = json!({ "username": username, "password": "hunter2" });
    let (status, _) = send_json(app, "POST", "/api/register", creds.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(app, "POST", "/api/login", creds).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().expect("token").to_string()
}

async fn submit_file(app: &Router, token: &str, filename: &str, content: &[u8]) -> (StatusCode, Value) {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/api/print")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request");
    send(app, request).await
}

#[tokio::test]
async fn health_probes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = test_app(dir.path());

    let (status, body) = send_authed(&app, "GET", "/healthz", "ignored").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));

    let (status, body) = send_authed(&app, "GET", "/readyz", "ignored").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ready".into()));
}

#[tokio::test]
async fn register_login_me_flow() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = test_app(dir.path());

    let token = register_and_login(&app, "alice").await;

    let (status, body) = send_authed(&app, "GET", "/api/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert!(body["id"].as_str().is_some());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = test_app(dir.path());

    let creds = json!({ "username": "alice", "password": "hunter2" });
    let (status, _) = send_json(&app, "POST", "/api/register", creds.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(&app, "POST", "/api/register", creds).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "user exists");
}

#[tokio::test]
async fn registration_requires_both_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = test_app(dir.path());

    let (status, _) =
        send_json(&app, "POST", "/api/register", json!({ "username": "alice" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = test_app(dir.path());

    register_and_login(&app, "alice").await;

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/login",
        json!({ "username": "alice", "password": "wrong" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_reject_bad_tokens() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = test_app(dir.path());

    let request = Request::builder()
        .method("GET")
        .uri("/api/me")
        .body(Body::empty())
        .expect("request");
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_authed(&app, "GET", "/api/me", "not.a.token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn print_flow_completes_via_simulated_backend() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = test_app(dir.path());
    let token = register_and_login(&app, "alice").await;

    let (status, body) = submit_file(&app, &token, "report.pdf", b"%PDF-1.4 test").await;
    assert_eq!(status, StatusCode::OK);
    let job_id = body["job_id"].as_str().expect("job_id").to_string();

    // Immediately observable, in `queued` (or already past it if the
    // completion task won the race).
    let (status, body) = send_authed(&app, "GET", &format!("/api/jobs/{job_id}"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(matches!(
        body["status"].as_str(),
        Some("queued") | Some("completed")
    ));

    tokio::time::sleep(Duration::from_millis(400)).await;

    let (status, body) = send_authed(&app, "GET", &format!("/api/jobs/{job_id}"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["error"], Value::Null);
    assert_eq!(body["filename"], "report.pdf");
}

#[tokio::test]
async fn print_requires_a_file_field() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = test_app(dir.path());
    let token = register_and_login(&app, "alice").await;

    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{BOUNDARY}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/print")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request");

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "file is required");
}

#[tokio::test]
async fn job_status_is_owner_scoped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = test_app(dir.path());

    let alice = register_and_login(&app, "alice").await;
    let bob = register_and_login(&app, "bob").await;

    let (_, body) = submit_file(&app, &alice, "secret.pdf", b"classified").await;
    let job_id = body["job_id"].as_str().expect("job_id").to_string();

    // Bob sees a plain 404 — indistinguishable from "never existed".
    let (status, body) = send_authed(&app, "GET", &format!("/api/jobs/{job_id}"), &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found");

    // Unknown and malformed ids look exactly the same.
    let (status, _) = send_authed(
        &app,
        "GET",
        &format!("/api/jobs/{}", uuid::Uuid::new_v4()),
        &bob,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_authed(&app, "GET", "/api/jobs/not-a-uuid", &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
