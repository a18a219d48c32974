// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Registration, login, and identity echo.

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use druckwerk_auth::{hash_password, verify_password};
use druckwerk_core::DruckwerkError;
use druckwerk_core::types::User;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if creds.username.is_empty() || creds.password.is_empty() {
        return Err(DruckwerkError::Validation("username and password required".into()).into());
    }

    // Hash before taking the store lock — PBKDF2 is deliberately slow.
    let password_hash = hash_password(&creds.password)?;
    let user = User::new(creds.username.clone(), password_hash);

    {
        let users = state.users.lock().expect("user store lock poisoned");
        if users.find_by_username(&creds.username)?.is_some() {
            return Err(DruckwerkError::Validation("user exists".into()).into());
        }
        users.create_user(&user)?;
    }

    info!(username = %creds.username, "user registered");
    Ok((StatusCode::CREATED, Json(json!({ "message": "registered" }))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> Result<Json<Value>, ApiError> {
    let user = {
        let users = state.users.lock().expect("user store lock poisoned");
        users.find_by_username(&creds.username)?
    };

    // One rejection path for unknown user and wrong password alike.
    let user = match user {
        Some(u) if verify_password(&creds.password, &u.password_hash) => u,
        _ => return Err(DruckwerkError::Auth("invalid credentials".into()).into()),
    };

    let token = state.tokens.issue(user.id, &user.username)?;
    Ok(Json(json!({ "token": token })))
}

pub async fn me(Extension(user): Extension<AuthUser>) -> Json<Value> {
    Json(json!({ "id": user.id, "username": user.username }))
}
