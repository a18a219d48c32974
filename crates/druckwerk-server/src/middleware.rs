// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bearer-token middleware.  Validates the token and hands the resolved
// identity to handlers via a request extension; everything behind this layer
// trusts `AuthUser` completely.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use druckwerk_core::DruckwerkError;
use druckwerk_core::types::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller, as established by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub username: String,
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())
        .ok_or_else(|| DruckwerkError::Auth("missing bearer token".into()))?;

    let claims = state.tokens.validate(token)?;
    let user = AuthUser {
        id: claims.user_id()?,
        username: claims.username,
    };

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let token = header.to_str().ok()?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}
