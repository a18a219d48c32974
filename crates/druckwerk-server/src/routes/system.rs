// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Liveness and readiness probes.

use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use crate::state::AppState;

pub async fn healthz() -> &'static str {
    "ok"
}

/// Ready only when both stores answer a trivial query.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, &'static str) {
    let users_ok = state
        .users
        .lock()
        .expect("user store lock poisoned")
        .ping()
        .is_ok();
    let jobs_ok = state
        .jobs
        .lock()
        .expect("job store lock poisoned")
        .ping()
        .is_ok();

    if users_ok && jobs_ok {
        (StatusCode::OK, "ready")
    } else {
        warn!(users_ok, jobs_ok, "readiness probe failed");
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}
