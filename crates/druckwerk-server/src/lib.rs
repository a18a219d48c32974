// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckwerk Server — the HTTP surface.  Routing, bearer auth, upload
// persistence, and the JSON error mapping live here; everything with real
// behavior is delegated to the lifecycle manager in `druckwerk-print`.

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod upload;

pub use state::AppState;

/// Assemble the full application router.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/me", get(routes::auth::me))
        .route("/api/print", post(routes::jobs::submit_print))
        .route("/api/jobs/:id", get(routes::jobs::job_status))
        .route_layer(from_fn_with_state(state.clone(), middleware::auth_middleware));

    Router::new()
        .route("/api/register", post(routes::auth::register))
        .route("/api/login", post(routes::auth::login))
        .route("/healthz", get(routes::system::healthz))
        .route("/readyz", get(routes::system::readyz))
        .merge(protected)
        .with_state(state)
}
