// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print submission and status polling.

use axum::Json;
use axum::extract::{Extension, Multipart, Path, State};
use serde_json::{Value, json};
use tracing::info;

use druckwerk_core::DruckwerkError;
use druckwerk_core::types::{JobId, JobView};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;
use crate::upload::{sanitize_filename, store_upload};

/// `POST /api/print` — accept a multipart upload and create a job.
///
/// Responds as soon as the job row exists and dispatch has been applied;
/// anything that fails after acceptance is visible only through polling.
pub async fn submit_print(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| DruckwerkError::Validation("malformed multipart body".into()))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| DruckwerkError::Validation("failed to read file field".into()))?;
            upload = Some((filename, bytes));
        }
    }

    let Some((filename, bytes)) = upload else {
        return Err(DruckwerkError::Validation("file is required".into()).into());
    };
    if filename.is_empty() {
        return Err(DruckwerkError::Validation("empty filename".into()).into());
    }

    let filename = sanitize_filename(&filename);
    let (document_path, document_hash) = store_upload(&state.upload_dir, &filename, &bytes)?;

    let job_id = state
        .manager
        .submit(user.id, &filename, document_path, document_hash)
        .await?;

    info!(job_id = %job_id, user = %user.id, "print job submitted");
    Ok(Json(json!({ "job_id": job_id })))
}

/// `GET /api/jobs/{id}` — owner-scoped status poll.
///
/// A malformed id, a missing job, and another user's job are all the same
/// 404 from the caller's point of view.
pub async fn job_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<JobView>, ApiError> {
    let job_id = id
        .parse::<uuid::Uuid>()
        .map(JobId)
        .map_err(|_| DruckwerkError::NotFound)?;

    let job = state
        .manager
        .status(&user.id, &job_id)?
        .ok_or(DruckwerkError::NotFound)?;

    Ok(Json(JobView::from(job)))
}
