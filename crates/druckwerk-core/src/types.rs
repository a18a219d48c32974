// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Druckwerk print job server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier for a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle states of a print job.
///
/// `Queued` is the only initial state. `Completed` and `Failed` are terminal;
/// no transition ever leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, waiting for dispatch to take effect.
    Queued,
    /// Handed to the print client; the printer owns it now.
    Printing,
    /// Finished successfully.
    Completed,
    /// Dispatch failed — see the job's error field.
    Failed,
}

impl JobStatus {
    /// Stable lowercase name, used both on the wire and in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Printing => "printing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether no further transition can leave this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "printing" => Ok(Self::Printing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown job status '{other}'")),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered user. Created once at registration, immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Opaque password hash (PBKDF2 format string). Never serialized to
    /// clients — strip via `UserView`.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: UserId::new(),
            username,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// A complete print job as tracked by the lifecycle manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintJob {
    pub id: JobId,
    /// Owning user. Never changes; all status lookups are scoped to it.
    pub owner_id: UserId,
    /// Display label — the client-supplied name, sanitized.
    pub filename: String,
    pub status: JobStatus,
    /// Diagnostic message. Non-empty iff `status == Failed`.
    pub error: Option<String>,
    /// Identifier assigned by the external print client, when it reported one.
    pub backend_job_id: Option<String>,
    /// Stable readable path of the persisted upload.
    pub document_path: PathBuf,
    /// SHA-256 hex digest of the uploaded bytes.
    pub document_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrintJob {
    /// Create a new job in `Queued` state.
    pub fn new(
        owner_id: UserId,
        filename: String,
        document_path: PathBuf,
        document_hash: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            owner_id,
            filename,
            status: JobStatus::Queued,
            error: None,
            backend_job_id: None,
            document_path,
            document_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Client-facing projection of a job, as returned by the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobView {
    pub id: JobId,
    pub filename: String,
    pub status: JobStatus,
    pub error: Option<String>,
    pub backend_job_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PrintJob> for JobView {
    fn from(job: PrintJob) -> Self {
        Self {
            id: job.id,
            filename: job.filename,
            status: job.status,
            error: job.error,
            backend_job_id: job.backend_job_id,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}
