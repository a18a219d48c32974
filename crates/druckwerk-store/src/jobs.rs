// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persistent print job store backed by SQLite.
//
// The store holds job metadata only; document payloads live on disk under the
// upload directory and are referenced by path and SHA-256 hash.  Status
// transitions out of `queued` are guarded in SQL (`WHERE status = 'queued'`)
// so a job leaves `queued` at most once, even when completion signals race.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, instrument};

use druckwerk_core::error::{DruckwerkError, Result};
use druckwerk_core::types::{JobId, JobStatus, PrintJob, UserId};

use crate::db_err;

/// SQLite schema for the jobs table.
const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS jobs (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL,
        filename TEXT NOT NULL,
        status TEXT NOT NULL,
        error TEXT,
        backend_job_id TEXT,
        document_path TEXT NOT NULL,
        document_hash TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_jobs_owner ON jobs(owner_id);
"#;

/// Persistent job store backed by a SQLite database.
///
/// All methods are synchronous because `rusqlite` does not support async
/// natively.  In an async context, share behind `Arc<Mutex<>>` — every
/// operation is a single fast statement.
pub struct JobStore {
    conn: Connection,
}

impl JobStore {
    /// Open (or create) the job database at the given path.
    ///
    /// Applies WAL journal mode for better concurrent-read performance and
    /// creates the `jobs` table if it does not exist.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(db_err)?;

        // WAL mode is better for concurrent readers (request handlers +
        // detached completion tasks) and survives unclean shutdowns more
        // gracefully.
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err)?;

        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;

        info!("job database opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;

        debug!("in-memory job database opened");
        Ok(Self { conn })
    }

    /// Insert a new job.
    ///
    /// The job's `id`, `created_at`, and `updated_at` fields must already be
    /// populated (they are set by `PrintJob::new`).
    #[instrument(skip(self, job), fields(job_id = %job.id, owner = %job.owner_id))]
    pub fn insert_job(&self, job: &PrintJob) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO jobs (id, owner_id, filename, status, error, backend_job_id,
                 document_path, document_hash, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    job.id.to_string(),
                    job.owner_id.to_string(),
                    job.filename,
                    job.status.as_str(),
                    job.error,
                    job.backend_job_id,
                    job.document_path.to_string_lossy(),
                    job.document_hash,
                    job.created_at.to_rfc3339(),
                    job.updated_at.to_rfc3339(),
                ],
            )
            .map_err(db_err)?;

        info!(job_id = %job.id, "job inserted");
        Ok(())
    }

    /// Retrieve a single job by its ID, regardless of owner.
    ///
    /// For client-facing lookups use [`get_job_for_owner`](Self::get_job_for_owner),
    /// which enforces the visibility rule.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub fn get_job(&self, job_id: &JobId) -> Result<Option<PrintJob>> {
        self.conn
            .query_row(
                "SELECT id, owner_id, filename, status, error, backend_job_id,
                        document_path, document_hash, created_at, updated_at
                 FROM jobs WHERE id = ?1",
                params![job_id.to_string()],
                row_to_print_job,
            )
            .optional()
            .map_err(db_err)
    }

    /// Retrieve a job only if it belongs to `owner_id`.
    ///
    /// Returns `None` both for jobs that do not exist and for jobs owned by
    /// someone else — callers cannot distinguish the two cases.
    #[instrument(skip(self), fields(job_id = %job_id, owner = %owner_id))]
    pub fn get_job_for_owner(&self, job_id: &JobId, owner_id: &UserId) -> Result<Option<PrintJob>> {
        self.conn
            .query_row(
                "SELECT id, owner_id, filename, status, error, backend_job_id,
                        document_path, document_hash, created_at, updated_at
                 FROM jobs WHERE id = ?1 AND owner_id = ?2",
                params![job_id.to_string(), owner_id.to_string()],
                row_to_print_job,
            )
            .optional()
            .map_err(db_err)
    }

    /// Atomically move a job out of `queued`.
    ///
    /// Returns `Ok(true)` if this call performed the transition, `Ok(false)`
    /// if the job had already left `queued` (or does not exist) — duplicate
    /// completion signals are no-ops.  `updated_at` is refreshed as part of
    /// the same statement.
    #[instrument(skip(self), fields(job_id = %job_id, to = %status))]
    pub fn transition_from_queued(
        &self,
        job_id: &JobId,
        status: JobStatus,
        error: Option<&str>,
        backend_job_id: Option<&str>,
    ) -> Result<bool> {
        if status == JobStatus::Queued {
            return Err(DruckwerkError::Database(
                "queued is not a transition target".into(),
            ));
        }

        let now = Utc::now().to_rfc3339();
        let rows = self
            .conn
            .execute(
                "UPDATE jobs SET status = ?1, error = ?2, backend_job_id = ?3, updated_at = ?4
                 WHERE id = ?5 AND status = 'queued'",
                params![status.as_str(), error, backend_job_id, now, job_id.to_string()],
            )
            .map_err(db_err)?;

        if rows == 0 {
            debug!(job_id = %job_id, "transition skipped — job already left queued");
            return Ok(false);
        }

        info!(job_id = %job_id, status = %status, "job transitioned");
        Ok(true)
    }

    /// Storage reachability probe for the readiness endpoint.
    pub fn ping(&self) -> Result<()> {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(db_err)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Map a SQLite row to a `PrintJob`.
///
/// Column indices must match the SELECT order used in the query methods above.
fn row_to_print_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<PrintJob> {
    let id_str: String = row.get(0)?;
    let owner_str: String = row.get(1)?;
    let filename: String = row.get(2)?;
    let status_str: String = row.get(3)?;
    let error: Option<String> = row.get(4)?;
    let backend_job_id: Option<String> = row.get(5)?;
    let document_path: String = row.get(6)?;
    let document_hash: String = row.get(7)?;
    let created_at_str: String = row.get(8)?;
    let updated_at_str: String = row.get(9)?;

    let id = uuid::Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let owner_id = uuid::Uuid::parse_str(&owner_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let status: JobStatus = status_str.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        )
    })?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&updated_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(PrintJob {
        id: JobId(id),
        owner_id: UserId(owner_id),
        filename,
        status,
        error,
        backend_job_id,
        document_path: document_path.into(),
        document_hash,
        created_at,
        updated_at,
    })
}
