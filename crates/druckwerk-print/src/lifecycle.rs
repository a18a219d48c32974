// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job lifecycle manager.
//
// Drives every job through the state machine
//
//     queued -> printing | failed      (protocol backend, synchronous)
//     queued -> completed              (simulated backend, delayed task)
//
// `completed` and `failed` are terminal.  The transition out of `queued` is
// applied as one atomic store update keyed on the current status, so a job
// leaves `queued` at most once no matter how completion signals race.  The
// external client result is computed first and applied afterwards — no store
// lock is held across the client invocation.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, error, info, instrument};

use druckwerk_core::error::Result;
use druckwerk_core::types::{JobId, JobStatus, PrintJob, UserId};
use druckwerk_store::JobStore;

use crate::backend::{Backend, DispatchOutcome};

/// Orchestrates job creation, dispatch, and status queries.
///
/// Cheaply cloneable; the store is `Send` but not `Sync` (rusqlite), so it is
/// shared behind `Arc<Mutex<>>`.  Contention is minimal — every store
/// operation is one sub-millisecond statement.
#[derive(Clone)]
pub struct LifecycleManager {
    jobs: Arc<Mutex<JobStore>>,
    backend: Arc<Backend>,
}

impl LifecycleManager {
    pub fn new(jobs: Arc<Mutex<JobStore>>, backend: Backend) -> Self {
        Self {
            jobs,
            backend: Arc::new(backend),
        }
    }

    /// Create a job and dispatch it.
    ///
    /// Always returns the job id for valid input; anything that can fail
    /// after acceptance (client faults, missing printer target) is recorded
    /// on the job row and surfaces only through status polling.  Storage
    /// faults do propagate — acceptance without a durable row would be a lie.
    #[instrument(skip_all, fields(owner = %owner_id, filename = %filename))]
    pub async fn submit(
        &self,
        owner_id: UserId,
        filename: &str,
        document_path: PathBuf,
        document_hash: String,
    ) -> Result<JobId> {
        let job = PrintJob::new(owner_id, filename.to_string(), document_path, document_hash);
        let job_id = job.id;

        {
            let store = self.jobs.lock().expect("job store lock poisoned");
            store.insert_job(&job)?;
        }
        info!(job_id = %job_id, "job accepted");

        let outcome = self.backend.dispatch(&job).await;
        match outcome {
            DispatchOutcome::AcceptedPending => {
                if let Backend::Simulated(sim) = self.backend.as_ref() {
                    self.schedule_simulated_completion(job_id, sim.delay());
                }
            }
            DispatchOutcome::Printing { backend_job_id } => {
                self.apply_transition(
                    &job_id,
                    JobStatus::Printing,
                    None,
                    backend_job_id.as_deref(),
                )?;
            }
            DispatchOutcome::Failed { error } => {
                self.apply_transition(&job_id, JobStatus::Failed, Some(error.as_str()), None)?;
            }
        }

        Ok(job_id)
    }

    /// Owner-scoped status lookup.
    ///
    /// `None` covers both "no such job" and "someone else's job"; callers
    /// must not be able to tell the difference.
    pub fn status(&self, owner_id: &UserId, job_id: &JobId) -> Result<Option<PrintJob>> {
        let store = self.jobs.lock().expect("job store lock poisoned");
        store.get_job_for_owner(job_id, owner_id)
    }

    /// Apply the simulated backend's delayed completion.
    ///
    /// Returns whether this call performed the transition; a duplicate
    /// signal finds the job already out of `queued` and is a no-op.
    pub fn complete_simulated(&self, job_id: &JobId) -> Result<bool> {
        let store = self.jobs.lock().expect("job store lock poisoned");
        store.transition_from_queued(job_id, JobStatus::Completed, None, None)
    }

    /// Detached completion task for the simulated backend.
    ///
    /// Fire-and-forget: the HTTP response and this task are deliberately
    /// unordered, and the sleep is not cancellable.
    fn schedule_simulated_completion(&self, job_id: JobId, delay: Duration) {
        let manager = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match manager.complete_simulated(&job_id) {
                Ok(true) => debug!(job_id = %job_id, "simulated completion applied"),
                Ok(false) => debug!(job_id = %job_id, "simulated completion was a no-op"),
                Err(e) => error!(job_id = %job_id, "simulated completion failed: {e}"),
            }
        });
    }

    fn apply_transition(
        &self,
        job_id: &JobId,
        status: JobStatus,
        error: Option<&str>,
        backend_job_id: Option<&str>,
    ) -> Result<()> {
        let applied = {
            let store = self.jobs.lock().expect("job store lock poisoned");
            store.transition_from_queued(job_id, status, error, backend_job_id)?
        };
        if !applied {
            debug!(job_id = %job_id, "dispatch outcome arrived after the job left queued");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ProtocolBackend, SimulatedBackend};
    use crate::lp_client::PrinterTarget;
    use std::path::Path;

    fn manager_with(backend: Backend) -> LifecycleManager {
        let store = JobStore::open_in_memory().expect("open in-memory db");
        LifecycleManager::new(Arc::new(Mutex::new(store)), backend)
    }

    fn simulated(delay_ms: u64) -> Backend {
        Backend::Simulated(SimulatedBackend::new(Duration::from_millis(delay_ms)))
    }

    /// Write an executable stub standing in for `lp`.
    #[cfg(unix)]
    fn stub_client(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("stub-lp.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write stub");
        let mut perms = std::fs::metadata(&path).expect("stat stub").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("chmod stub");
        path.to_string_lossy().into_owned()
    }

    fn protocol(program: &str, timeout_ms: u64) -> Backend {
        Backend::Protocol(ProtocolBackend::new(
            program,
            Some(PrinterTarget::Queue("office".into())),
            Duration::from_millis(timeout_ms),
        ))
    }

    async fn submit_test_job(manager: &LifecycleManager, owner: UserId) -> JobId {
        manager
            .submit(
                owner,
                "report.pdf",
                PathBuf::from("/tmp/uploads/1700000000_report.pdf"),
                "abc123".into(),
            )
            .await
            .expect("submit")
    }

    #[tokio::test]
    async fn simulated_job_is_queued_then_completes() {
        let manager = manager_with(simulated(50));
        let owner = UserId::new();
        let job_id = submit_test_job(&manager, owner).await;

        let job = manager
            .status(&owner, &job_id)
            .expect("status")
            .expect("visible");
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.error.is_none());

        tokio::time::sleep(Duration::from_millis(400)).await;

        let job = manager
            .status(&owner, &job_id)
            .expect("status")
            .expect("visible");
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.error.is_none());
    }

    #[tokio::test]
    async fn duplicate_completion_signal_is_a_noop() {
        // Long delay keeps the scheduled task out of the way.
        let manager = manager_with(simulated(60_000));
        let owner = UserId::new();
        let job_id = submit_test_job(&manager, owner).await;

        assert!(manager.complete_simulated(&job_id).expect("first"));
        assert!(!manager.complete_simulated(&job_id).expect("second"));

        let job = manager
            .status(&owner, &job_id)
            .expect("status")
            .expect("visible");
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn status_is_owner_scoped() {
        let manager = manager_with(simulated(60_000));
        let owner = UserId::new();
        let job_id = submit_test_job(&manager, owner).await;

        let stranger = UserId::new();
        assert!(manager.status(&stranger, &job_id).expect("status").is_none());
    }

    #[tokio::test]
    async fn protocol_without_target_fails_after_acceptance() {
        let backend = Backend::Protocol(ProtocolBackend::new(
            "lp",
            None,
            Duration::from_secs(5),
        ));
        let manager = manager_with(backend);
        let owner = UserId::new();

        // submit still succeeds — the failure is recorded on the job.
        let job_id = submit_test_job(&manager, owner).await;

        let job = manager
            .status(&owner, &job_id)
            .expect("status")
            .expect("visible");
        assert_eq!(job.status, JobStatus::Failed);
        let error = job.error.expect("error recorded");
        assert!(error.contains("configured"), "unexpected error: {error}");
        assert!(job.backend_job_id.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn protocol_success_moves_job_to_printing_with_backend_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let program = stub_client(dir.path(), "echo 'request id is office-42 (1 file(s))'");
        let manager = manager_with(protocol(&program, 5_000));
        let owner = UserId::new();

        let job_id = submit_test_job(&manager, owner).await;

        let job = manager
            .status(&owner, &job_id)
            .expect("status")
            .expect("visible");
        assert_eq!(job.status, JobStatus::Printing);
        assert_eq!(job.backend_job_id.as_deref(), Some("office-42"));
        assert!(job.error.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn protocol_success_without_id_still_prints() {
        let dir = tempfile::tempdir().expect("tempdir");
        let program = stub_client(dir.path(), "echo accepted");
        let manager = manager_with(protocol(&program, 5_000));
        let owner = UserId::new();

        let job_id = submit_test_job(&manager, owner).await;

        let job = manager
            .status(&owner, &job_id)
            .expect("status")
            .expect("visible");
        assert_eq!(job.status, JobStatus::Printing);
        assert!(job.backend_job_id.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn protocol_nonzero_exit_fails_with_captured_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let program = stub_client(dir.path(), "echo printer on fire >&2\nexit 3");
        let manager = manager_with(protocol(&program, 5_000));
        let owner = UserId::new();

        let job_id = submit_test_job(&manager, owner).await;

        let job = manager
            .status(&owner, &job_id)
            .expect("status")
            .expect("visible");
        assert_eq!(job.status, JobStatus::Failed);
        let error = job.error.expect("error recorded");
        assert!(error.contains("printer on fire"), "unexpected error: {error}");
        assert!(job.backend_job_id.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn protocol_timeout_fails_within_bounded_time() {
        let dir = tempfile::tempdir().expect("tempdir");
        let program = stub_client(dir.path(), "sleep 30");
        let manager = manager_with(protocol(&program, 300));
        let owner = UserId::new();

        let started = std::time::Instant::now();
        let job_id = submit_test_job(&manager, owner).await;
        assert!(started.elapsed() < Duration::from_secs(5));

        let job = manager
            .status(&owner, &job_id)
            .expect("status")
            .expect("visible");
        assert_eq!(job.status, JobStatus::Failed);
        let error = job.error.expect("error recorded");
        assert!(error.contains("timed out"), "unexpected error: {error}");
    }

    #[tokio::test]
    async fn spawn_failure_fails_the_job() {
        let manager = manager_with(protocol("/nonexistent/druckwerk-lp", 1_000));
        let owner = UserId::new();

        let job_id = submit_test_job(&manager, owner).await;

        let job = manager
            .status(&owner, &job_id)
            .expect("status")
            .expect("visible");
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error.is_some());
    }
}
