// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared application state.
//
// The rusqlite stores are `Send` but not `Sync`, so they sit behind
// `Arc<Mutex<>>`; contention is minimal because every operation is one fast
// statement.  The lifecycle manager shares the same job store handle, so the
// readiness probe and the manager observe the same database.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::info;

use druckwerk_auth::TokenService;
use druckwerk_core::AppConfig;
use druckwerk_core::error::Result;
use druckwerk_print::{Backend, LifecycleManager};
use druckwerk_store::{JobStore, UserStore};

/// Everything a request handler needs, cheaply cloneable.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<Mutex<UserStore>>,
    pub jobs: Arc<Mutex<JobStore>>,
    pub manager: LifecycleManager,
    pub tokens: TokenService,
    pub upload_dir: PathBuf,
}

impl AppState {
    /// Wire up state from already-open stores and a selected backend.
    pub fn new(users: UserStore, jobs: JobStore, backend: Backend, config: &AppConfig) -> Self {
        let jobs = Arc::new(Mutex::new(jobs));
        Self {
            users: Arc::new(Mutex::new(users)),
            manager: LifecycleManager::new(jobs.clone(), backend),
            jobs,
            tokens: TokenService::new(&config.secret_key, config.token_ttl_minutes),
            upload_dir: config.upload_dir.clone(),
        }
    }

    /// Initialise all services from configuration.  Called once at startup.
    ///
    /// Creates the data and upload directories, opens the SQLite databases,
    /// and selects the dispatch backend.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        std::fs::create_dir_all(&config.upload_dir)?;

        let users = UserStore::open(config.data_dir.join("users.db"))?;
        let jobs = JobStore::open(config.data_dir.join("jobs.db"))?;
        let backend = Backend::from_config(config);

        info!(
            data_dir = %config.data_dir.display(),
            protocol_backend = config.enable_protocol_backend,
            "app state initialised"
        );

        Ok(Self::new(users, jobs, backend, config))
    }
}
