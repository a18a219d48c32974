// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckwerk Store — durable records for users and print jobs, backed by
// SQLite.  Job state transitions are single atomic UPDATE statements so that
// concurrent readers only ever observe the pre- or post-transition row.

pub mod jobs;
pub mod users;

pub use jobs::JobStore;
pub use users::UserStore;

/// Convert a `rusqlite::Error` into a `DruckwerkError::Database`.
pub(crate) fn db_err(e: rusqlite::Error) -> druckwerk_core::DruckwerkError {
    druckwerk_core::DruckwerkError::Database(e.to_string())
}
