// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Upload persistence.  Uploaded documents are written under the configured
// upload directory with a timestamp-prefixed sanitized name, and their
// SHA-256 hash is recorded on the job.

use std::path::{Path, PathBuf};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::debug;

use druckwerk_core::error::Result;

/// Reduce a client-supplied filename to a safe single path component.
///
/// Keeps ASCII alphanumerics, `.`, `-`, and `_`; everything else becomes
/// `_`.  Path separators are stripped by taking only the final component,
/// and leading dots are dropped so the result is never hidden or a
/// traversal.  An empty result falls back to `"upload"`.
pub fn sanitize_filename(raw: &str) -> String {
    let last_component = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(raw);

    let cleaned: String = last_component
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Persist an upload and return its stable path plus SHA-256 hex digest.
///
/// The timestamp prefix keeps distinct uploads of the same filename apart;
/// same-second collisions overwrite (last write wins), which is acceptable
/// because jobs reference the path, not the name.
pub fn store_upload(upload_dir: &Path, filename: &str, bytes: &[u8]) -> Result<(PathBuf, String)> {
    std::fs::create_dir_all(upload_dir)?;

    let stored_name = format!("{}_{}", Utc::now().timestamp(), filename);
    let path = upload_dir.join(stored_name);
    std::fs::write(&path, bytes)?;

    let hash = hex::encode(Sha256::digest(bytes));
    debug!(path = %path.display(), %hash, size = bytes.len(), "upload persisted");

    Ok((path, hash))
}
