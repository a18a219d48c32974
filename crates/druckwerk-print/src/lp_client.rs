// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Invocation of the external print client (`lp` or compatible).
//
// The client is a black box speaking whatever protocol the system print
// stack provides.  We hand it a file path and a target, capture everything
// it writes, and enforce a hard timeout so a wedged client can never pin a
// job in `queued`.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, instrument};

use druckwerk_core::error::{DruckwerkError, Result};

/// How the print client addresses the printer.
#[derive(Debug, Clone)]
pub enum PrinterTarget {
    /// A named queue known to the local print system (`lp -d NAME`).
    Queue(String),
    /// A direct printer URI (`lp -o printer-uri-supported=URI`).
    Uri(String),
}

impl PrinterTarget {
    /// Argument list for one invocation against `document_path`.
    fn argv(&self, document_path: &Path) -> Vec<std::ffi::OsString> {
        let mut args: Vec<std::ffi::OsString> = match self {
            Self::Queue(name) => vec!["-d".into(), name.into()],
            Self::Uri(uri) => vec!["-o".into(), format!("printer-uri-supported={uri}").into()],
        };
        args.push(document_path.into());
        args
    }
}

/// Run the print client once against a document.
///
/// Returns the client's combined stdout+stderr on a zero exit.  Every fault
/// — spawn failure, non-zero exit, timeout — comes back as a `Dispatch`
/// error carrying whatever the client said.
#[instrument(skip_all, fields(program, path = %document_path.display()))]
pub async fn run_print_client(
    program: &str,
    target: &PrinterTarget,
    document_path: &Path,
    time_limit: Duration,
) -> Result<String> {
    let mut cmd = Command::new(program);
    cmd.args(target.argv(document_path))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(?target, "invoking print client");

    let output = timeout(time_limit, cmd.output()).await.map_err(|_| {
        DruckwerkError::Dispatch(format!(
            "{program} timed out after {}s",
            time_limit.as_secs_f64()
        ))
    })?;

    let output = output
        .map_err(|e| DruckwerkError::Dispatch(format!("failed to run {program}: {e}")))?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        return Err(DruckwerkError::Dispatch(format!(
            "{program} failed: {}",
            combined.trim()
        )));
    }

    info!("print client accepted the document");
    Ok(combined)
}

/// Recover the client-assigned job identifier from its textual output.
///
/// Policy: the last whitespace-delimited token that contains a `-` and whose
/// part after the final `-` is all digits.  `lp` prints e.g.
/// `request id is office-42 (1 file(s))`, where `office-42` is the id.
///
/// This heuristic is a placeholder contract until a structured client
/// response is available; callers must treat `None` as "accepted, id
/// unknown", not as a failure.
pub fn parse_client_job_id(output: &str) -> Option<String> {
    let mut found = None;
    for token in output.split_whitespace() {
        if let Some((_, tail)) = token.rsplit_once('-')
            && !tail.is_empty()
            && tail.bytes().all(|b| b.is_ascii_digit())
        {
            found = Some(token.to_string());
        }
    }
    found
}
