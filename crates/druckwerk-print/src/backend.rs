// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dispatch backends — where a queued job actually goes.
//
// The backend is picked once, at configuration load, and injected into the
// lifecycle manager; per-job code never re-reads configuration.

use std::time::Duration;

use tracing::{debug, warn};

use druckwerk_core::AppConfig;
use druckwerk_core::types::PrintJob;

use crate::lp_client::{self, PrinterTarget};

/// Result of handing a job to a backend.
///
/// `dispatch` never errors across this boundary — every fault is folded into
/// `Failed` so the caller has exactly three cases to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Accepted; completion will be signalled asynchronously.
    AcceptedPending,
    /// The print client took the document; the job is now printing.
    Printing { backend_job_id: Option<String> },
    /// The job cannot proceed.
    Failed { error: String },
}

/// Backend that completes every job after a fixed delay, without touching
/// any printer.  The delayed completion is fire-and-forget and not
/// cancellable — acceptable for a stand-in dispatch path, not production
/// behavior.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    delay: Duration,
}

impl SimulatedBackend {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// How long after acceptance the completion fires.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Backend that invokes the external print client.
#[derive(Debug, Clone)]
pub struct ProtocolBackend {
    /// Client program name.  `lp` in production; tests substitute a script.
    program: String,
    /// Where to send the job.  `None` means the backend was enabled without
    /// a printer target, which fails every dispatch.
    target: Option<PrinterTarget>,
    /// Hard per-invocation timeout.
    time_limit: Duration,
}

impl ProtocolBackend {
    pub fn new(
        program: impl Into<String>,
        target: Option<PrinterTarget>,
        time_limit: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            target,
            time_limit,
        }
    }

    async fn dispatch(&self, job: &PrintJob) -> DispatchOutcome {
        let Some(target) = &self.target else {
            return DispatchOutcome::Failed {
                error: "no PRINTER_URI or PRINTER_NAME configured".into(),
            };
        };

        match lp_client::run_print_client(&self.program, target, &job.document_path, self.time_limit)
            .await
        {
            Ok(output) => DispatchOutcome::Printing {
                backend_job_id: lp_client::parse_client_job_id(&output),
            },
            Err(e) => {
                warn!(job_id = %job.id, "print client dispatch failed: {e}");
                DispatchOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

/// The configured dispatch backend.
#[derive(Debug, Clone)]
pub enum Backend {
    Simulated(SimulatedBackend),
    Protocol(ProtocolBackend),
}

impl Backend {
    /// Select the backend from configuration.  Called once at startup.
    ///
    /// The protocol backend is selected on the flag alone; a missing printer
    /// target is discovered per dispatch and recorded on the job, because it
    /// occurs after job acceptance.
    pub fn from_config(config: &AppConfig) -> Self {
        if config.enable_protocol_backend {
            let target = if !config.printer_name.is_empty() {
                Some(PrinterTarget::Queue(config.printer_name.clone()))
            } else if !config.printer_uri.is_empty() {
                Some(PrinterTarget::Uri(config.printer_uri.clone()))
            } else {
                None
            };
            Self::Protocol(ProtocolBackend::new(
                "lp",
                target,
                Duration::from_secs(config.dispatch_timeout_secs),
            ))
        } else {
            Self::Simulated(SimulatedBackend::new(Duration::from_millis(
                config.simulated_delay_ms,
            )))
        }
    }

    /// Hand a job to the backend.  Never errors; see [`DispatchOutcome`].
    pub async fn dispatch(&self, job: &PrintJob) -> DispatchOutcome {
        match self {
            Self::Simulated(_) => {
                debug!(job_id = %job.id, "simulated dispatch accepted");
                DispatchOutcome::AcceptedPending
            }
            Self::Protocol(protocol) => protocol.dispatch(job).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_selects_simulated() {
        let backend = Backend::from_config(&AppConfig::default());
        assert!(matches!(backend, Backend::Simulated(_)));
    }

    #[test]
    fn flag_selects_protocol_even_without_target() {
        let mut config = AppConfig::default();
        config.enable_protocol_backend = true;
        let backend = Backend::from_config(&config);
        assert!(matches!(backend, Backend::Protocol(_)));
    }

    #[test]
    fn printer_name_takes_precedence_over_uri() {
        let mut config = AppConfig::default();
        config.enable_protocol_backend = true;
        config.printer_name = "office".into();
        config.printer_uri = "ipp://10.0.0.9:631/ipp/print".into();

        let Backend::Protocol(protocol) = Backend::from_config(&config) else {
            panic!("expected protocol backend");
        };
        assert!(matches!(protocol.target, Some(PrinterTarget::Queue(ref n)) if n == "office"));
    }
}
