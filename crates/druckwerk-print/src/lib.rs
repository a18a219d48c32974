// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckwerk Print — the job lifecycle core.  This crate owns the dispatch
// backend abstraction (simulated completion vs. the external print client),
// the bounded invocation of that client, and the lifecycle manager that
// drives every job from `queued` to its terminal state.

pub mod backend;
pub mod lifecycle;
pub mod lp_client;

pub use backend::{Backend, DispatchOutcome, ProtocolBackend, SimulatedBackend};
pub use lifecycle::LifecycleManager;
pub use lp_client::PrinterTarget;
