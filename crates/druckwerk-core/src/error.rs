// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Druckwerk.

use thiserror::Error;

/// Top-level error type for all Druckwerk operations.
#[derive(Debug, Error)]
pub enum DruckwerkError {
    // -- Request errors --
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Auth(String),

    /// Job absent, or owned by someone else. Deliberately indistinguishable
    /// from "never existed".
    #[error("not found")]
    NotFound,

    // -- Dispatch errors --
    #[error("backend configuration error: {0}")]
    Configuration(String),

    #[error("dispatch failed: {0}")]
    Dispatch(String),

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DruckwerkError>;
