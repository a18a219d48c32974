// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration, sourced from the environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration.
///
/// Every field has a development-friendly default so the server runs with no
/// environment at all; deployments override via the named variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP server binds to (`BIND_ADDR`).
    pub bind_addr: String,
    /// Directory holding the SQLite databases (`DATA_DIR`).
    pub data_dir: PathBuf,
    /// Directory uploaded documents are persisted under (`UPLOAD_DIR`).
    pub upload_dir: PathBuf,
    /// Route jobs to the real print client instead of the simulated path
    /// (`ENABLE_PROTOCOL_BACKEND`).
    pub enable_protocol_backend: bool,
    /// Target printer URI for the protocol backend (`PRINTER_URI`).
    pub printer_uri: String,
    /// Target printer queue name for the protocol backend (`PRINTER_NAME`).
    /// Takes precedence over the URI when both are set.
    pub printer_name: String,
    /// Bearer token lifetime in minutes (`TOKEN_TTL_MINUTES`).
    pub token_ttl_minutes: i64,
    /// HMAC secret for token signing (`SECRET_KEY`).
    pub secret_key: String,
    /// Hard timeout for one print-client invocation, in seconds
    /// (`DISPATCH_TIMEOUT_SECS`).
    pub dispatch_timeout_secs: u64,
    /// Delay before the simulated backend completes a job, in milliseconds
    /// (`SIMULATED_DELAY_MS`).
    pub simulated_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            data_dir: PathBuf::from("./data"),
            upload_dir: PathBuf::from("./data/uploads"),
            enable_protocol_backend: false,
            printer_uri: String::new(),
            printer_name: String::new(),
            token_ttl_minutes: 240,
            secret_key: "devsecret_change_me".into(),
            dispatch_timeout_secs: 60,
            simulated_delay_ms: 2000,
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment, falling back to defaults for
    /// anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env_string("BIND_ADDR", defaults.bind_addr),
            data_dir: env_path("DATA_DIR", defaults.data_dir),
            upload_dir: env_path("UPLOAD_DIR", defaults.upload_dir),
            enable_protocol_backend: env_bool("ENABLE_PROTOCOL_BACKEND", false),
            printer_uri: env_string("PRINTER_URI", defaults.printer_uri),
            printer_name: env_string("PRINTER_NAME", defaults.printer_name),
            token_ttl_minutes: env_parse("TOKEN_TTL_MINUTES", defaults.token_ttl_minutes),
            secret_key: env_string("SECRET_KEY", defaults.secret_key),
            dispatch_timeout_secs: env_parse("DISPATCH_TIMEOUT_SECS", defaults.dispatch_timeout_secs),
            simulated_delay_ms: env_parse("SIMULATED_DELAY_MS", defaults.simulated_delay_ms),
        }
    }

    /// Whether the protocol backend has at least one dispatch target.
    pub fn has_printer_target(&self) -> bool {
        !self.printer_name.is_empty() || !self.printer_uri.is_empty()
    }
}

fn env_string(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => v.eq_ignore_ascii_case("true") || v == "1",
        Err(_) => default,
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
