// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Alumnet mentorship engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Alumnet configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AlumnetConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub app: AppConfig,

    /// Call-session rules (minimum duration, window watch bounds, call room).
    #[serde(default)]
    pub session: SessionConfig,

    /// Background presence poller.
    #[serde(default)]
    pub poller: PollerConfig,

    /// Remote collaborator endpoints.
    #[serde(default)]
    pub services: ServicesConfig,

    /// Local durable store.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Display name used in logs and health output.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_app_name() -> String {
    "alumnet".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Call-session rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Minimum minutes a call segment must run before manual completion.
    #[serde(default = "default_minimum_minutes")]
    pub minimum_minutes: f64,

    /// Hard upper bound on a single call-window watch, in seconds.
    #[serde(default = "default_watch_max_secs")]
    pub watch_max_secs: u64,

    /// How often the fallback window watch probes the call room, in seconds.
    #[serde(default = "default_watch_probe_secs")]
    pub watch_probe_secs: u64,

    /// Base URL of the external call-room provider.
    #[serde(default = "default_call_room_base_url")]
    pub call_room_base_url: String,
}

impl SessionConfig {
    pub fn watch_max(&self) -> Duration {
        Duration::from_secs(self.watch_max_secs)
    }

    pub fn watch_probe_interval(&self) -> Duration {
        Duration::from_secs(self.watch_probe_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            minimum_minutes: default_minimum_minutes(),
            watch_max_secs: default_watch_max_secs(),
            watch_probe_secs: default_watch_probe_secs(),
            call_room_base_url: default_call_room_base_url(),
        }
    }
}

fn default_minimum_minutes() -> f64 {
    1.0
}

fn default_watch_max_secs() -> u64 {
    2 * 60 * 60
}

fn default_watch_probe_secs() -> u64 {
    5
}

fn default_call_room_base_url() -> String {
    "https://meet.jit.si".to_string()
}

/// Background presence poller configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollerConfig {
    /// Seconds between presence polls for each open request.
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    5
}

/// Remote collaborator endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServicesConfig {
    /// Base URL of the session-log service.
    #[serde(default = "default_session_log_url")]
    pub session_log_url: String,

    /// Base URL of the presence/status service.
    #[serde(default = "default_presence_url")]
    pub presence_url: String,

    /// Base URL of the payment-status service.
    #[serde(default = "default_payment_url")]
    pub payment_url: String,

    /// Base URL of the mentorship request repository.
    #[serde(default = "default_requests_url")]
    pub requests_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries on transient HTTP status (429, 500, 502, 503).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl ServicesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            session_log_url: default_session_log_url(),
            presence_url: default_presence_url(),
            payment_url: default_payment_url(),
            requests_url: default_requests_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_session_log_url() -> String {
    "http://127.0.0.1:5000/api/call-history".to_string()
}

fn default_presence_url() -> String {
    "http://127.0.0.1:5000/api/call-status".to_string()
}

fn default_payment_url() -> String {
    "http://127.0.0.1:5000/api/payments".to_string()
}

fn default_requests_url() -> String {
    "http://127.0.0.1:5000/api/mentorship".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    1
}

/// Local durable store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("alumnet").join("alumnet.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "alumnet.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}
