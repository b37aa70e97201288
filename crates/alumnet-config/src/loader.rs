// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./alumnet.toml` > `~/.config/alumnet/alumnet.toml` > `/etc/alumnet/alumnet.toml`
//! with environment variable overrides via `ALUMNET_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::AlumnetConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/alumnet/alumnet.toml` (system-wide)
/// 3. `~/.config/alumnet/alumnet.toml` (user XDG config)
/// 4. `./alumnet.toml` (local directory)
/// 5. `ALUMNET_*` environment variables
pub fn load_config() -> Result<AlumnetConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<AlumnetConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AlumnetConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AlumnetConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AlumnetConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(AlumnetConfig::default()))
        .merge(Toml::file("/etc/alumnet/alumnet.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("alumnet/alumnet.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("alumnet.toml"))
        .merge(env_provider())
}

/// Environment provider mapping `ALUMNET_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")`: key names contain
/// underscores, so `ALUMNET_SESSION_MINIMUM_MINUTES` must map to
/// `session.minimum_minutes`, not `session.minimum.minutes`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("ALUMNET_").map(|key| map_env_key(key.as_str()).into())
}

const SECTIONS: &[&str] = &["app", "session", "poller", "services", "storage"];

/// Map a lowercased, prefix-stripped env key onto its dotted config path.
///
/// Matches on the section prefix rather than the first occurrence so that
/// `services_session_log_url` stays inside `services`.
fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
