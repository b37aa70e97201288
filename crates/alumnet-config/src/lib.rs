// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Alumnet mentorship engine.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and miette
//! diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use alumnet_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("minimum session: {} min", config.session.minimum_minutes);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::AlumnetConfig;

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<AlumnetConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load configuration from an explicit file (plus env) and validate it.
pub fn load_and_validate_path(path: &std::path::Path) -> Result<AlumnetConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![(path.display().to_string(), content)])
            .unwrap_or_default()
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<AlumnetConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

#[allow(clippy::result_large_err)]
fn finish(
    loaded: Result<AlumnetConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<AlumnetConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Collect TOML source file contents for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![std::path::PathBuf::from("/etc/alumnet/alumnet.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("alumnet/alumnet.toml"));
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("alumnet.toml"));
    }

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
