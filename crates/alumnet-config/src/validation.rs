// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as positive intervals, well-formed URLs and non-empty paths.

use crate::diagnostic::ConfigError;
use crate::model::AlumnetConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &AlumnetConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.app.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "app.log_level `{}` must be one of {}",
                config.app.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    let minimum = config.session.minimum_minutes;
    if !minimum.is_finite() || minimum < 0.0 {
        errors.push(ConfigError::Validation {
            message: format!("session.minimum_minutes must be a non-negative number, got {minimum}"),
        });
    }

    if config.session.watch_max_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "session.watch_max_secs must be greater than zero".to_string(),
        });
    }

    if config.session.watch_probe_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "session.watch_probe_secs must be greater than zero".to_string(),
        });
    }

    if config.poller.interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "poller.interval_secs must be greater than zero".to_string(),
        });
    }

    if config.services.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "services.timeout_secs must be greater than zero".to_string(),
        });
    }

    for (key, url) in [
        ("session.call_room_base_url", &config.session.call_room_base_url),
        ("services.session_log_url", &config.services.session_log_url),
        ("services.presence_url", &config.services.presence_url),
        ("services.payment_url", &config.services.payment_url),
        ("services.requests_url", &config.services.requests_url),
    ] {
        if !is_http_url(url) {
            errors.push(ConfigError::Validation {
                message: format!("{key} `{url}` must be an http:// or https:// URL"),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = AlumnetConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = AlumnetConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn negative_minimum_minutes_fails_validation() {
        let mut config = AlumnetConfig::default();
        config.session.minimum_minutes = -1.0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "minimum_minutes"));
    }

    #[test]
    fn zero_poll_interval_fails_validation() {
        let mut config = AlumnetConfig::default();
        config.poller.interval_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "poller.interval_secs"));
    }

    #[test]
    fn non_http_service_url_fails_validation() {
        let mut config = AlumnetConfig::default();
        config.services.payment_url = "ftp://payments".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "services.payment_url"));
    }

    #[test]
    fn collects_every_error_instead_of_failing_fast() {
        let mut config = AlumnetConfig::default();
        config.app.log_level = "loud".to_string();
        config.session.watch_max_secs = 0;
        config.services.timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn zero_minimum_is_allowed() {
        let mut config = AlumnetConfig::default();
        config.session.minimum_minutes = 0.0;
        assert!(validate_config(&config).is_ok());
    }
}
