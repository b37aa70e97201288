// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Alumnet configuration system.

use alumnet_config::diagnostic::ConfigError;
use alumnet_config::loader::{load_config, load_config_from_path};
use alumnet_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_alumnet_config() {
    let toml = r#"
[app]
name = "campus"
log_level = "debug"

[session]
minimum_minutes = 15.0
watch_max_secs = 3600
watch_probe_secs = 2
call_room_base_url = "https://rooms.example.org"

[poller]
interval_secs = 10

[services]
session_log_url = "https://api.example.org/call-history"
presence_url = "https://api.example.org/call-status"
payment_url = "https://api.example.org/payments"
requests_url = "https://api.example.org/mentorship"
timeout_secs = 3
max_retries = 2

[storage]
database_path = "/tmp/alumnet-test.db"
wal_mode = false
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.app.name, "campus");
    assert_eq!(config.app.log_level, "debug");
    assert_eq!(config.session.minimum_minutes, 15.0);
    assert_eq!(config.session.watch_max_secs, 3600);
    assert_eq!(config.session.watch_probe_secs, 2);
    assert_eq!(config.session.call_room_base_url, "https://rooms.example.org");
    assert_eq!(config.poller.interval_secs, 10);
    assert_eq!(config.services.payment_url, "https://api.example.org/payments");
    assert_eq!(config.services.timeout_secs, 3);
    assert_eq!(config.services.max_retries, 2);
    assert_eq!(config.storage.database_path, "/tmp/alumnet-test.db");
    assert!(!config.storage.wal_mode);
}

/// Missing optional sections fall back to the reference behavior.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.app.name, "alumnet");
    assert_eq!(config.app.log_level, "info");
    assert_eq!(config.session.minimum_minutes, 1.0);
    assert_eq!(config.session.watch_max_secs, 7200);
    assert_eq!(config.poller.interval_secs, 5);
    assert_eq!(config.services.timeout_secs, 10);
    assert_eq!(config.services.max_retries, 1);
    assert!(config.storage.wal_mode);
}

#[test]
fn unknown_field_in_session_is_rejected() {
    let toml = r#"
[session]
minimun_minutes = 3.0
"#;
    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("minimun_minutes"),
        "error should mention the unknown key, got: {err_str}"
    );
}

#[test]
fn unknown_key_diagnostic_suggests_the_real_key() {
    let toml = r#"
[poller]
intervl_secs = 3
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { suggestion, .. } => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("interval_secs"));
}

#[test]
fn wrong_type_produces_invalid_type_diagnostic() {
    let toml = r#"
[poller]
interval_secs = "often"
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("interval_secs")))
    );
}

#[test]
fn semantic_validation_runs_after_deserialization() {
    let toml = r#"
[session]
watch_max_secs = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("zero watch bound is invalid");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("watch_max_secs"))
    ));
}

#[test]
fn env_vars_override_toml_files() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "alumnet.toml",
            r#"
[session]
minimum_minutes = 10.0

[services]
session_log_url = "https://from-file.example.org/log"
"#,
        )?;
        jail.set_env("ALUMNET_SESSION_MINIMUM_MINUTES", "2.5");
        jail.set_env("ALUMNET_SERVICES_SESSION_LOG_URL", "https://from-env.example.org/log");

        let config = load_config().expect("layered config should load");
        assert_eq!(config.session.minimum_minutes, 2.5);
        assert_eq!(
            config.services.session_log_url,
            "https://from-env.example.org/log"
        );
        Ok(())
    });
}

#[test]
fn explicit_path_is_loaded() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("custom.toml", "[poller]\ninterval_secs = 9\n")?;
        let config = load_config_from_path(std::path::Path::new("custom.toml"))
            .expect("explicit file should load");
        assert_eq!(config.poller.interval_secs, 9);
        Ok(())
    });
}
