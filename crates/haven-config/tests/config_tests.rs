// SPDX-FileCopyrightText: 2026 Haven Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Haven configuration system.

use std::io::Write;

use haven_config::diagnostic::ConfigError;
use haven_config::model::HavenConfig;
use haven_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_haven_config() {
    let toml = r#"
[service]
name = "haven-test"
log_level = "debug"

[storage]
database_path = "/tmp/haven-test.db"
wal_mode = false

[gateway]
enabled = false
host = "0.0.0.0"
port = 9000
api_token = "0123456789abcdef-token"

[retention]
window_days = 14
interval_secs = 3600
runner_enabled = false
cron_secret = "0123456789abcdef-cron"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.name, "haven-test");
    assert_eq!(config.service.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/haven-test.db");
    assert!(!config.storage.wal_mode);
    assert!(!config.gateway.enabled);
    assert_eq!(config.gateway.host, "0.0.0.0");
    assert_eq!(config.gateway.port, 9000);
    assert_eq!(
        config.gateway.api_token.as_deref(),
        Some("0123456789abcdef-token")
    );
    assert_eq!(config.retention.window_days, 14);
    assert_eq!(config.retention.interval_secs, 3600);
    assert!(!config.retention.runner_enabled);
    assert_eq!(
        config.retention.cron_secret.as_deref(),
        Some("0123456789abcdef-cron")
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.service.name, "haven");
    assert_eq!(config.service.log_level, "info");
    assert!(config.storage.database_path.ends_with("haven.db"));
    assert!(config.storage.wal_mode);
    assert!(config.gateway.enabled);
    assert_eq!(config.gateway.host, "127.0.0.1");
    assert_eq!(config.gateway.port, 8787);
    assert!(config.gateway.api_token.is_none());
    assert_eq!(config.retention.window_days, 30);
    assert_eq!(config.retention.interval_secs, 86_400);
    assert!(config.retention.runner_enabled);
    assert!(config.retention.cron_secret.is_none());
}

#[test]
fn unknown_field_in_retention_produces_error() {
    let toml = r#"
[retention]
windw_days = 3
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("windw_days"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[logging]
level = "debug"
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("logging"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Dotted overrides (what the env provider produces) win over TOML.
#[test]
fn dotted_override_beats_toml() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let toml_content = r#"
[retention]
cron_secret = "from-toml-0123456789"
"#;

    let config: HavenConfig = Figment::new()
        .merge(Serialized::defaults(HavenConfig::default()))
        .merge(Toml::string(toml_content))
        .merge(("retention.cron_secret", "from-env-0123456789"))
        .extract()
        .expect("should merge override");

    assert_eq!(
        config.retention.cron_secret.as_deref(),
        Some("from-env-0123456789")
    );
}

/// `HAVEN_GATEWAY_API_TOKEN` lands on `gateway.api_token`, not `gateway.api.token`.
#[test]
#[serial_test::serial]
fn env_var_overrides_gateway_api_token() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("haven.toml");
    std::fs::write(&path, "[gateway]\nport = 9100\n").unwrap();

    // SAFETY: serialized with the other env-mutating tests in this file.
    unsafe { std::env::set_var("HAVEN_GATEWAY_API_TOKEN", "env-token-0123456789") };
    let result = load_and_validate_path(&path);
    unsafe { std::env::remove_var("HAVEN_GATEWAY_API_TOKEN") };

    let config = result.expect("env override should validate");
    assert_eq!(config.gateway.port, 9100);
    assert_eq!(
        config.gateway.api_token.as_deref(),
        Some("env-token-0123456789")
    );
}

#[test]
#[serial_test::serial]
fn env_var_overrides_retention_window() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("haven.toml");
    std::fs::write(&path, "").unwrap();

    unsafe { std::env::set_var("HAVEN_RETENTION_WINDOW_DAYS", "7") };
    let result = load_and_validate_path(&path);
    unsafe { std::env::remove_var("HAVEN_RETENTION_WINDOW_DAYS") };

    assert_eq!(result.expect("should load").retention.window_days, 7);
}

/// Missing config files are silently skipped (Figment's Toml::file() behavior).
#[test]
#[serial_test::serial]
fn missing_config_file_is_skipped() {
    let config = load_and_validate_path(std::path::Path::new("/nonexistent/haven.toml"))
        .expect("missing file should be silently skipped");
    assert_eq!(config.service.name, "haven");
}

/// Diagnostics for a typo in a file carry a suggestion and a source span.
#[test]
#[serial_test::serial]
fn file_typo_gets_span_and_suggestion() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("haven.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "[gateway]\nprot = 9000").unwrap();

    let errors = load_and_validate_path(&path).expect_err("typo should fail");
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key,
                suggestion,
                span,
                ..
            } => Some((key.clone(), suggestion.clone(), *span)),
            _ => None,
        })
        .expect("should have UnknownKey");

    assert_eq!(unknown.0, "prot");
    assert_eq!(unknown.1.as_deref(), Some("port"));
    assert!(unknown.2.is_some(), "span should be resolved from the file");
}

#[test]
fn diagnostic_error_includes_unknown_key_and_valid_keys() {
    let toml = r#"
[service]
naem = "test"
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "naem"
                && suggestion.as_deref() == Some("name")
                && valid_keys.contains("log_level")
        })
    });
    assert!(found, "expected UnknownKey for 'naem', got: {errors:?}");
}

/// Invalid type (string where number expected) produces an InvalidType diagnostic.
#[test]
fn diagnostic_invalid_type() {
    let toml = r#"
[gateway]
port = "eighty"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("port"))),
        "got: {errors:?}"
    );
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "naem".to_string(),
        suggestion: Some("name".to_string()),
        valid_keys: "name, log_level".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some());
    let help = error.help().expect("should have help").to_string();
    assert!(help.contains("did you mean `name`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("naem"));
}

#[test]
fn validation_catches_short_cron_secret() {
    let toml = r#"
[retention]
cron_secret = "short"
"#;

    let errors = load_and_validate_str(toml).expect_err("short secret should fail");
    assert!(errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { message } if message.contains("cron_secret"))
    }));
}

#[test]
fn defaults_serialize_to_json() {
    let json = serde_json::to_value(HavenConfig::default()).unwrap();
    assert_eq!(json["retention"]["window_days"], 30);
    assert_eq!(json["gateway"]["port"], 8787);
}
