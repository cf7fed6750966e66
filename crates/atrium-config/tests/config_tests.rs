// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the configuration system.

use atrium_config::{load_and_validate_str, ConfigError};

#[test]
fn minimal_config_validates_with_secret() {
    let config = load_and_validate_str(
        r#"
        [billing]
        webhook_secret = "whsec_abc"
        "#,
    )
    .unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert!(config.billing.enabled);
}

#[test]
fn empty_config_fails_closed_on_billing() {
    let errors = load_and_validate_str("").unwrap_err();
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::Validation { message } if message.contains("webhook_secret")
    )));
}

#[test]
fn billing_can_be_disabled() {
    let config = load_and_validate_str(
        r#"
        [billing]
        enabled = false
        "#,
    )
    .unwrap();
    assert!(!config.billing.enabled);
}

#[test]
fn unknown_section_key_reports_suggestion() {
    let errors = load_and_validate_str(
        r#"
        [server]
        prot = 9000
        "#,
    )
    .unwrap_err();

    let unknown = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { key, suggestion, .. } => Some((key.clone(), suggestion.clone())),
        _ => None,
    });
    let (key, suggestion) = unknown.expect("expected an UnknownKey error");
    assert_eq!(key, "prot");
    assert_eq!(suggestion.as_deref(), Some("port"));
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str(
        r#"
        [server]
        port = "not-a-number"
        "#,
    )
    .unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { .. })));
}

#[test]
fn full_config_round_trip() {
    let config = load_and_validate_str(
        r#"
        [server]
        host = "0.0.0.0"
        port = 8443
        log_level = "debug"

        [storage]
        database_path = "/var/lib/atrium/atrium.db"

        [collab]
        max_message_length = 4096
        outbound_buffer = 128

        [billing]
        webhook_secret = "whsec_full"
        signature_tolerance_secs = 120
        "#,
    )
    .unwrap();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8443);
    assert_eq!(config.server.log_level, "debug");
    assert_eq!(config.storage.database_path, "/var/lib/atrium/atrium.db");
    assert_eq!(config.collab.max_message_length, 4096);
    assert_eq!(config.collab.outbound_buffer, 128);
    assert_eq!(config.billing.signature_tolerance_secs, 120);
}
