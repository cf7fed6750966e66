// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses and fail-closed billing setup.

use crate::diagnostic::ConfigError;
use crate::model::AtriumConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &AtriumConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.collab.max_message_length == 0 {
        errors.push(ConfigError::Validation {
            message: "collab.max_message_length must be positive".to_string(),
        });
    }

    if config.collab.outbound_buffer == 0 {
        errors.push(ConfigError::Validation {
            message: "collab.outbound_buffer must be positive".to_string(),
        });
    }

    // Fail-closed: a billing endpoint without a secret would accept forged
    // events, so refuse to start instead of starting unverified.
    if config.billing.enabled {
        match &config.billing.webhook_secret {
            Some(secret) if !secret.trim().is_empty() => {}
            _ => {
                errors.push(ConfigError::Validation {
                    message: "billing.enabled requires billing.webhook_secret to be set"
                        .to_string(),
                });
            }
        }
    }

    if config.billing.signature_tolerance_secs <= 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "billing.signature_tolerance_secs must be positive, got {}",
                config.billing.signature_tolerance_secs
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
