// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Atrium portal backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Atrium configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AtriumConfig {
    /// HTTP/WebSocket server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Collaboration server settings.
    #[serde(default)]
    pub collab: CollabConfig,

    /// Payment webhook reconciler settings.
    #[serde(default)]
    pub billing: BillingConfig,
}

/// HTTP/WebSocket server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
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
    "atrium.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Collaboration server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CollabConfig {
    /// Maximum accepted chat message length in bytes.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,

    /// Per-connection outbound event buffer capacity.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl Default for CollabConfig {
    fn default() -> Self {
        Self {
            max_message_length: default_max_message_length(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

fn default_max_message_length() -> usize {
    8192
}

fn default_outbound_buffer() -> usize {
    64
}

/// Payment webhook reconciler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BillingConfig {
    /// Enable the webhook endpoint.
    #[serde(default = "default_billing_enabled")]
    pub enabled: bool,

    /// Shared webhook signing secret. Required when billing is enabled.
    #[serde(default)]
    pub webhook_secret: Option<String>,

    /// Maximum accepted age of a signed webhook timestamp, in seconds.
    #[serde(default = "default_signature_tolerance")]
    pub signature_tolerance_secs: i64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            enabled: default_billing_enabled(),
            webhook_secret: None,
            signature_tolerance_secs: default_signature_tolerance(),
        }
    }
}

fn default_billing_enabled() -> bool {
    true
}

fn default_signature_tolerance() -> i64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = AtriumConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8090);
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.storage.database_path, "atrium.db");
        assert!(config.storage.wal_mode);
        assert_eq!(config.billing.signature_tolerance_secs, 300);
        assert!(config.billing.webhook_secret.is_none());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = AtriumConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: AtriumConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.collab.max_message_length, config.collab.max_message_length);
    }
}
