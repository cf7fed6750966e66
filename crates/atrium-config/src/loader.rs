// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./atrium.toml` > `~/.config/atrium/atrium.toml` > `/etc/atrium/atrium.toml`
//! with environment variable overrides via `ATRIUM_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::AtriumConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/atrium/atrium.toml` (system-wide)
/// 3. `~/.config/atrium/atrium.toml` (user XDG config)
/// 4. `./atrium.toml` (local directory)
/// 5. `ATRIUM_*` environment variables
pub fn load_config() -> Result<AtriumConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AtriumConfig::default()))
        .merge(Toml::file("/etc/atrium/atrium.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("atrium/atrium.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("atrium.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<AtriumConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AtriumConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AtriumConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AtriumConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `ATRIUM_BILLING_WEBHOOK_SECRET` must map
/// to `billing.webhook_secret`, not `billing.webhook.secret`.
fn env_provider() -> Env {
    Env::prefixed("ATRIUM_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: ATRIUM_BILLING_WEBHOOK_SECRET -> "billing_webhook_secret"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("collab_", "collab.", 1)
            .replacen("billing_", "billing.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_extract_without_files() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.port, 8090);
    }

    #[test]
    fn toml_string_overrides_defaults() {
        let config = load_config_from_str(
            r#"
            [server]
            port = 9999

            [billing]
            webhook_secret = "whsec_test"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.billing.webhook_secret.as_deref(), Some("whsec_test"));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let result = load_config_from_str(
            r#"
            [server]
            hostt = "0.0.0.0"
            "#,
        );
        assert!(result.is_err(), "unknown key should fail extraction");
    }
}
