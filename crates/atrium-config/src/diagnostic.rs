// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with fuzzy match suggestions.
//!
//! Converts Figment deserialization errors into diagnostics with valid key
//! listings and "did you mean?" suggestions using Jaro-Winkler similarity.

use miette::Diagnostic;
use thiserror::Error;

/// Minimum Jaro-Winkler similarity score to suggest a correction.
/// 0.75 catches common typos like `prot` -> `port` while filtering noise.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with diagnostic context.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(atrium::config::unknown_key),
        help("{}", format_unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// The unrecognized key name.
        key: String,
        /// Suggested correction via fuzzy matching, if any.
        suggestion: Option<String>,
        /// List of valid keys for the section.
        valid_keys: String,
    },

    /// A configuration value has the wrong type.
    #[error("invalid value for key `{key}`: {detail}")]
    #[diagnostic(code(atrium::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        /// The key with the wrong type.
        key: String,
        /// Description of the type mismatch.
        detail: String,
        /// What type was expected.
        expected: String,
    },

    /// A required configuration key is missing.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(atrium::config::missing_key),
        help("add `{key} = <value>` to your atrium.toml")
    )]
    MissingKey {
        /// The missing key name.
        key: String,
    },

    /// A post-deserialization validation error.
    #[error("validation error: {message}")]
    #[diagnostic(code(atrium::config::validation))]
    Validation {
        /// Human-readable description of the constraint violation.
        message: String,
    },
}

fn format_unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert a Figment extraction error into a list of [`ConfigError`]s.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    for e in err {
        match &e.kind {
            figment::error::Kind::UnknownField(field, expected) => {
                let valid: Vec<&str> = expected.to_vec();
                errors.push(ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest(field, &valid),
                    valid_keys: valid.join(", "),
                });
            }
            figment::error::Kind::InvalidType(actual, expected) => {
                errors.push(ConfigError::InvalidType {
                    key: e.path.join("."),
                    detail: format!("found {actual}"),
                    expected: expected.clone(),
                });
            }
            figment::error::Kind::MissingField(field) => {
                errors.push(ConfigError::MissingKey {
                    key: field.to_string(),
                });
            }
            _ => {
                errors.push(ConfigError::Validation {
                    message: e.to_string(),
                });
            }
        }
    }

    errors
}

/// Return the closest valid key above the similarity threshold, if any.
fn suggest(key: &str, valid: &[&str]) -> Option<String> {
    valid
        .iter()
        .map(|candidate| (strsim::jaro_winkler(key, candidate), *candidate))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate.to_string())
}

/// Render a list of configuration errors to stderr.
pub fn render_errors(errors: &[ConfigError]) {
    for err in errors {
        eprintln!("error: {err}");
        if let Some(help) = err.help() {
            eprintln!("  help: {help}");
        }
    }
}
