// SPDX-FileCopyrightText: 2026 Atrium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook signature scheme.
//!
//! The provider signs `"{timestamp}.{raw body}"` with HMAC-SHA256 over the
//! shared secret and sends `Atrium-Provider-Signature: t=<unix>,v1=<hex>`.
//! Verification is constant-time via the MAC's own `verify_slice`; the
//! timestamp must fall within the configured tolerance window to bound
//! replay. Requests failing any check are rejected before any record is
//! written.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use atrium_core::AtriumError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature.
pub const SIGNATURE_HEADER: &str = "atrium-provider-signature";

/// Produce a signature header value for the given body at `timestamp`.
///
/// Used by tests and by provider simulators; the scheme is symmetric.
pub fn sign(secret: &str, timestamp: i64, body: &[u8]) -> Result<String, AtriumError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AtriumError::Internal("invalid webhook secret".to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    let digest = mac.finalize().into_bytes();
    Ok(format!("t={timestamp},v1={}", hex::encode(digest)))
}

/// Verify a signature header against the raw body.
pub fn verify(
    secret: &str,
    header: &str,
    body: &[u8],
    now: i64,
    tolerance_secs: i64,
) -> Result<(), AtriumError> {
    let (timestamp, signature_hex) = parse_header(header)?;

    if (now - timestamp).abs() > tolerance_secs {
        return Err(AtriumError::Signature(format!(
            "timestamp outside tolerance window ({}s)",
            (now - timestamp).abs()
        )));
    }

    let signature = hex::decode(signature_hex)
        .map_err(|_| AtriumError::Signature("signature is not valid hex".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AtriumError::Internal("invalid webhook secret".to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    mac.verify_slice(&signature)
        .map_err(|_| AtriumError::Signature("signature mismatch".to_string()))
}

/// Parse `t=<unix>,v1=<hex>` into its components.
fn parse_header(header: &str) -> Result<(i64, &str), AtriumError> {
    let mut timestamp = None;
    let mut signature = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = value.parse::<i64>().ok();
            }
            Some(("v1", value)) => {
                signature = Some(value);
            }
            _ => {}
        }
    }
    match (timestamp, signature) {
        (Some(t), Some(v1)) => Ok((t, v1)),
        _ => Err(AtriumError::Signature(
            "malformed signature header".to_string(),
        )),
    }
}
