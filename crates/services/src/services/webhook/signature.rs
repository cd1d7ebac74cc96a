//! HMAC-SHA256 webhook signature verification.
//!
//! Both GitHub and Gitea send `sha256=<hex digest>` computed over the raw
//! request body. Verification uses the hmac crate's constant-time
//! comparison; string equality on digests would leak timing.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use super::SyncError;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Verifies the delivery signature against the integration's secret.
///
/// No stored secret means the integration opted out of verification and any
/// (or no) signature passes. A stored secret makes the signature mandatory.
pub fn verify_signature(
    secret: Option<&str>,
    signature_header: Option<&str>,
    body: &[u8],
) -> Result<(), SyncError> {
    let Some(secret) = secret else {
        debug!("integration has no webhook secret, skipping signature verification");
        return Ok(());
    };

    let header = signature_header.ok_or_else(|| {
        SyncError::Authentication("missing signature header".to_string())
    })?;

    let hex_digest = header.strip_prefix(SIGNATURE_PREFIX).unwrap_or(header);
    let expected = hex::decode(hex_digest)
        .map_err(|_| SyncError::Authentication("signature is not valid hex".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SyncError::Authentication("invalid secret key".to_string()))?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| SyncError::Authentication("signature mismatch".to_string()))
}
