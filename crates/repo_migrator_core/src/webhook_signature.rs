//! `X-Hub-Signature-256` handling for incoming GitHub webhooks.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::{CoreResult, ValidationError};

#[cfg(test)]
#[path = "webhook_signature_tests.rs"]
mod tests;

/// Header GitHub puts the payload signature in.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

fn new_mac(secret: &[u8]) -> CoreResult<Hmac<Sha256>> {
    Hmac::<Sha256>::new_from_slice(secret).map_err(|e| {
        ValidationError::invalid_format("webhook_secret", e.to_string()).into()
    })
}

/// Computes the signature of `payload` in the `sha256=<hex>` form GitHub sends.
pub fn compute_signature(payload: &[u8], secret: &str) -> CoreResult<String> {
    let mut mac = new_mac(secret.as_bytes())?;
    mac.update(payload);
    Ok(format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Returns `true` when `signature_header` matches the HMAC-SHA256 of `payload`.
///
/// The comparison is constant-time.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &str) -> bool {
    let Some(hex_part) = signature_header.trim().strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };

    let Ok(received) = hex::decode(hex_part) else {
        return false;
    };

    let Ok(mut mac) = new_mac(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);

    mac.verify_slice(&received).is_ok()
}
