//! Webhook signature verification.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw request body
//! and sends the result in the `X-Hub-Signature-256` header as
//! `sha256=<hex digest>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("missing signature header")]
    Missing,
    #[error("invalid signature format: must start with 'sha256='")]
    InvalidFormat,
    #[error("signature verification failed")]
    Mismatch,
}

/// Verify the HMAC-SHA256 signature of a webhook payload.
///
/// `signature` is the full `X-Hub-Signature-256` header value. Comparison
/// happens through `Mac::verify_slice`, which is constant-time.
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> Result<(), SignatureError> {
    if signature.is_empty() {
        return Err(SignatureError::Missing);
    }

    let hex_digest = signature
        .strip_prefix("sha256=")
        .ok_or(SignatureError::InvalidFormat)?;
    let expected = hex::decode(hex_digest).map_err(|_| SignatureError::InvalidFormat)?;

    // HMAC accepts keys of any length, so new_from_slice cannot fail here.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::InvalidFormat)?;
    mac.update(payload);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "It's a Secret to Everybody";
    const PAYLOAD: &[u8] = b"Hello, World!";
    // Digest from GitHub's webhook validation docs for the pair above.
    const VALID: &str = "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";

    #[test]
    fn test_valid_signature() {
        assert!(verify_signature(PAYLOAD, VALID, SECRET).is_ok());
    }

    #[test]
    fn test_missing_signature() {
        assert!(matches!(
            verify_signature(PAYLOAD, "", SECRET),
            Err(SignatureError::Missing)
        ));
    }

    #[test]
    fn test_wrong_prefix() {
        let sig = VALID.replace("sha256=", "sha1=");
        assert!(matches!(
            verify_signature(PAYLOAD, &sig, SECRET),
            Err(SignatureError::InvalidFormat)
        ));
    }

    #[test]
    fn test_non_hex_digest() {
        assert!(matches!(
            verify_signature(PAYLOAD, "sha256=not-hex!", SECRET),
            Err(SignatureError::InvalidFormat)
        ));
    }

    #[test]
    fn test_tampered_payload() {
        assert!(matches!(
            verify_signature(b"Hello, World?", VALID, SECRET),
            Err(SignatureError::Mismatch)
        ));
    }

    #[test]
    fn test_wrong_secret() {
        assert!(matches!(
            verify_signature(PAYLOAD, VALID, "another secret"),
            Err(SignatureError::Mismatch)
        ));
    }
}
