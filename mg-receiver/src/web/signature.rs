//! Mailgun webhook signature verification.
//!
//! Mailgun signs webhook requests using HMAC-SHA256.
//! Reference: https://documentation.mailgun.com/docs/mailgun/user-manual/events/webhooks/#securing-webhooks

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Verify a Mailgun webhook signature.
///
/// Mailgun webhooks include three fields for signature verification:
/// - timestamp: Unix epoch seconds when the webhook was generated
/// - token: A randomly generated string
/// - signature: HMAC-SHA256 hex digest of timestamp + token
///
/// The digest comparison goes through [`Mac::verify_slice`], which runs in
/// constant time. Malformed input never errors; it simply fails verification.
pub fn verify_signature(signing_key: &str, timestamp: &str, token: &str, signature: &str) -> bool {
    if signing_key.is_empty() || timestamp.is_empty() || token.is_empty() || signature.is_empty() {
        debug!(
            has_signing_key = !signing_key.is_empty(),
            has_timestamp = !timestamp.is_empty(),
            has_token = !token.is_empty(),
            has_signature = !signature.is_empty(),
            "signature_missing_fields"
        );
        return false;
    }

    let provided = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            debug!(signature_length = signature.len(), "signature_not_hex");
            return false;
        }
    };

    let mut mac = match HmacSha256::new_from_slice(signing_key.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("signature_invalid_key");
            return false;
        }
    };

    mac.update(timestamp.as_bytes());
    mac.update(token.as_bytes());

    mac.verify_slice(&provided).is_ok()
}

/// Check a webhook timestamp against a replay window.
///
/// `now` is Unix epoch seconds. Unparsable timestamps are never fresh.
pub fn is_timestamp_fresh(timestamp: &str, max_age_seconds: u64, now: u64) -> bool {
    let webhook_time: u64 = match timestamp.trim().parse() {
        Ok(t) => t,
        Err(_) => {
            warn!(timestamp = %timestamp, "signature_invalid_timestamp");
            return false;
        }
    };

    let age = now.abs_diff(webhook_time);
    if age > max_age_seconds {
        warn!(
            webhook_time = webhook_time,
            current_time = now,
            age_seconds = age,
            max_age_seconds = max_age_seconds,
            "signature_stale"
        );
        return false;
    }

    true
}

/// Compute the hex signature Mailgun would send for `timestamp` and `token`.
///
/// Used by tests and local tooling to build signed requests.
pub fn sign(signing_key: &str, timestamp: &str, token: &str) -> String {
    match HmacSha256::new_from_slice(signing_key.as_bytes()) {
        Ok(mut mac) => {
            mac.update(timestamp.as_bytes());
            mac.update(token.as_bytes());
            hex::encode(mac.finalize().into_bytes())
        }
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_signature_missing_fields() {
        assert!(!verify_signature("", "123", "token", "sig"));
        assert!(!verify_signature("key", "", "token", "sig"));
        assert!(!verify_signature("key", "123", "", "sig"));
        assert!(!verify_signature("key", "123", "token", ""));
    }

    #[test]
    fn test_verify_signature_valid() {
        let signature = sign("test-signing-key", "1700000000", "random-token");
        assert!(verify_signature(
            "test-signing-key",
            "1700000000",
            "random-token",
            &signature
        ));
    }

    #[test]
    fn test_verify_signature_known_vector() {
        // HMAC-SHA256("key", "The quick brown fox jumps over the lazy dog")
        let expected = "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8";
        assert!(verify_signature(
            "key",
            "The quick brown fox ",
            "jumps over the lazy dog",
            expected
        ));
        assert_eq!(
            sign("key", "The quick brown fox ", "jumps over the lazy dog"),
            expected
        );
    }

    #[test]
    fn test_verify_signature_wrong_key() {
        let signature = sign("wrong-key", "1700000000", "random-token");
        assert!(!verify_signature(
            "test-signing-key",
            "1700000000",
            "random-token",
            &signature
        ));
    }

    #[test]
    fn test_verify_signature_tampered_token() {
        let signature = sign("key", "1700000000", "token-a");
        assert!(!verify_signature("key", "1700000000", "token-b", &signature));
    }

    #[test]
    fn test_verify_signature_malformed() {
        assert!(!verify_signature("key", "1700000000", "token", "not-hex!"));
        assert!(!verify_signature("key", "1700000000", "token", "abcd"));

        let mut truncated = sign("key", "1700000000", "token");
        truncated.pop();
        assert!(!verify_signature("key", "1700000000", "token", &truncated));
    }

    #[test]
    fn test_timestamp_fresh() {
        assert!(is_timestamp_fresh("1000", 300, 1100));
        assert!(is_timestamp_fresh("1100", 300, 1000));
        assert!(!is_timestamp_fresh("1000", 300, 1301));
        assert!(!is_timestamp_fresh("not-a-number", 300, 1000));
    }
}
