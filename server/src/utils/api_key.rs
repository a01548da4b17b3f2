//! API key generation and hashing utilities
//!
//! Keys are opaque random strings. Only an HMAC-SHA256 digest keyed with the
//! server secret is persisted, so a leaked database cannot be used to verify
//! guessed keys offline.

use hmac::{Hmac, Mac};
use rand::Rng;
use rand::rngs::OsRng;
use sha2::Sha256;

use crate::core::constants::{API_KEY_PREFIX, API_KEY_PREFIX_DISPLAY_LEN, API_KEY_RANDOM_LENGTH};

type HmacSha256 = Hmac<Sha256>;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate opaque API key: pb-{random_48chars}
/// Uses OsRng (CSPRNG) for cryptographic security
pub fn generate_api_key() -> String {
    let random: String = (0..API_KEY_RANDOM_LENGTH)
        .map(|_| CHARSET[OsRng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!("{}{}", API_KEY_PREFIX, random)
}

/// HMAC-SHA256 hash of key with server secret (hex encoded)
pub fn hash_api_key(key: &str, server_secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(server_secret).expect("HMAC accepts any key length");
    mac.update(key.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Extract prefix for display (first 10 chars, e.g., "pb-a1b2c3d")
pub fn key_prefix(key: &str) -> String {
    key.chars().take(API_KEY_PREFIX_DISPLAY_LEN).collect()
}

/// Validate key format: pb-{48 lowercase alphanumeric chars}
pub fn is_valid_api_key(key: &str) -> bool {
    key.starts_with(API_KEY_PREFIX)
        && key.len() == API_KEY_PREFIX.len() + API_KEY_RANDOM_LENGTH
        && key[API_KEY_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

/// Expiry timestamp `days` after `now` (Unix seconds); `None` never expires
pub fn expiry_after_days(now: i64, days: Option<u32>) -> Option<i64> {
    days.map(|d| now + i64::from(d) * 86_400)
}

/// Extract key from a `Bearer` authorization header
pub fn extract_bearer_key(header: &str) -> Option<String> {
    header
        .strip_prefix("Bearer ")
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_KEY: &str = "pb-a1b2c3d4e5f6g7h8i9j0k1l2m3n4o5p6q7r8s9t0u1v2w3x4";

    #[test]
    fn test_generate_api_key() {
        let key = generate_api_key();
        assert!(key.starts_with(API_KEY_PREFIX));
        assert_eq!(key.len(), API_KEY_PREFIX.len() + API_KEY_RANDOM_LENGTH);
        assert!(is_valid_api_key(&key));
    }

    #[test]
    fn test_expiry_after_days() {
        assert_eq!(expiry_after_days(1_000, None), None);
        assert_eq!(expiry_after_days(1_000, Some(1)), Some(87_400));
        assert_eq!(expiry_after_days(0, Some(30)), Some(30 * 86_400));
    }

    #[test]
    fn test_generate_api_key_uniqueness() {
        assert_ne!(generate_api_key(), generate_api_key());
    }

    #[test]
    fn test_hash_api_key() {
        let secret = b"test-secret-32-bytes-long-here!";

        let hash1 = hash_api_key(SAMPLE_KEY, secret);
        let hash2 = hash_api_key(SAMPLE_KEY, secret);
        assert_eq!(hash1, hash2);

        assert_eq!(hash1.len(), 64);
        assert!(hash1.chars().all(|c| c.is_ascii_hexdigit()));

        let hash3 = hash_api_key(SAMPLE_KEY, b"different-secret-here!!!!!!!!!");
        assert_ne!(hash1, hash3);
    }

    #[test]
    fn test_key_prefix() {
        assert_eq!(key_prefix(SAMPLE_KEY), "pb-a1b2c3d");
    }

    #[test]
    fn test_is_valid_api_key() {
        assert!(is_valid_api_key(SAMPLE_KEY));
        assert!(!is_valid_api_key("pb-a1b2c3"));
        assert!(!is_valid_api_key(
            "xx-a1b2c3d4e5f6g7h8i9j0k1l2m3n4o5p6q7r8s9t0u1v2w3x4"
        ));
        assert!(!is_valid_api_key(
            "pb-A1B2C3D4E5F6G7H8I9J0K1L2M3N4O5P6Q7R8S9T0U1V2W3X4"
        ));
        assert!(!is_valid_api_key(
            "pb-a1b2c3d4e5f6g7h8i9j0k1l2m3n4o5p6q7r8s9t0u1v2w3-4"
        ));
    }

    #[test]
    fn test_extract_bearer_key() {
        assert_eq!(
            extract_bearer_key("Bearer pb-abc123"),
            Some("pb-abc123".to_string())
        );
        assert_eq!(extract_bearer_key("Bearer   "), None);
        assert!(extract_bearer_key("Basic cGItYWJj").is_none());
        assert!(extract_bearer_key("").is_none());
    }
}
