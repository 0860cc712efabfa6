//! Cryptographic helpers for webhook secrets and payload signing.
//!
//! Secrets are encrypted at rest with AES-256-GCM. Payload signatures use
//! HMAC-SHA256 over the exact request body bytes, hex encoded.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD};
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::error::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Nonce size for AES-GCM (96 bits).
const NONCE_SIZE: usize = 12;

/// Number of random bytes in a generated signing secret (256 bits).
const SECRET_BYTES: usize = 32;

/// Generate a new webhook signing secret.
///
/// 256 bits from the OS RNG, URL-safe base64 without padding. The plaintext
/// is shown to the caller exactly once at creation time.
#[must_use]
pub fn generate_webhook_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Encrypt a webhook secret for storage.
///
/// Output format: base64(nonce || ciphertext).
pub fn encrypt_secret(plaintext: &str, key: &[u8]) -> Result<String, WebhookError> {
    if key.len() != 32 {
        return Err(WebhookError::EncryptionFailed(
            "Encryption key must be 32 bytes".to_string(),
        ));
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| WebhookError::EncryptionFailed(format!("Encryption failed: {e}")))?;

    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(&nonce);
    combined.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(combined))
}

/// Decrypt a stored webhook secret.
pub fn decrypt_secret(encoded: &str, key: &[u8]) -> Result<String, WebhookError> {
    if key.len() != 32 {
        return Err(WebhookError::EncryptionFailed(
            "Encryption key must be 32 bytes".to_string(),
        ));
    }

    let combined = BASE64
        .decode(encoded)
        .map_err(|e| WebhookError::EncryptionFailed(format!("Invalid base64: {e}")))?;

    if combined.len() < NONCE_SIZE {
        return Err(WebhookError::EncryptionFailed(
            "Ciphertext too short".to_string(),
        ));
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(nonce_bytes);

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| WebhookError::EncryptionFailed(format!("Decryption failed: {e}")))?;

    String::from_utf8(plaintext)
        .map_err(|e| WebhookError::EncryptionFailed(format!("Invalid UTF-8: {e}")))
}

/// Compute the HMAC-SHA256 signature for a webhook payload.
///
/// The MAC covers the exact body bytes as sent on the wire. Receivers
/// recompute it with the shared secret and compare in constant time.
#[must_use]
pub fn compute_signature(secret: &str, body: &[u8]) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a webhook payload signature.
#[must_use]
pub fn verify_signature(expected: &str, secret: &str, body: &[u8]) -> bool {
    let computed = compute_signature(secret, body);
    constant_time_eq(computed.as_bytes(), expected.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.ct_eq(b).into()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: [u8; 32] = [0x42; 32];

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let secret = "whsec_test_secret_value";
        let encrypted = encrypt_secret(secret, &TEST_KEY).unwrap();
        let decrypted = decrypt_secret(&encrypted, &TEST_KEY).unwrap();
        assert_eq!(decrypted, secret);
    }

    #[test]
    fn test_encrypt_produces_different_ciphertexts() {
        let secret = "same input";
        let a = encrypt_secret(secret, &TEST_KEY).unwrap();
        let b = encrypt_secret(secret, &TEST_KEY).unwrap();
        // Random nonces make every ciphertext unique.
        assert_ne!(a, b);
    }

    #[test]
    fn test_encrypt_rejects_bad_key_length() {
        let result = encrypt_secret("secret", &[0u8; 16]);
        assert!(matches!(result, Err(WebhookError::EncryptionFailed(_))));
    }

    #[test]
    fn test_decrypt_rejects_bad_key_length() {
        let result = decrypt_secret("AAAA", &[0u8; 16]);
        assert!(matches!(result, Err(WebhookError::EncryptionFailed(_))));
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let encrypted = encrypt_secret("secret", &TEST_KEY).unwrap();
        let wrong_key = [0x43u8; 32];
        let result = decrypt_secret(&encrypted, &wrong_key);
        assert!(result.is_err());
    }

    #[test]
    fn test_decrypt_rejects_invalid_base64() {
        let result = decrypt_secret("not valid base64!!!", &TEST_KEY);
        assert!(matches!(result, Err(WebhookError::EncryptionFailed(_))));
    }

    #[test]
    fn test_decrypt_rejects_truncated_ciphertext() {
        let short = BASE64.encode([0u8; 4]);
        let result = decrypt_secret(&short, &TEST_KEY);
        assert!(matches!(result, Err(WebhookError::EncryptionFailed(_))));
    }

    #[test]
    fn test_encrypt_empty_plaintext() {
        let encrypted = encrypt_secret("", &TEST_KEY).unwrap();
        let decrypted = decrypt_secret(&encrypted, &TEST_KEY).unwrap();
        assert_eq!(decrypted, "");
    }

    #[test]
    fn test_generated_secret_length_and_uniqueness() {
        let a = generate_webhook_secret();
        let b = generate_webhook_secret();
        // 32 bytes in URL-safe base64 without padding is 43 characters.
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
    }

    #[test]
    fn test_signature_is_deterministic() {
        let a = compute_signature("secret", b"payload");
        let b = compute_signature("secret", b"payload");
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_is_lowercase_hex() {
        let sig = compute_signature("secret", b"payload");
        // HMAC-SHA256 output is 32 bytes, 64 hex characters.
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_signature_depends_on_body_and_secret() {
        let base = compute_signature("secret", b"payload");
        assert_ne!(base, compute_signature("secret", b"payload2"));
        assert_ne!(base, compute_signature("secret2", b"payload"));
    }

    #[test]
    fn test_verify_signature_accepts_valid() {
        let sig = compute_signature("secret", b"body bytes");
        assert!(verify_signature(&sig, "secret", b"body bytes"));
    }

    #[test]
    fn test_verify_signature_rejects_tampered_body() {
        let sig = compute_signature("secret", b"body bytes");
        assert!(!verify_signature(&sig, "secret", b"tampered"));
    }

    #[test]
    fn test_verify_signature_rejects_wrong_secret() {
        let sig = compute_signature("secret", b"body bytes");
        assert!(!verify_signature(&sig, "other", b"body bytes"));
    }
}
