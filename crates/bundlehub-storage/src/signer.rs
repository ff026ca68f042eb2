//! Signed time-limited URL tokens.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Produces and verifies expiring URL tokens for object keys.
///
/// The token is a URL-safe base64 SHA-256 digest over the signing
/// secret, the object key, and the expiry timestamp; any party holding
/// the secret can verify a presented URL without further state.
#[derive(Debug, Clone)]
pub struct UrlSigner {
    secret: String,
}

impl UrlSigner {
    /// Create a signer from the shared secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Sign `key` with the given unix-seconds expiry.
    pub fn sign(&self, key: &str, expires_unix: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b"\n");
        hasher.update(key.as_bytes());
        hasher.update(b"\n");
        hasher.update(expires_unix.to_be_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }

    /// Check a presented token against `key` and its claimed expiry.
    pub fn verify(&self, key: &str, expires_unix: i64, token: &str) -> bool {
        // Length check first keeps the comparison shape uniform.
        let expected = self.sign(key, expires_unix);
        expected.len() == token.len()
            && expected
                .bytes()
                .zip(token.bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}
