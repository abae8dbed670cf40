/// Refresh Token Storage Helpers
///
/// The user record never holds a usable refresh token: only its SHA-256
/// digest is persisted, and presented tokens are compared digest to digest
/// in constant time.

use sha2::{Digest, Sha256};

/// Hash a refresh token using SHA-256 (hex encoded)
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Whether `token` is the one whose digest is stored
///
/// Runs in time independent of where the digests first differ.
pub fn refresh_token_matches(token: &str, stored_hash: &str) -> bool {
    let presented = hash_refresh_token(token);
    let (a, b) = (presented.as_bytes(), stored_hash.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
