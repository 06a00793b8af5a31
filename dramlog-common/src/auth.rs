//! API key generation and hashing
//!
//! Keys are handed to the user once and only their SHA-256 hash is stored.
//! This module has no HTTP framework dependencies; the API crate wraps it in
//! middleware.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Prefix marking a dramlog API key
pub const API_KEY_PREFIX: &str = "dl_";

/// Generate a new random API key (`dl_` + 64 hex chars)
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}{}", API_KEY_PREFIX, to_hex(&bytes))
}

/// SHA-256 of the key as 64 lowercase hex characters
pub fn hash_api_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn parse_bearer(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
