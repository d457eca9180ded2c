use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a media payload. Two parts with the same digest are
/// treated as the same image.
pub fn sha256_hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
