//! The Hasher. SHA3-256 over canonical bytes.

use sha3::{Digest, Sha3_256};

/// SHA3-256 digest of `bytes`.
pub fn digest(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(bytes);
    let out = hasher.finalize();
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&out);
    buf
}

/// Lowercase hex encoding, as required on the wire.
pub fn to_hex(digest: &[u8; 32]) -> String {
    hex::encode(digest)
}

/// Convenience: digest then lowercase-hex-encode in one call.
pub fn hex_digest(bytes: &[u8]) -> String {
    to_hex(&digest(bytes))
}

/// `true` only if `s` is exactly 64 lowercase hex characters.
///
/// The verifier MUST reject uppercase hex as an integrity failure, so this
/// checks byte-for-byte rather than via a case-insensitive comparison.
pub fn is_valid_lowercase_hex64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
