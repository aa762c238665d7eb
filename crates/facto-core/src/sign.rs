//! The Signer. Ed25519 over canonical bytes (never over the hex hash).
//!
//! A verifying key travels inline in every event's `proof.public_key`;
//! trust in that key is established out-of-band (e.g. a registry lookup
//! by `agent_id`). The signature scheme itself is fixed: an `alg` field on
//! `proof`, if present, is never consulted — algorithm agility is refused
//! so a forged event can't just claim a weaker scheme to pass verification.

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};

const PUBLIC_KEY_LEN: usize = 32;
const SIGNATURE_LEN: usize = 64;

/// A per-session (or per-client) Ed25519 signing identity.
///
/// Zeroized on drop (`ed25519-dalek`'s `zeroize` feature), matching the
/// protocol's requirement that signing key material not outlive the
/// client that owns it.
pub struct Signer {
    signing_key: SigningKey,
}

impl Signer {
    /// Generate a fresh random signing key.
    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Load a signing key from 32 raw secret-key bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; PUBLIC_KEY_LEN] = bytes.try_into().map_err(|_| Error::MalformedKey {
            expected: PUBLIC_KEY_LEN,
            got: bytes.len(),
        })?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&arr),
        })
    }

    /// The verifying (public) key, base64-encoded.
    pub fn public_key_base64(&self) -> String {
        BASE64.encode(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign `message`, returning the base64-encoded 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> Result<String> {
        let signature = self.signing_key.try_sign(message).map_err(|e| Error::Signing(e.to_string()))?;
        Ok(BASE64.encode(signature.to_bytes()))
    }
}

/// Verify `signature_b64` over `message` under `public_key_b64`.
///
/// Returns `Err` for a malformed key or signature length (a validation
/// failure, not an integrity verdict); returns `Ok(false)` for a
/// well-formed signature that simply does not verify.
pub fn verify(message: &[u8], signature_b64: &str, public_key_b64: &str) -> Result<bool> {
    let key_bytes = BASE64.decode(public_key_b64).map_err(|_| Error::MalformedKey {
        expected: PUBLIC_KEY_LEN,
        got: public_key_b64.len(),
    })?;
    let key_arr: [u8; PUBLIC_KEY_LEN] = key_bytes
        .as_slice()
        .try_into()
        .map_err(|_| Error::MalformedKey {
            expected: PUBLIC_KEY_LEN,
            got: key_bytes.len(),
        })?;
    let verifying_key =
        VerifyingKey::from_bytes(&key_arr).map_err(|_| Error::MalformedKey {
            expected: PUBLIC_KEY_LEN,
            got: key_arr.len(),
        })?;

    let sig_bytes = BASE64
        .decode(signature_b64)
        .map_err(|_| Error::MalformedSignature {
            expected: SIGNATURE_LEN,
            got: signature_b64.len(),
        })?;
    let sig_arr: [u8; SIGNATURE_LEN] = sig_bytes
        .as_slice()
        .try_into()
        .map_err(|_| Error::MalformedSignature {
            expected: SIGNATURE_LEN,
            got: sig_bytes.len(),
        })?;
    let signature = ed25519_dalek::Signature::from_bytes(&sig_arr);

    Ok(verifying_key.verify_strict(message, &signature).is_ok())
}
