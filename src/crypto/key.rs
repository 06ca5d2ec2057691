//! Derivation of the cookie encryption key from the configured secret.
//!
//! A secret that base64-decodes to exactly 32 bytes is used as the key as-is.
//! Anything else is hashed with SHA-256 to get a fixed-size key.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::crypto::aes::{SecureKey, KEY_SIZE};
use crate::error::{AppError, Result};

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

/// Standard alphabet, padding optional, non-zero trailing bits ignored.
pub(crate) const STANDARD_LENIENT: GeneralPurpose =
    GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// URL-safe alphabet, padding optional.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Derives the AES-256 key from `secret`.
///
/// Deterministic: the same secret always yields the same key, so tokens issued by
/// one process decrypt in another configured with the same secret.
pub fn derive_key(secret: &str) -> Result<SecureKey> {
    if secret.is_empty() {
        return Err(AppError::Config("COOKIE_SECRET must not be empty".to_string()));
    }

    if let Some(key) = decode_raw_key(secret) {
        tracing::debug!("🔑 Using base64 COOKIE_SECRET as raw key");
        return Ok(key);
    }

    tracing::debug!("🔑 Deriving cookie key from COOKIE_SECRET with SHA-256");
    let digest = Sha256::digest(secret.as_bytes());
    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&digest);
    Ok(SecureKey::new(key))
}

fn decode_raw_key(secret: &str) -> Option<SecureKey> {
    let trimmed = secret.trim();
    let decoded = STANDARD_LENIENT
        .decode(trimmed)
        .or_else(|_| URL_SAFE_LENIENT.decode(trimmed))
        .ok()
        .map(Zeroizing::new)?;

    let bytes: [u8; KEY_SIZE] = decoded.as_slice().try_into().ok()?;
    Some(SecureKey::new(bytes))
}
