//! Authenticated encryption of the session payload.
//!
//! `encrypt` turns an optional [`UserRecord`] into a [`SessionToken`]; `decrypt`
//! turns a cookie value back into a [`SessionState`] and never fails.

use std::sync::Arc;

use crate::crypto::aes::{self, SecureKey};
use crate::crypto::key::derive_key;
use crate::crypto::token::{SessionToken, TokenError, TokenParts};
use crate::error::{AppError, Result};
use crate::models::session::SessionState;
use crate::models::user::UserRecord;

/// Encrypts and decrypts session tokens under one immutable key.
#[derive(Clone, Debug)]
pub struct SessionCodec {
    key: Arc<SecureKey>,
}

impl SessionCodec {
    pub fn new(key: SecureKey) -> Self {
        Self { key: Arc::new(key) }
    }

    /// Builds a codec from the configured secret. See [`derive_key`].
    pub fn from_secret(secret: &str) -> Result<Self> {
        Ok(Self::new(derive_key(secret)?))
    }

    /// Serializes `payload` to JSON (`None` is `null`) and seals it under a fresh IV.
    pub fn encrypt(&self, payload: Option<&UserRecord>) -> Result<SessionToken> {
        let plaintext = sonic_rs::to_vec(&payload)
            .map_err(|e| AppError::Serialization(format!("Session payload: {}", e)))?;

        let (ciphertext, iv) = aes::encrypt(&self.key, &plaintext)?;
        Ok(SessionToken::new(&iv, &ciphertext))
    }

    /// Opens a token. Every failure is reported as [`SessionState::Malformed`].
    pub fn decrypt(&self, token: &str) -> SessionState {
        match self.open(token) {
            Ok(payload) => SessionState::from(payload),
            Err(reason) => SessionState::Malformed(reason),
        }
    }

    fn open(&self, token: &str) -> std::result::Result<Option<UserRecord>, TokenError> {
        let parts = TokenParts::parse(token)?;

        let plaintext = aes::decrypt(&self.key, &parts.ciphertext, &parts.iv)
            .map_err(|_| TokenError::Authentication)?;

        sonic_rs::from_slice::<Option<UserRecord>>(&plaintext)
            .map_err(|_| TokenError::InvalidPayload)
    }

    /// Round-trips a sample record. Run once at startup.
    pub fn self_test(&self) -> Result<()> {
        let sample = UserRecord::new()
            .with_id("1")
            .with_email("user@example.com")
            .with_roles(["user"]);

        let token = self.encrypt(Some(&sample))?;
        match self.decrypt(token.as_str()) {
            SessionState::Valid(out) if out.email() == sample.email() => Ok(()),
            other => Err(AppError::Encryption(format!(
                "Encryption self-test failed: {:?}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde_json::json;

    fn codec() -> SessionCodec {
        SessionCodec::from_secret("test-cookie-secret").unwrap()
    }

    fn sample_user() -> UserRecord {
        UserRecord::new()
            .with_id("u1")
            .with_email("a@b.com")
            .with_name("Ada")
            .with_roles(["admin", "user"])
            .with("prefs", json!({ "theme": "dark", "beta": true, "score": 1.5 }))
    }

    #[test]
    fn round_trips_a_user_record() {
        let codec = codec();
        let user = sample_user();

        let token = codec.encrypt(Some(&user)).unwrap();
        assert_eq!(codec.decrypt(token.as_str()), SessionState::Valid(user));
    }

    #[test]
    fn round_trips_an_empty_record() {
        let codec = codec();
        let token = codec.encrypt(Some(&UserRecord::new())).unwrap();
        assert_eq!(
            codec.decrypt(token.as_str()),
            SessionState::Valid(UserRecord::new())
        );
    }

    #[test]
    fn null_payload_is_no_session() {
        let codec = codec();
        let token = codec.encrypt(None).unwrap();
        assert_eq!(codec.decrypt(token.as_str()), SessionState::NoSession);
    }

    #[test]
    fn flipping_any_ciphertext_byte_is_detected() {
        let codec = codec();
        let token = codec.encrypt(Some(&sample_user())).unwrap();
        let (iv, data) = token.as_str().split_once('.').unwrap();
        let ciphertext = STANDARD.decode(data).unwrap();

        for i in 0..ciphertext.len() {
            let mut tampered = ciphertext.clone();
            tampered[i] ^= 0x01;
            let forged = format!("{}.{}", iv, STANDARD.encode(&tampered));

            assert_eq!(
                codec.decrypt(&forged),
                SessionState::Malformed(TokenError::Authentication),
                "byte {} flip went undetected",
                i
            );
        }
    }

    #[test]
    fn tampered_iv_is_detected() {
        let codec = codec();
        let token = codec.encrypt(Some(&sample_user())).unwrap();
        let (iv, data) = token.as_str().split_once('.').unwrap();
        let mut iv = STANDARD.decode(iv).unwrap();
        iv[0] ^= 0x80;

        let forged = format!("{}.{}", STANDARD.encode(&iv), data);
        assert!(codec.decrypt(&forged).is_malformed());
    }

    #[test]
    fn same_payload_encrypts_differently_each_time() {
        let codec = codec();
        let user = sample_user();

        let first = codec.encrypt(Some(&user)).unwrap();
        let second = codec.encrypt(Some(&user)).unwrap();

        assert_ne!(first, second);
        assert_ne!(
            first.as_str().split_once('.').unwrap().0,
            second.as_str().split_once('.').unwrap().0
        );
        assert_eq!(codec.decrypt(first.as_str()).into_user(), Some(user.clone()));
        assert_eq!(codec.decrypt(second.as_str()).into_user(), Some(user));
    }

    #[test]
    fn malformed_input_never_panics() {
        let codec = codec();

        assert_eq!(codec.decrypt(""), SessionState::Malformed(TokenError::Empty));
        assert_eq!(
            codec.decrypt("not-a-token"),
            SessionState::Malformed(TokenError::MissingDelimiter)
        );
        assert_eq!(
            codec.decrypt("abc.def"),
            SessionState::Malformed(TokenError::InvalidIvLength)
        );
        assert!(codec.decrypt("....").is_malformed());
        assert!(codec.decrypt("AAAAAAAAAAAAAAAA.AAAA").is_malformed());
    }

    #[test]
    fn valid_ciphertext_of_non_object_json_is_rejected() {
        let codec = codec();
        let (ciphertext, iv) = aes::encrypt(&codec.key, b"[1,2,3]").unwrap();
        let token = SessionToken::new(&iv, &ciphertext);

        assert_eq!(
            codec.decrypt(token.as_str()),
            SessionState::Malformed(TokenError::InvalidPayload)
        );

        let (ciphertext, iv) = aes::encrypt(&codec.key, b"not json").unwrap();
        let token = SessionToken::new(&iv, &ciphertext);
        assert_eq!(
            codec.decrypt(token.as_str()),
            SessionState::Malformed(TokenError::InvalidPayload)
        );
    }

    #[test]
    fn codecs_from_the_same_secret_interoperate() {
        let issuer = SessionCodec::from_secret("shared-secret").unwrap();
        let verifier = SessionCodec::from_secret("shared-secret").unwrap();
        let user = sample_user();

        let token = issuer.encrypt(Some(&user)).unwrap();
        assert_eq!(verifier.decrypt(token.as_str()), SessionState::Valid(user));
    }

    #[test]
    fn codecs_from_different_secrets_do_not() {
        let issuer = SessionCodec::from_secret("secret-a").unwrap();
        let verifier = SessionCodec::from_secret("secret-b").unwrap();

        let token = issuer.encrypt(Some(&sample_user())).unwrap();
        assert_eq!(
            verifier.decrypt(token.as_str()),
            SessionState::Malformed(TokenError::Authentication)
        );
    }

    #[test]
    fn self_test_passes_with_a_valid_key() {
        codec().self_test().unwrap();
    }
}
