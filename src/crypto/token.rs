//! Wire format of the session cookie value: `base64(iv) "." base64(ciphertext || tag)`.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

use crate::crypto::aes::NONCE_SIZE;
use crate::crypto::key::STANDARD_LENIENT;

/// Separator between the IV and ciphertext components.
///
/// Must stay outside the base64 alphabet so the first occurrence is always the split point.
pub const DELIMITER: char = '.';

/// Why a cookie value could not be turned back into a session.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is empty")]
    Empty,

    #[error("token has no delimiter")]
    MissingDelimiter,

    #[error("token has an empty component")]
    EmptyComponent,

    #[error("token component is not valid base64")]
    InvalidBase64,

    #[error("token IV must be {NONCE_SIZE} bytes")]
    InvalidIvLength,

    #[error("token failed authentication")]
    Authentication,

    #[error("token payload is not a JSON object or null")]
    InvalidPayload,
}

/// An encrypted session token as stored in the cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Formats a token from its raw IV and ciphertext.
    pub fn new(iv: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> Self {
        Self(format!(
            "{}{}{}",
            STANDARD.encode(iv),
            DELIMITER,
            STANDARD.encode(ciphertext)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The decoded components of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenParts {
    pub iv: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

impl TokenParts {
    /// Splits on the first delimiter and decodes both halves.
    pub fn parse(token: &str) -> Result<Self, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Empty);
        }

        let (iv_b64, data_b64) = token
            .split_once(DELIMITER)
            .ok_or(TokenError::MissingDelimiter)?;

        if iv_b64.is_empty() || data_b64.is_empty() {
            return Err(TokenError::EmptyComponent);
        }

        let iv_bytes = STANDARD_LENIENT
            .decode(iv_b64)
            .map_err(|_| TokenError::InvalidBase64)?;
        let ciphertext = STANDARD_LENIENT
            .decode(data_b64)
            .map_err(|_| TokenError::InvalidBase64)?;

        let iv: [u8; NONCE_SIZE] = iv_bytes
            .as_slice()
            .try_into()
            .map_err(|_| TokenError::InvalidIvLength)?;

        Ok(Self { iv, ciphertext })
    }
}
