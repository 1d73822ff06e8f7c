//! API token secret generation, hashing, and bearer parsing.
//!
//! A bearer is `{nano_id}.{secret}`. Only the SHA-256 of the secret is ever
//! stored; the plaintext exists once, in the issuance response.

use std::fmt;

use rand::{rngs::OsRng, seq::SliceRandom};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroize;

/// Number of characters in a generated secret.
pub const API_TOKEN_SECRET_CHARS: usize = 21;

/// Separates the owner nano-id from the secret in a bearer.
pub const BEARER_SEPARATOR: char = '.';

/// Length in bytes of a stored value hash.
pub const VALUE_HASH_BYTES: usize = 32;

/// `[A-Za-z0-9_]`; 21 draws give a little over 125 bits.
const SECRET_ALPHABET: &[u8; 63] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiTokenError {
    #[error("api token format is invalid")]
    InvalidFormat,

    #[error("api token hash encoding is invalid")]
    InvalidHashEncoding,
}

/// Plaintext token secret. Wiped on drop and never printed.
#[derive(Clone)]
pub struct ApiTokenSecret {
    value: String,
}

impl ApiTokenSecret {
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn value_hash(&self) -> ValueHash {
        ValueHash::digest(self.value.as_bytes())
    }
}

impl fmt::Debug for ApiTokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiTokenSecret(**redacted**)")
    }
}

impl Drop for ApiTokenSecret {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

/// SHA-256 of a token secret.
///
/// Equality is constant-time so comparing candidates during authentication
/// does not leak how many leading bytes matched.
#[derive(Clone, Copy)]
pub struct ValueHash([u8; VALUE_HASH_BYTES]);

impl ValueHash {
    #[must_use]
    pub fn digest(secret: &[u8]) -> Self {
        Self(Sha256::digest(secret).into())
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; VALUE_HASH_BYTES]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; VALUE_HASH_BYTES] {
        &self.0
    }

    /// Lowercase hex, as persisted in `value_sha`.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }

    /// Parse the persisted hex form.
    ///
    /// # Errors
    ///
    /// Returns [`ApiTokenError::InvalidHashEncoding`] unless `hex` is exactly
    /// 64 hex digits.
    pub fn from_hex(hex: &str) -> Result<Self, ApiTokenError> {
        if hex.len() != VALUE_HASH_BYTES * 2 {
            return Err(ApiTokenError::InvalidHashEncoding);
        }

        let mut bytes = [0_u8; VALUE_HASH_BYTES];

        for (byte, pair) in bytes.iter_mut().zip(hex.as_bytes().chunks_exact(2)) {
            let [hi, lo] = pair else {
                return Err(ApiTokenError::InvalidHashEncoding);
            };

            let hi = decode_hex_nibble(*hi).ok_or(ApiTokenError::InvalidHashEncoding)?;
            let lo = decode_hex_nibble(*lo).ok_or(ApiTokenError::InvalidHashEncoding)?;

            *byte = (hi << 4) | lo;
        }

        Ok(Self(bytes))
    }
}

impl ConstantTimeEq for ValueHash {
    fn ct_eq(&self, other: &Self) -> subtle::Choice {
        self.0.ct_eq(&other.0)
    }
}

impl PartialEq for ValueHash {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for ValueHash {}

impl fmt::Debug for ValueHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueHash({})", self.to_hex())
    }
}

impl fmt::Display for ValueHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A bearer split into its lookup key and secret hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBearer {
    pub nano_id: String,
    pub value_hash: ValueHash,
}

/// Draw a fresh secret from the operating system's CSPRNG.
#[must_use]
pub fn generate_api_token_secret() -> ApiTokenSecret {
    let mut rng = OsRng;

    let value = (0..API_TOKEN_SECRET_CHARS)
        .filter_map(|_| SECRET_ALPHABET.choose(&mut rng).copied().map(char::from))
        .collect();

    ApiTokenSecret { value }
}

/// Assemble the bearer handed to the client.
///
/// Without a nano-id the raw secret is returned. Such a token cannot be
/// presented through the header path.
#[must_use]
pub fn format_bearer(nano_id: Option<&str>, secret: &ApiTokenSecret) -> String {
    match nano_id {
        Some(nano_id) if !nano_id.is_empty() => {
            format!("{nano_id}{BEARER_SEPARATOR}{}", secret.expose())
        }
        _ => secret.expose().to_owned(),
    }
}

/// Split a presented bearer and hash its secret half.
///
/// The secret is hashed straight from the borrowed input so no owned copy of
/// it outlives this call.
///
/// # Errors
///
/// Returns [`ApiTokenError::InvalidFormat`] unless the bearer holds exactly one
/// separator with non-empty text on both sides.
pub fn parse_bearer(bearer: &str) -> Result<ParsedBearer, ApiTokenError> {
    let (nano_id, secret) = bearer
        .split_once(BEARER_SEPARATOR)
        .ok_or(ApiTokenError::InvalidFormat)?;

    if nano_id.is_empty() || secret.is_empty() || secret.contains(BEARER_SEPARATOR) {
        return Err(ApiTokenError::InvalidFormat);
    }

    Ok(ParsedBearer {
        nano_id: nano_id.to_owned(),
        value_hash: ValueHash::digest(secret.as_bytes()),
    })
}

fn decode_hex_nibble(value: u8) -> Option<u8> {
    match value {
        b'0'..=b'9' => Some(value - b'0'),
        b'a'..=b'f' => Some(value - b'a' + 10),
        b'A'..=b'F' => Some(value - b'A' + 10),
        _ => None,
    }
}
