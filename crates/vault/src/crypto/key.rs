//! [`SecretKey`]: the service's AES-256 key held in memory.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::cipher::{CipherError, KEY_LEN};

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// The bytes are overwritten with zeroes when the key is dropped, and the
/// `Debug` output never includes them.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    /// Import raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKey`] unless `bytes` is exactly [`KEY_LEN`] long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CipherError> {
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| CipherError::InvalidKey)?;
        Ok(Self(key))
    }

    /// Import a standard-alphabet base64 key, as found in configuration.
    ///
    /// Rows sealed under a 32-character passphrase used as raw key bytes open
    /// with the base64 encoding of that passphrase (`printf %s "$PASS" | base64`).
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKey`] for invalid base64 or a decoded
    /// length other than [`KEY_LEN`].
    pub fn from_base64(encoded: &str) -> Result<Self, CipherError> {
        let decoded = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|_| CipherError::InvalidKey)?,
        );
        Self::from_slice(&decoded)
    }

    /// Borrow the raw key bytes for a single cipher call.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("SecretKey([REDACTED])")
    }
}
