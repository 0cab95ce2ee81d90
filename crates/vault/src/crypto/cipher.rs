//! AES-256-GCM encryption and decryption of opaque byte payloads.
//!
//! GCM defines its output as `ciphertext || tag`. This module uses the
//! detached in-place API so the two halves never share a buffer: the tag is
//! returned as its own envelope field and handed back separately on decrypt.
//! An envelope without its tag cannot be opened.
//!
//! **Never reuse an IV under the same key.** GCM nonce reuse breaks both
//! confidentiality and authentication; every call draws a fresh IV.

use aes_gcm::{
    aead::{rand_core::RngCore, AeadInPlace, KeyInit, OsRng},
    Aes256Gcm, Nonce, Tag,
};
use thiserror::Error;
use zeroize::Zeroize;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of a GCM IV (12 bytes = 96 bits).
pub const IV_LEN: usize = 12;

/// Byte length of a GCM authentication tag (16 bytes = 128 bits).
pub const TAG_LEN: usize = 16;

/// Output of [`encrypt`]: the three values that must travel together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    /// Ciphertext, same length as the plaintext.
    pub ciphertext: Vec<u8>,
    /// IV drawn for this encryption only.
    pub iv: [u8; IV_LEN],
    /// GCM tag over the ciphertext and any associated data.
    pub auth_tag: [u8; TAG_LEN],
}

/// Errors produced by the cipher layer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CipherError {
    /// The key is not exactly [`KEY_LEN`] bytes, or could not be decoded.
    #[error("invalid key: expected {KEY_LEN} bytes")]
    InvalidKey,

    /// The OS random source could not be reached.
    #[error("cryptographic primitives unavailable")]
    CryptoUnavailable,

    /// Wrong key, wrong IV, altered ciphertext, altered tag, or mismatched
    /// associated data. No plaintext is returned.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The plaintext exceeds what GCM can encrypt under one IV.
    #[error("plaintext too large for AES-GCM")]
    PlaintextTooLarge,

    /// A wire-encoded envelope field is not valid base64 or has the wrong length.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(&'static str),
}

/// Source of per-call IVs.
#[cfg_attr(test, mockall::automock)]
pub trait NonceSource: Send + Sync {
    /// Fill `iv` with fresh unpredictable bytes.
    fn fill_iv(&self, iv: &mut [u8; IV_LEN]) -> Result<(), CipherError>;
}

/// [`NonceSource`] backed by the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsNonceSource;

impl NonceSource for OsNonceSource {
    fn fill_iv(&self, iv: &mut [u8; IV_LEN]) -> Result<(), CipherError> {
        OsRng
            .try_fill_bytes(iv)
            .map_err(|_| CipherError::CryptoUnavailable)
    }
}

/// Encrypt `plaintext` with AES-256-GCM and no associated data.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKey`] if `key` is not [`KEY_LEN`] bytes and
/// [`CipherError::CryptoUnavailable`] if no IV can be drawn.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<EncryptedEnvelope, CipherError> {
    encrypt_with_aad(plaintext, &[], key)
}

/// Encrypt `plaintext`, binding `aad` into the authentication tag.
///
/// The same `aad` must be supplied to [`decrypt_with_aad`].
pub fn encrypt_with_aad(
    plaintext: &[u8],
    aad: &[u8],
    key: &[u8],
) -> Result<EncryptedEnvelope, CipherError> {
    seal(plaintext, aad, key, &OsNonceSource)
}

/// Encrypt with an explicit IV source.
///
/// # Errors
///
/// As [`encrypt`], plus [`CipherError::PlaintextTooLarge`].
pub fn seal(
    plaintext: &[u8],
    aad: &[u8],
    key: &[u8],
    nonces: &dyn NonceSource,
) -> Result<EncryptedEnvelope, CipherError> {
    let cipher = build_cipher(key)?;

    let mut iv = [0u8; IV_LEN];
    nonces.fill_iv(&mut iv)?;

    let mut ciphertext = plaintext.to_vec();
    let tag = match cipher.encrypt_in_place_detached(Nonce::from_slice(&iv), aad, &mut ciphertext)
    {
        Ok(tag) => tag,
        Err(_) => {
            ciphertext.zeroize();
            return Err(CipherError::PlaintextTooLarge);
        }
    };

    let mut auth_tag = [0u8; TAG_LEN];
    auth_tag.copy_from_slice(&tag);

    Ok(EncryptedEnvelope {
        ciphertext,
        iv,
        auth_tag,
    })
}

/// Decrypt an envelope produced by [`encrypt`].
///
/// # Errors
///
/// Returns [`CipherError::InvalidKey`] if `key` is not [`KEY_LEN`] bytes.
/// Returns [`CipherError::AuthenticationFailed`] if anything about the
/// envelope or key differs from encryption time.
pub fn decrypt(envelope: &EncryptedEnvelope, key: &[u8]) -> Result<Vec<u8>, CipherError> {
    decrypt_with_aad(envelope, &[], key)
}

/// Decrypt an envelope produced by [`encrypt_with_aad`] with the same `aad`.
pub fn decrypt_with_aad(
    envelope: &EncryptedEnvelope,
    aad: &[u8],
    key: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let cipher = build_cipher(key)?;

    let mut buffer = envelope.ciphertext.clone();
    let verified = cipher.decrypt_in_place_detached(
        Nonce::from_slice(&envelope.iv),
        aad,
        &mut buffer,
        Tag::from_slice(&envelope.auth_tag),
    );

    match verified {
        Ok(()) => Ok(buffer),
        Err(_) => {
            // The keystream may already have been applied; scrub it.
            buffer.zeroize();
            Err(CipherError::AuthenticationFailed)
        }
    }
}

fn build_cipher(key: &[u8]) -> Result<Aes256Gcm, CipherError> {
    if key.len() != KEY_LEN {
        return Err(CipherError::InvalidKey);
    }
    Aes256Gcm::new_from_slice(key).map_err(|_| CipherError::InvalidKey)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use aes_gcm::aead::rand_core::RngCore;
    use aes_gcm::aead::Aead;
    use proptest::prelude::*;

    use super::*;
    use crate::crypto::SecretKey;

    const FIXED_KEY: [u8; KEY_LEN] = [0x42; KEY_LEN];

    fn random_key() -> Vec<u8> {
        let mut key = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    fn zero_iv_source() -> MockNonceSource {
        let mut source = MockNonceSource::new();
        source.expect_fill_iv().returning(|iv| {
            iv.fill(0);
            Ok(())
        });
        source
    }

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn hello_world_scenario() {
        let envelope = encrypt(b"hello world", &FIXED_KEY).unwrap();
        assert_eq!(envelope.ciphertext.len(), 11);
        assert_eq!(envelope.iv.len(), IV_LEN);
        assert_eq!(envelope.auth_tag.len(), TAG_LEN);

        let plaintext = decrypt(&envelope, &FIXED_KEY).unwrap();
        assert_eq!(plaintext, b"hello world");

        let mut tampered = envelope.clone();
        let last = tampered.ciphertext.len() - 1;
        tampered.ciphertext[last] = tampered.ciphertext[last].wrapping_add(1);
        assert_eq!(
            decrypt(&tampered, &FIXED_KEY),
            Err(CipherError::AuthenticationFailed)
        );
    }

    #[test]
    fn empty_plaintext_round_trip() {
        let envelope = encrypt(b"", &FIXED_KEY).unwrap();
        assert!(envelope.ciphertext.is_empty());
        assert_eq!(envelope.iv.len(), 12);
        assert_eq!(envelope.auth_tag.len(), 16);
        assert_eq!(decrypt(&envelope, &FIXED_KEY).unwrap(), b"");
    }

    #[test]
    fn empty_plaintext_tag_still_authenticates() {
        let mut envelope = encrypt(b"", &FIXED_KEY).unwrap();
        envelope.auth_tag[0] ^= 0x01;
        assert_eq!(
            decrypt(&envelope, &FIXED_KEY),
            Err(CipherError::AuthenticationFailed)
        );
    }

    #[test]
    fn matches_published_gcm_vectors() {
        // AES-256-GCM, all-zero key and IV (McGrew & Viega test cases 13 and 14).
        let key = [0u8; KEY_LEN];
        let source = zero_iv_source();

        let empty = seal(b"", &[], &key, &source).unwrap();
        assert_eq!(empty.auth_tag.to_vec(), hex("530f8afbc74536b9a963b4f1c4cb738b"));

        let block = seal(&[0u8; 16], &[], &key, &source).unwrap();
        assert_eq!(block.ciphertext, hex("cea7403d4d606b6e074ec5d3baf39d18"));
        assert_eq!(block.auth_tag.to_vec(), hex("d0d1c8a799996bf0265b98b5d48ab919"));
    }

    #[test]
    fn split_fields_match_fused_gcm_output() {
        let source = zero_iv_source();
        let envelope = seal(b"token=abc123", &[], &FIXED_KEY, &source).unwrap();

        let cipher = Aes256Gcm::new_from_slice(&FIXED_KEY).unwrap();
        let fused = cipher
            .encrypt(Nonce::from_slice(&[0u8; IV_LEN]), b"token=abc123".as_ref())
            .unwrap();

        let mut joined = envelope.ciphertext.clone();
        joined.extend_from_slice(&envelope.auth_tag);
        assert_eq!(joined, fused);
    }

    #[test]
    fn wrong_key_fails_decryption() {
        let key1 = random_key();
        let key2 = random_key();
        let envelope = encrypt(b"secret", &key1).unwrap();
        assert_eq!(
            decrypt(&envelope, &key2),
            Err(CipherError::AuthenticationFailed)
        );
    }

    #[test]
    fn invalid_key_length_rejected() {
        assert_eq!(encrypt(b"x", &[0u8; 16]), Err(CipherError::InvalidKey));
        assert_eq!(encrypt(b"x", &[]), Err(CipherError::InvalidKey));

        let envelope = encrypt(b"x", &FIXED_KEY).unwrap();
        assert_eq!(decrypt(&envelope, &[0u8; 31]), Err(CipherError::InvalidKey));
    }

    #[test]
    fn every_ciphertext_bit_flip_is_detected() {
        let envelope = encrypt(b"webhook", &FIXED_KEY).unwrap();
        for byte in 0..envelope.ciphertext.len() {
            for bit in 0..8 {
                let mut tampered = envelope.clone();
                tampered.ciphertext[byte] ^= 1 << bit;
                assert_eq!(
                    decrypt(&tampered, &FIXED_KEY),
                    Err(CipherError::AuthenticationFailed),
                    "flip at byte {byte} bit {bit} went undetected"
                );
            }
        }
    }

    #[test]
    fn every_iv_bit_flip_is_detected() {
        let envelope = encrypt(b"api token", &FIXED_KEY).unwrap();
        for byte in 0..IV_LEN {
            for bit in 0..8 {
                let mut tampered = envelope.clone();
                tampered.iv[byte] ^= 1 << bit;
                assert_eq!(
                    decrypt(&tampered, &FIXED_KEY),
                    Err(CipherError::AuthenticationFailed)
                );
            }
        }
    }

    #[test]
    fn swapped_tag_is_detected() {
        let a = encrypt(b"same length", &FIXED_KEY).unwrap();
        let b = encrypt(b"same length", &FIXED_KEY).unwrap();
        let mut swapped = a.clone();
        swapped.auth_tag = b.auth_tag;
        assert_eq!(
            decrypt(&swapped, &FIXED_KEY),
            Err(CipherError::AuthenticationFailed)
        );
    }

    #[test]
    fn truncated_ciphertext_is_detected() {
        let mut envelope = encrypt(b"payload", &FIXED_KEY).unwrap();
        envelope.ciphertext.pop();
        assert_eq!(
            decrypt(&envelope, &FIXED_KEY),
            Err(CipherError::AuthenticationFailed)
        );
    }

    #[test]
    fn associated_data_is_bound() {
        let envelope = encrypt_with_aad(b"payload", b"user-1/github", &FIXED_KEY).unwrap();
        assert_eq!(
            decrypt_with_aad(&envelope, b"user-1/github", &FIXED_KEY).unwrap(),
            b"payload"
        );
        assert_eq!(
            decrypt_with_aad(&envelope, b"user-2/github", &FIXED_KEY),
            Err(CipherError::AuthenticationFailed)
        );
        assert_eq!(
            decrypt(&envelope, &FIXED_KEY),
            Err(CipherError::AuthenticationFailed)
        );
    }

    #[test]
    fn ivs_are_unique_across_many_calls() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let envelope = encrypt(b"x", &FIXED_KEY).unwrap();
            assert!(seen.insert(envelope.iv), "duplicate IV generated");
        }
    }

    #[test]
    fn concurrent_calls_share_only_the_key() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 250;

        let key = Arc::new(SecretKey::from_slice(&FIXED_KEY).unwrap());
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let key = Arc::clone(&key);
                thread::spawn(move || {
                    (0..PER_THREAD)
                        .map(|i| {
                            let plaintext = format!("thread {t} message {i}").into_bytes();
                            let envelope = encrypt(&plaintext, key.as_bytes()).unwrap();
                            assert_eq!(decrypt(&envelope, key.as_bytes()).unwrap(), plaintext);
                            envelope.iv
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for iv in handle.join().unwrap() {
                assert!(seen.insert(iv), "duplicate IV across threads");
            }
        }
        assert_eq!(seen.len(), THREADS * PER_THREAD);
    }

    #[test]
    fn unavailable_random_source_is_reported() {
        let mut source = MockNonceSource::new();
        source
            .expect_fill_iv()
            .returning(|_| Err(CipherError::CryptoUnavailable));
        assert_eq!(
            seal(b"x", &[], &FIXED_KEY, &source),
            Err(CipherError::CryptoUnavailable)
        );
    }

    #[test]
    fn key_is_checked_before_drawing_an_iv() {
        let mut source = MockNonceSource::new();
        source.expect_fill_iv().never();
        assert_eq!(
            seal(b"x", &[], &[0u8; 8], &source),
            Err(CipherError::InvalidKey)
        );
    }

    proptest! {
        #[test]
        fn round_trip_law(plaintext in proptest::collection::vec(any::<u8>(), 0..512)) {
            let envelope = encrypt(&plaintext, &FIXED_KEY).unwrap();
            prop_assert_eq!(envelope.ciphertext.len(), plaintext.len());
            prop_assert_eq!(decrypt(&envelope, &FIXED_KEY).unwrap(), plaintext);
        }
    }
}
