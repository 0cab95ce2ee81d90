//! AES-256-GCM sealing primitives.
//!
//! This module is free of HTTP and storage concerns. It provides the codec
//! (`cipher`), the in-memory key type (`key`), and the base64 boundary form
//! of an envelope (`envelope`).
//!
//! # Envelope format
//!
//! ```text
//! ciphertext  base64, same length as the plaintext before encoding
//! iv          base64 of 12 bytes
//! auth_tag    base64 of 16 bytes
//! ```
//!
//! The three fields are verified together; none of them is meaningful alone.

pub mod cipher;
pub mod envelope;
pub mod key;

pub use cipher::{
    decrypt, decrypt_with_aad, encrypt, encrypt_with_aad, CipherError, EncryptedEnvelope, IV_LEN,
    KEY_LEN, TAG_LEN,
};
pub use envelope::EncodedEnvelope;
pub use key::SecretKey;
