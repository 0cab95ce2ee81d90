//! Storage adapters that seal dashboard records before they are persisted.
//!
//! Each adapter serialises the sensitive part of a record to JSON, seals it
//! with [`crate::crypto`], and lays the base64 envelope out in the column
//! names the data store already uses.
//!
//! # Record binding
//!
//! With [`RecordBinding::Bound`] the row's identifying columns are fed to GCM
//! as associated data, so an envelope copied onto another row fails
//! authentication. [`RecordBinding::Unbound`] seals with no associated data
//! and opens rows written that way.

pub mod integration;
pub mod memory;

pub use integration::{open_integration, seal_integration};
pub use memory::{open_memories, open_memory, seal_memory};

use thiserror::Error;

use crate::crypto::CipherError;

/// Errors produced by the record adapters.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// The plaintext record failed validation before sealing.
    #[error("invalid record: {0}")]
    InvalidRecord(&'static str),

    /// The plaintext record could not be serialised.
    #[error("failed to serialise record")]
    Serialization(#[source] serde_json::Error),

    /// Authentic plaintext that is not the expected JSON shape. The parser
    /// message is dropped because it can quote plaintext.
    #[error("decrypted payload is not valid record JSON")]
    Payload,
}

/// Whether row identifiers are bound into the authentication tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordBinding {
    /// No associated data.
    Unbound,
    /// Record kind plus identifying columns as associated data.
    #[default]
    Bound,
}

impl RecordBinding {
    /// Map the `BIND_RECORD_CONTEXT` setting onto a binding.
    pub fn from_flag(bind: bool) -> Self {
        if bind {
            Self::Bound
        } else {
            Self::Unbound
        }
    }

    fn associated_data(self, parts: &[&str]) -> Vec<u8> {
        match self {
            Self::Unbound => Vec::new(),
            Self::Bound => build_aad(parts),
        }
    }
}

/// Each part as `[u32 BE length][UTF-8 bytes]`, so `("ab", "c")` and
/// `("a", "bc")` never collide.
fn build_aad(parts: &[&str]) -> Vec<u8> {
    let len = parts.iter().map(|p| 4 + p.len()).sum();
    let mut aad = Vec::with_capacity(len);
    for part in parts {
        aad.extend_from_slice(&(part.len() as u32).to_be_bytes());
        aad.extend_from_slice(part.as_bytes());
    }
    aad
}
