//! Sealing of memory payloads.
//!
//! A memory's content is arbitrary JSON. It is sealed as a whole into
//! `encrypted_data` / `iv` / `tag`; the row id and owner stay in the clear.

use common::protocol::{MemoryRow, OpenedMemory};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::{RecordBinding, RecordError};
use crate::crypto::{decrypt_with_aad, encrypt_with_aad, EncodedEnvelope, SecretKey};

const KIND: &str = "memory";

/// Seal `payload` for `user_id`. A fresh UUID v4 is used when `id` is `None`.
///
/// With [`RecordBinding::Bound`] the id is authenticated along with the
/// payload, so the returned [`MemoryRow::id`] must be stored unchanged. A row
/// re-keyed by the data store on insert can no longer be opened.
///
/// # Errors
///
/// [`RecordError::InvalidRecord`] for an empty `user_id` or `id`;
/// [`RecordError::Cipher`] if sealing fails.
pub fn seal_memory(
    user_id: &str,
    id: Option<String>,
    payload: &Value,
    key: &SecretKey,
    binding: RecordBinding,
) -> Result<MemoryRow, RecordError> {
    if user_id.trim().is_empty() {
        return Err(RecordError::InvalidRecord("user_id must not be empty"));
    }
    let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
    if id.trim().is_empty() {
        return Err(RecordError::InvalidRecord("id must not be empty"));
    }

    let plaintext =
        Zeroizing::new(serde_json::to_vec(payload).map_err(RecordError::Serialization)?);
    let aad = binding.associated_data(&[KIND, user_id, id.as_str()]);
    let envelope = encrypt_with_aad(&plaintext, &aad, key.as_bytes())?;
    let encoded = EncodedEnvelope::encode(&envelope);

    debug!(memory_id = %id, "memory sealed");

    Ok(MemoryRow {
        id,
        user_id: user_id.to_owned(),
        encrypted_data: encoded.ciphertext,
        iv: encoded.iv,
        tag: encoded.auth_tag,
    })
}

/// Authenticate, decrypt and parse one memory row.
///
/// # Errors
///
/// [`RecordError::Cipher`] for malformed columns or failed authentication;
/// [`RecordError::Payload`] if the authentic plaintext is not JSON.
pub fn open_memory(
    row: &MemoryRow,
    key: &SecretKey,
    binding: RecordBinding,
) -> Result<Value, RecordError> {
    let envelope = EncodedEnvelope {
        ciphertext: row.encrypted_data.clone(),
        iv: row.iv.clone(),
        auth_tag: row.tag.clone(),
    }
    .decode()?;

    let aad = binding.associated_data(&[KIND, row.user_id.as_str(), row.id.as_str()]);
    let plaintext = Zeroizing::new(decrypt_with_aad(&envelope, &aad, key.as_bytes())?);
    serde_json::from_slice(&plaintext).map_err(|_| RecordError::Payload)
}

/// Open a batch of rows. A row that fails comes back with `content: None`;
/// the failure is logged by row id and does not affect its neighbours.
pub fn open_memories(
    rows: &[MemoryRow],
    key: &SecretKey,
    binding: RecordBinding,
) -> Vec<OpenedMemory> {
    rows.iter()
        .map(|row| {
            let content = match open_memory(row, key, binding) {
                Ok(content) => Some(content),
                Err(e) => {
                    warn!(memory_id = %row.id, error = %e, "failed to open memory");
                    None
                }
            };
            OpenedMemory {
                id: row.id.clone(),
                content,
            }
        })
        .collect()
}
