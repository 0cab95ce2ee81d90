//! Sealing of third-party integration credentials.
//!
//! The whole [`IntegrationCredential`] is encrypted as JSON and stored in the
//! `encrypted_token` column. `service` and `user_id` stay in the clear for
//! lookups and are re-checked against the decrypted copy on open.

use common::protocol::{IntegrationCredential, IntegrationRow};
use tracing::debug;
use zeroize::Zeroizing;

use super::{RecordBinding, RecordError};
use crate::crypto::{decrypt_with_aad, encrypt_with_aad, CipherError, EncodedEnvelope, SecretKey};

const KIND: &str = "integration";

/// Field names owned by [`IntegrationCredential`]; extra form fields may not reuse them.
const NAMED_FIELDS: [&str; 4] = ["service", "user_id", "token", "webhook_url"];

/// Validate, serialise and seal a credential into a storable row.
///
/// # Errors
///
/// [`RecordError::InvalidRecord`] for an empty field, an extra field named
/// like a known one, or a credential with neither a token nor a webhook URL; [`RecordError::Cipher`] if sealing fails.
pub fn seal_integration(
    credential: &IntegrationCredential,
    key: &SecretKey,
    binding: RecordBinding,
) -> Result<IntegrationRow, RecordError> {
    validate(credential)?;

    let plaintext = Zeroizing::new(
        serde_json::to_vec(credential).map_err(RecordError::Serialization)?,
    );
    let aad = binding.associated_data(&[
        KIND,
        credential.user_id.as_str(),
        credential.service.as_str(),
    ]);
    let envelope = encrypt_with_aad(&plaintext, &aad, key.as_bytes())?;
    let encoded = EncodedEnvelope::encode(&envelope);

    debug!(service = %credential.service, "integration credential sealed");

    Ok(IntegrationRow {
        user_id: credential.user_id.clone(),
        service: credential.service.clone(),
        encrypted_token: encoded.ciphertext,
        iv: encoded.iv,
        auth_tag: encoded.auth_tag,
    })
}

/// Authenticate and decrypt a stored row back into its credential.
///
/// # Errors
///
/// [`CipherError::AuthenticationFailed`] (wrapped) for any tampering, a wrong
/// key, or a decrypted credential whose `service`/`user_id` disagree with the
/// row. [`CipherError::MalformedEnvelope`] for undecodable columns.
pub fn open_integration(
    row: &IntegrationRow,
    key: &SecretKey,
    binding: RecordBinding,
) -> Result<IntegrationCredential, RecordError> {
    let envelope = EncodedEnvelope {
        ciphertext: row.encrypted_token.clone(),
        iv: row.iv.clone(),
        auth_tag: row.auth_tag.clone(),
    }
    .decode()?;

    let aad = binding.associated_data(&[KIND, row.user_id.as_str(), row.service.as_str()]);
    let plaintext = Zeroizing::new(decrypt_with_aad(&envelope, &aad, key.as_bytes())?);

    let credential: IntegrationCredential =
        serde_json::from_slice(&plaintext).map_err(|_| RecordError::Payload)?;

    if credential.service != row.service || credential.user_id != row.user_id {
        return Err(CipherError::AuthenticationFailed.into());
    }
    Ok(credential)
}

fn validate(credential: &IntegrationCredential) -> Result<(), RecordError> {
    if credential.service.trim().is_empty() {
        return Err(RecordError::InvalidRecord("service must not be empty"));
    }
    if credential.user_id.trim().is_empty() {
        return Err(RecordError::InvalidRecord("user_id must not be empty"));
    }
    if NAMED_FIELDS
        .iter()
        .any(|name| credential.metadata.contains_key(*name))
    {
        return Err(RecordError::InvalidRecord(
            "extra fields must not shadow a named field",
        ));
    }
    match (trimmed(&credential.token), trimmed(&credential.webhook_url)) {
        (None, None) => Err(RecordError::InvalidRecord(
            "either token or webhook_url is required",
        )),
        (Some(""), _) => Err(RecordError::InvalidRecord("token must not be empty")),
        (_, Some("")) => Err(RecordError::InvalidRecord("webhook_url must not be empty")),
        _ => Ok(()),
    }
}

fn trimmed(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim)
}
