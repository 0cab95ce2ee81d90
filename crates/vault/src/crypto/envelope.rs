//! Base64 boundary form of an [`EncryptedEnvelope`].

use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::cipher::{CipherError, EncryptedEnvelope, IV_LEN, TAG_LEN};

/// The three envelope fields as standard-alphabet base64 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedEnvelope {
    pub ciphertext: String,
    pub iv: String,
    pub auth_tag: String,
}

impl EncodedEnvelope {
    /// Encode each envelope field independently.
    pub fn encode(envelope: &EncryptedEnvelope) -> Self {
        Self {
            ciphertext: STANDARD.encode(&envelope.ciphertext),
            iv: STANDARD.encode(envelope.iv),
            auth_tag: STANDARD.encode(envelope.auth_tag),
        }
    }

    /// Decode back into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::MalformedEnvelope`] if any field is not base64,
    /// the IV is not [`IV_LEN`] bytes, or the tag is not [`TAG_LEN`] bytes.
    pub fn decode(&self) -> Result<EncryptedEnvelope, CipherError> {
        let ciphertext = STANDARD
            .decode(&self.ciphertext)
            .map_err(|_| CipherError::MalformedEnvelope("ciphertext is not valid base64"))?;
        let iv = decode_fixed::<IV_LEN>(&self.iv, "iv is not valid base64", "iv must be 12 bytes")?;
        let auth_tag = decode_fixed::<TAG_LEN>(
            &self.auth_tag,
            "auth tag is not valid base64",
            "auth tag must be 16 bytes",
        )?;
        Ok(EncryptedEnvelope {
            ciphertext,
            iv,
            auth_tag,
        })
    }
}

fn decode_fixed<const N: usize>(
    encoded: &str,
    not_base64: &'static str,
    wrong_len: &'static str,
) -> Result<[u8; N], CipherError> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| CipherError::MalformedEnvelope(not_base64))?;
    bytes
        .try_into()
        .map_err(|_| CipherError::MalformedEnvelope(wrong_len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::cipher::{decrypt, encrypt, KEY_LEN};

    const KEY: [u8; KEY_LEN] = [0x11; KEY_LEN];

    #[test]
    fn encoded_envelope_still_decrypts() {
        let envelope = encrypt(b"hello world", &KEY).unwrap();
        let encoded = EncodedEnvelope::encode(&envelope);
        assert_eq!(encoded.iv.len(), 16);
        assert_eq!(encoded.auth_tag.len(), 24);

        let decoded = encoded.decode().unwrap();
        assert_eq!(decrypt(&decoded, &KEY).unwrap(), b"hello world");
    }

    #[test]
    fn empty_ciphertext_encodes_to_empty_string() {
        let encoded = EncodedEnvelope::encode(&encrypt(b"", &KEY).unwrap());
        assert_eq!(encoded.ciphertext, "");
        assert!(encoded.decode().unwrap().ciphertext.is_empty());
    }

    #[test]
    fn rejects_invalid_base64() {
        let mut encoded = EncodedEnvelope::encode(&encrypt(b"x", &KEY).unwrap());
        encoded.ciphertext = "%%%".into();
        assert!(matches!(
            encoded.decode(),
            Err(CipherError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn rejects_wrong_iv_length() {
        let mut encoded = EncodedEnvelope::encode(&encrypt(b"x", &KEY).unwrap());
        encoded.iv = STANDARD.encode([0u8; 16]);
        assert_eq!(
            encoded.decode(),
            Err(CipherError::MalformedEnvelope("iv must be 12 bytes"))
        );
    }

    #[test]
    fn rejects_truncated_tag() {
        let mut encoded = EncodedEnvelope::encode(&encrypt(b"x", &KEY).unwrap());
        encoded.auth_tag = STANDARD.encode([0u8; 12]);
        assert_eq!(
            encoded.decode(),
            Err(CipherError::MalformedEnvelope("auth tag must be 16 bytes"))
        );
    }

    #[test]
    fn url_safe_alphabet_is_rejected() {
        let mut encoded = EncodedEnvelope::encode(&encrypt(b"x", &KEY).unwrap());
        encoded.ciphertext = "-_-_".into();
        assert!(encoded.decode().is_err());
    }
}
