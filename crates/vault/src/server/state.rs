//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use common::ServiceError;

use crate::crypto::SecretKey;
use crate::records::RecordBinding;

/// Application state shared across all request handlers.
///
/// Cloning is cheap: the key sits behind an `Arc` and is only ever read.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Service key; `None` only in tests that exercise the degraded path.
    pub key: Option<Arc<SecretKey>>,
    /// Whether row identifiers are bound into authentication tags.
    pub binding: RecordBinding,
}

impl AppState {
    /// Create a new [`AppState`] holding `key`.
    pub fn new(key: SecretKey, binding: RecordBinding) -> Self {
        Self {
            key: Some(Arc::new(key)),
            binding,
        }
    }

    /// Borrow the key, or report the service as unavailable.
    pub fn key(&self) -> Result<&SecretKey, ServiceError> {
        self.key
            .as_deref()
            .ok_or_else(|| ServiceError::Unavailable("encryption key not loaded".into()))
    }
}

impl Default for AppState {
    /// Creates a default [`AppState`] with no key, suitable for tests.
    fn default() -> Self {
        Self {
            key: None,
            binding: RecordBinding::default(),
        }
    }
}
