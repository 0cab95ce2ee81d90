//! Request bodies, response bodies, and stored row shapes.
//!
//! Row types mirror the columns the dashboard persists in its data store.
//! Every encrypted column is standard-alphabet base64 text.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Integration credentials
// ---------------------------------------------------------------------------

/// Plaintext credentials for a third-party integration.
///
/// This is the body of `POST /integrations/seal` and the response of
/// `POST /integrations/open`. It is serialised to JSON and encrypted as a
/// whole; only `service` and `user_id` are ever stored in the clear.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationCredential {
    /// Integration name, e.g. `"github"` or `"email"`.
    pub service: String,
    /// Owner of the integration.
    pub user_id: String,
    /// API token for token-based integrations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Delivery webhook for push-based integrations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// Any other form fields (`database_id`, `page_id`, ...). They sit at the
    /// top level of the JSON object next to the named fields.
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl fmt::Debug for IntegrationCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secrets stay out of logs, even at debug level.
        f.debug_struct("IntegrationCredential")
            .field("service", &self.service)
            .field("user_id", &self.user_id)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("webhook_url", &self.webhook_url.as_ref().map(|_| "[REDACTED]"))
            .field("metadata_keys", &self.metadata.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Stored integration row: clear-text routing columns plus the sealed
/// credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationRow {
    pub user_id: String,
    pub service: String,
    /// base64 ciphertext of the JSON-encoded [`IntegrationCredential`].
    pub encrypted_token: String,
    /// base64 of the 12-byte IV.
    pub iv: String,
    /// base64 of the 16-byte GCM authentication tag.
    pub auth_tag: String,
}

// ---------------------------------------------------------------------------
// Memories
// ---------------------------------------------------------------------------

/// Request body for `POST /memories/seal`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealMemoryRequest {
    pub user_id: String,
    /// Row id to seal under. A fresh UUID is assigned when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Arbitrary JSON memory content.
    pub payload: serde_json::Value,
}

/// Stored memory row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRow {
    pub id: String,
    pub user_id: String,
    /// base64 ciphertext of the JSON-encoded payload.
    pub encrypted_data: String,
    /// base64 of the 12-byte IV.
    pub iv: String,
    /// base64 of the 16-byte GCM authentication tag.
    pub tag: String,
}

/// Request body for `POST /memories/open`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenMemoriesRequest {
    pub rows: Vec<MemoryRow>,
}

/// One entry of a batch open. `content` is `None` when that row could not
/// be authenticated or parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenedMemory {
    pub id: String,
    pub content: Option<serde_json::Value>,
}

/// Response body for `POST /memories/open`, in request order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenMemoriesResponse {
    pub memories: Vec<OpenedMemory>,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"` or `"degraded"`.
    pub status: String,
    /// Whether an encryption key is loaded.
    pub key_loaded: bool,
}
