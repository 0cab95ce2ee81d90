//! Axum request handlers for all service endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{
    protocol::{
        ErrorResponse, HealthResponse, IntegrationCredential, IntegrationRow, MemoryRow,
        OpenMemoriesRequest, OpenMemoriesResponse, SealMemoryRequest,
    },
    ServiceError,
};
use tracing::warn;

use super::state::AppState;
use crate::crypto::CipherError;
use crate::records::{self, RecordError};

/// Handler error: a [`ServiceError`] rendered as an [`ErrorResponse`].
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        let service = match &err {
            RecordError::Cipher(CipherError::AuthenticationFailed) => {
                ServiceError::AuthenticationFailed("envelope did not authenticate".into())
            }
            RecordError::Cipher(CipherError::CryptoUnavailable) => {
                ServiceError::Unavailable("random source unavailable".into())
            }
            RecordError::Cipher(CipherError::InvalidKey) => {
                ServiceError::EncryptionFailure("service key rejected by cipher".into())
            }
            RecordError::Cipher(CipherError::MalformedEnvelope(_) | CipherError::PlaintextTooLarge)
            | RecordError::InvalidRecord(_)
            | RecordError::Payload => ServiceError::BadRequest(err.to_string()),
            RecordError::Serialization(_) => ServiceError::Internal(err.to_string()),
        };
        Self(service)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = match &self.0 {
            ServiceError::BadRequest(m)
            | ServiceError::AuthenticationFailed(m)
            | ServiceError::EncryptionFailure(m)
            | ServiceError::Unavailable(m)
            | ServiceError::Internal(m) => m.clone(),
        };
        (status, Json(ErrorResponse::new(self.0.code(), message))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// `POST /integrations/seal` — seal a credential into a storable row.
pub async fn seal_integration(
    State(state): State<AppState>,
    Json(credential): Json<IntegrationCredential>,
) -> ApiResult<IntegrationRow> {
    let key = state.key()?;
    let row = records::seal_integration(&credential, key, state.binding)?;
    Ok(Json(row))
}

/// `POST /integrations/open` — authenticate and decrypt a stored row.
pub async fn open_integration(
    State(state): State<AppState>,
    Json(row): Json<IntegrationRow>,
) -> ApiResult<IntegrationCredential> {
    let key = state.key()?;
    let credential = records::open_integration(&row, key, state.binding).map_err(|e| {
        warn!(service = %row.service, error = %e, "failed to open integration");
        e
    })?;
    Ok(Json(credential))
}

/// `POST /memories/seal` — seal a JSON memory payload.
pub async fn seal_memory(
    State(state): State<AppState>,
    Json(req): Json<SealMemoryRequest>,
) -> ApiResult<MemoryRow> {
    let key = state.key()?;
    let row = records::seal_memory(&req.user_id, req.id, &req.payload, key, state.binding)?;
    Ok(Json(row))
}

/// `POST /memories/open` — open a batch of memory rows.
///
/// Always `200 OK` once the key is loaded; rows that fail carry
/// `content: null`.
pub async fn open_memories(
    State(state): State<AppState>,
    Json(req): Json<OpenMemoriesRequest>,
) -> ApiResult<OpenMemoriesResponse> {
    let key = state.key()?;
    let memories = records::open_memories(&req.rows, key, state.binding);
    Ok(Json(OpenMemoriesResponse { memories }))
}

/// `GET /health` — liveness and readiness check.
///
/// Returns `200 OK` when a key is loaded, `503 Service Unavailable` otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let key_loaded = state.key.is_some();

    let (status_code, status_str) = if key_loaded {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status: status_str.into(),
        key_loaded,
    };
    (status_code, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}
