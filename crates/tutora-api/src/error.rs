//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Library errors
//! (`UploadError`, `StorageError`) convert into `AppError` here so every
//! failure renders with the same body shape.

use axum::{
    extract::multipart::MultipartError,
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use tutora_core::{AppError, ErrorMetadata, LogLevel};
use tutora_storage::StorageError;
use tutora_upload::UploadError;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from tutora-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl From<MultipartError> for HttpAppError {
    fn from(err: MultipartError) -> Self {
        let app = if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::InvalidInput(format!("Invalid multipart body: {}", err.body_text()))
        };
        HttpAppError(app)
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::UploadFailed(msg)
            | StorageError::DeleteFailed(msg)
            | StorageError::Unreachable(msg)
            | StorageError::ProvisioningFailed(msg)
            | StorageError::BackendError(msg) => AppError::Storage(msg),
            StorageError::IoError(err) => AppError::Internal(format!("IO error: {}", err)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        };
        HttpAppError(app)
    }
}

impl From<UploadError> for HttpAppError {
    fn from(err: UploadError) -> Self {
        let app = match err {
            UploadError::InvalidInput(msg) => AppError::InvalidInput(msg),
            UploadError::MissingField(_) => AppError::MissingField(err.to_string()),
            UploadError::UnsupportedMediaType(_) => AppError::UnsupportedMediaType(err.to_string()),
            UploadError::SessionNotFound(_) => AppError::NotFound(err.to_string()),
            UploadError::SessionConflict(msg) => AppError::Conflict(msg),
            UploadError::MissingChunk { .. }
            | UploadError::ChunkBusy { .. }
            | UploadError::ChunkProcessing(_) => AppError::ChunkProcessing(err.to_string()),
            UploadError::Storage(storage_err) => return storage_err.into(),
            UploadError::Io(io_err) => AppError::Internal(format!("IO error: {}", io_err)),
        };
        HttpAppError(app)
    }
}

/// JSON body extractor that returns our ErrorResponse format (400 + JSON) on deserialization failure.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        let is_production = is_production_env();

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let show_details = !is_production && !app_error.is_sensitive();
        let body = Json(ErrorResponse {
            error: app_error.client_message(),
            details: show_details.then(|| app_error.detailed_message()),
            error_type: show_details.then(|| app_error.error_type().to_string()),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_names_the_field() {
        let HttpAppError(app_err) = UploadError::MissingField("video").into();
        match app_err {
            AppError::MissingField(msg) => assert_eq!(msg, "No video field in request"),
            other => panic!("Expected MissingField variant, got {:?}", other),
        }
    }

    #[test]
    fn test_reassembly_errors_become_chunk_processing() {
        let err = UploadError::MissingChunk {
            upload_key: "a.mp4".to_string(),
            index: 2,
            total: 4,
        };
        let HttpAppError(app_err) = err.into();
        assert_eq!(app_err.http_status_code(), 500);
        assert_eq!(
            app_err.client_message(),
            "Chunk processing failed: Missing chunk 2 of 4 for a.mp4"
        );
    }

    #[test]
    fn test_session_errors_map_to_client_statuses() {
        let HttpAppError(not_found) = UploadError::SessionNotFound(uuid::Uuid::nil()).into();
        assert_eq!(not_found.http_status_code(), 404);

        let HttpAppError(conflict) = UploadError::SessionConflict("Expected chunk 1, got 2".into()).into();
        assert_eq!(conflict.http_status_code(), 409);
    }

    #[test]
    fn test_from_storage_error_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "IO error");
        let HttpAppError(app_err) = StorageError::IoError(io_err).into();
        match app_err {
            AppError::Internal(msg) => assert!(msg.contains("IO error")),
            other => panic!("Expected Internal variant, got {:?}", other),
        }
    }

    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse {
            error: "No video field in request".to_string(),
            details: None,
            error_type: None,
            code: "MISSING_FIELD".to_string(),
            recoverable: false,
            suggested_action: None,
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["error"], "No video field in request");
        assert_eq!(json["code"], "MISSING_FIELD");
        assert!(json.get("details").is_none());
    }
}
