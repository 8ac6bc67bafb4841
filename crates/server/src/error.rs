use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mailroom_core::{ErrorKind, ScanError, ScanResponse};

/// HTTP status for each failure kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::UserInput => StatusCode::BAD_REQUEST,
        ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::ExtractionProvider | ErrorKind::MalformedExtraction => StatusCode::BAD_GATEWAY,
    }
}

/// A failed scan rendered as the standard `{success: false, ...}` body.
#[derive(Debug)]
pub struct ApiError(pub ScanResponse);

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ApiError(ScanResponse::failed(kind, message, None))
    }
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        ApiError(ScanResponse::from(&err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.kind.map_or(StatusCode::INTERNAL_SERVER_ERROR, status_for);
        (status, Json(self.0)).into_response()
    }
}
