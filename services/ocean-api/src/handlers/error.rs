//! Error responses.

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ocean_common::OceanError;
use serde::Serialize;
use tracing::{error, warn};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error: parameter problems become 400, everything else 500.
#[derive(Debug)]
pub struct ApiError(pub OceanError);

impl From<OceanError> for ApiError {
    fn from(err: OceanError) -> Self {
        ApiError(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(OceanError::MalformedQuery(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        } else {
            warn!(error = %self.0, "Rejected request");
        }

        let body = ErrorResponse {
            error: self.0.client_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Fallback for anything that is neither an API route nor a frontend file.
pub async fn not_found_handler() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Endpoint not found".to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_status() {
        let response = ApiError(OceanError::MissingParameter("lat_min".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_server_error_status() {
        let response = ApiError(OceanError::Interrupted).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (status, Json(body)) = not_found_handler().await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "Endpoint not found");
    }
}
