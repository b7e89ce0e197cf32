//! Conversion of service errors into HTTP responses.
//!
//! Error bodies are JSON objects of the form
//!
//! ```json
//! { "error": "forbidden", "message": "only the seller may accept or decline" }
//! ```
//!
//! Storage failures are logged in full and reported with a generic message.
use crate::error::{ErrorKind, LedgerError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Ledger(err) => err.kind(),
            ApiError::Task(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::InvalidOperation | ErrorKind::Conflict => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let message = if kind == ErrorKind::Internal {
            tracing::error!("request failed: {self}");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = serde_json::json!({
            "error": kind.as_str(),
            "message": message,
        });
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (LedgerError::validation("v"), StatusCode::BAD_REQUEST),
            (LedgerError::invalid_operation("i"), StatusCode::BAD_REQUEST),
            (LedgerError::conflict("c"), StatusCode::BAD_REQUEST),
            (LedgerError::not_found("n"), StatusCode::NOT_FOUND),
            (LedgerError::forbidden("f"), StatusCode::FORBIDDEN),
            (LedgerError::unauthenticated("u"), StatusCode::UNAUTHORIZED),
            (
                StorageError::Encode("e".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status_code(), expected);
        }
    }

    #[tokio::test]
    async fn internal_details_are_not_exposed() {
        let err = ApiError::from(LedgerError::from(StorageError::Encode(
            "secret path /var/db".into(),
        )));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "internal");
        assert_eq!(body["message"], "internal server error");
    }
}
