//! Error responses.
//!
//! Every handler failure is a [`GatewayError`] rendered as
//! `{"error": {"kind": "...", "message": "..."}}` with a status chosen by its
//! [`ErrorKind`].

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::{ErrorKind, GatewayError};

/// Status code for each error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidAmount | ErrorKind::InvalidAddress | ErrorKind::InvalidRequest => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::NonceConflict => StatusCode::CONFLICT,
        ErrorKind::WouldRevert => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::MalformedEvent | ErrorKind::Rpc => StatusCode::BAD_GATEWAY,
        ErrorKind::ChainUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Signing | ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    kind: ErrorKind,
    message: &'a str,
}

/// Handler error wrapper.
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(GatewayError::InvalidRequest(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(GatewayError::InvalidRequest(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        let message = self.0.to_string();

        if status.is_server_error() {
            tracing::warn!(kind = %kind, status = status.as_u16(), error = %message, "Request failed");
        } else {
            tracing::debug!(kind = %kind, status = status.as_u16(), error = %message, "Request rejected");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                kind,
                message: &message,
            },
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::InvalidAmount), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::InvalidRequest), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::NonceConflict), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::WouldRevert), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(ErrorKind::ChainUnavailable), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(ErrorKind::MalformedEvent), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError(GatewayError::NotFound("no receipt".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["kind"], "NOT_FOUND");
        assert_eq!(json["error"]["message"], "not found: no receipt");
    }
}
