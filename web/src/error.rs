use std::error::Error as StdError;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::*;
use serde::Serialize;

use sse::error::{Error as RelayError, ErrorKind as RelayErrorKind};

pub type Result<T> = core::result::Result<T, Error>;

/// Web layer error. Boundary failures (authentication, validation) originate
/// here; relay errors are translated from the `sse` crate.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: WebErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum WebErrorKind {
    /// Producer or subscriber failed identity verification.
    Unauthenticated(String),
    /// The request body or parameters are malformed.
    Validation(String),
    Relay(RelayErrorKind),
}

/// Error body returned to callers.
#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    status: &'static str,
    error: &'static str,
    message: &'a str,
}

impl Error {
    pub fn unauthenticated(message: &str) -> Self {
        Error {
            source: None,
            error_kind: WebErrorKind::Unauthenticated(message.to_string()),
        }
    }

    pub fn validation(message: &str) -> Self {
        Error {
            source: None,
            error_kind: WebErrorKind::Validation(message.to_string()),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html#associatedconstant.UNPROCESSABLE_ENTITY
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status_code, error, message) = match &self.error_kind {
            WebErrorKind::Unauthenticated(message) => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                message.as_str(),
            ),
            WebErrorKind::Validation(message) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message.as_str(),
            ),
            WebErrorKind::Relay(RelayErrorKind::EmptyTarget) => (
                StatusCode::BAD_REQUEST,
                "empty_target",
                "targetUsers must contain at least one subscriber id",
            ),
        };
        debug!("Responding with {status_code}: {self}");

        (
            status_code,
            Json(ErrorResponse {
                status: "error",
                error,
                message,
            }),
        )
            .into_response()
    }
}

impl From<RelayError> for Error {
    fn from(err: RelayError) -> Self {
        let error_kind = match err.error_kind {
            RelayErrorKind::EmptyTarget => WebErrorKind::Relay(RelayErrorKind::EmptyTarget),
        };

        Error {
            source: err.source,
            error_kind,
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error {
            error_kind: WebErrorKind::Validation(rejection.body_text()),
            source: Some(Box::new(rejection)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{json, Value};

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_unauthenticated_maps_to_401() {
        let response = Error::unauthenticated("Missing API key").into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            json!({
                "status": "error",
                "error": "authentication_error",
                "message": "Missing API key"
            })
        );
    }

    #[tokio::test]
    async fn test_validation_maps_to_400() {
        let response = Error::validation("type is required").into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_empty_target_maps_to_400() {
        let relay_error = sse::error::empty_target_error("no subscribers");
        let response = Error::from(relay_error).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "empty_target");
    }
}
