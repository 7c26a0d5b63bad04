//! HTTP error mapping.

use crate::export::ExportError;
use crate::llm::LlmError;
use crate::services::manuscript::ManuscriptError;
use crate::store::StoreError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("{0}")]
    Internal(String),
}

impl From<ManuscriptError> for ApiError {
    fn from(err: ManuscriptError) -> Self {
        match err {
            ManuscriptError::Llm(e) => ApiError::Llm(e),
            ManuscriptError::Export(e) => ApiError::Export(e),
        }
    }
}

impl ApiError {
    /// Error for a required body field that is absent or blank.
    pub fn missing(field: &str) -> Self {
        ApiError::BadRequest(format!("Missing '{field}' field in request body"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) | ApiError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Llm(e) if e.is_configuration() => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Llm(_) => StatusCode::BAD_GATEWAY,
            ApiError::Store(_) | ApiError::Export(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "request failed: {self}");
        } else {
            tracing::debug!(status = status.as_u16(), "request rejected: {self}");
        }
        json_error(status, self.to_string())
    }
}

/// `Json` whose rejection is a 400 with a JSON error body.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection_message(&rejection))),
        }
    }
}

fn rejection_message(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body".to_string(),
        other => other.body_text(),
    }
}

/// A body field that must be present and not blank.
pub fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::missing(field))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(ApiError::missing("idea").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Store(StoreError::NotFound { kind: "project", id: 4 }).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::Store(StoreError::Conflict("dup".into())).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Llm(LlmError::MissingApiKey).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::Llm(LlmError::EmptyResponse).status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn blank_required_field_is_rejected() {
        assert!(required("  ", "content").is_err());
        assert_eq!(required("text", "content").expect("present"), "text");
        assert_eq!(ApiError::missing("content").to_string(), "Missing 'content' field in request body");
    }
}
