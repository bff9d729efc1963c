use crate::JSONAPI_MEDIA_TYPE;
use hyper::body::Bytes;
use hyper::header::{ALLOW, CONTENT_TYPE, HeaderValue};
use hyper::{Response, StatusCode};
use serde_json::{Value, json};
use thiserror::Error;

/// Result type alias for JSON:API operations
pub type Result<T, E = JsonApiError> = std::result::Result<T, E>;

/// Methods served by relationship endpoints, as advertised in `Allow`.
pub const RELATIONSHIP_METHODS: &str = "GET, POST, PATCH, DELETE";

/// Errors that can occur while handling a JSON:API request
#[derive(Error, Debug)]
pub enum JsonApiError {
    #[error("Unsupported media type, requests must use {media_type}", media_type = JSONAPI_MEDIA_TYPE)]
    UnsupportedMediaType,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed: {detail}")]
    MethodNotAllowed {
        detail: String,
        /// Value of the `Allow` header sent with the error response
        allow: &'static str,
    },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Failed to read request body: {0}")]
    RequestBodyError(String),

    #[error("Response serialization error: {0}")]
    ResponseSerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ValidationError),

    #[error("Schema error: {0}")]
    Schema(#[from] crate::schema::SchemaError),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl JsonApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            JsonApiError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            JsonApiError::NotFound(_) => StatusCode::NOT_FOUND,
            JsonApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            JsonApiError::InvalidDocument(_) | JsonApiError::RequestBodyError(_) => {
                StatusCode::BAD_REQUEST
            }
            JsonApiError::ResponseSerializationError(_)
            | JsonApiError::Config(_)
            | JsonApiError::Schema(_)
            | JsonApiError::InternalError(_)
            | JsonApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Renders the error as a JSON:API error document.
    ///
    /// Server-side failures only expose the canonical status title, the
    /// details are left to the logs.
    pub fn to_document(&self, jsonapi_object: &Value) -> Value {
        let status = self.status();
        let title = status.canonical_reason().unwrap_or("Error");

        let mut error = json!({
            "status": status.as_str(),
            "title": title,
        });
        if !status.is_server_error() {
            error["detail"] = Value::String(self.to_string());
        }

        json!({
            "errors": [error],
            "jsonapi": jsonapi_object,
        })
    }

    /// Builds the complete HTTP response for this error.
    pub fn to_response(&self, jsonapi_object: &Value) -> Response<Bytes> {
        // Serializing a `Value` cannot fail
        let body = serde_json::to_vec(&self.to_document(jsonapi_object)).unwrap_or_default();

        let mut response = Response::new(Bytes::from(body));
        *response.status_mut() = self.status();
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static(JSONAPI_MEDIA_TYPE),
        );
        if let JsonApiError::MethodNotAllowed { allow, .. } = self {
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static(*allow));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            JsonApiError::UnsupportedMediaType.status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            JsonApiError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            JsonApiError::InvalidDocument("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            JsonApiError::InternalError("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_document() {
        let jsonapi = json!({"version": "1.0"});
        let document = JsonApiError::NotFound("articles/7".into()).to_document(&jsonapi);

        assert_eq!(document["errors"][0]["status"], "404");
        assert_eq!(document["errors"][0]["title"], "Not Found");
        assert_eq!(document["errors"][0]["detail"], "Not found: articles/7");
        assert_eq!(document["jsonapi"], jsonapi);

        // Internal details are not leaked to clients
        let document = JsonApiError::InternalError("no serializer for articles".into()).to_document(&jsonapi);
        assert_eq!(document["errors"][0]["status"], "500");
        assert!(document["errors"][0].get("detail").is_none());
    }

    #[test]
    fn test_method_not_allowed_response() {
        let error = JsonApiError::MethodNotAllowed {
            detail: "PUT".into(),
            allow: RELATIONSHIP_METHODS,
        };
        let response = error.to_response(&json!({"version": "1.0"}));

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], RELATIONSHIP_METHODS);
        assert_eq!(response.headers()[CONTENT_TYPE], JSONAPI_MEDIA_TYPE);
    }
}
