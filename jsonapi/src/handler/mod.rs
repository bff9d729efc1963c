//! Endpoint handlers.
//!
//! A handler is created per request from the URI path parameters, validates
//! the request in a preparation phase and then runs exactly one method.

pub mod relationship;

pub use relationship::{PreparedRelationship, RelationshipHandler};

use crate::JSONAPI_MEDIA_TYPE;
use crate::errors::{JsonApiError, Result};
use hyper::body::Bytes;
use hyper::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use hyper::{Response, StatusCode};
use serde_json::Value;

/// Fails with `UnsupportedMediaType` unless the request declares the
/// JSON:API media type. Media type parameters are ignored.
pub fn assert_jsonapi_content_type(headers: &HeaderMap) -> Result<()> {
    match shared::http::media_type(headers) {
        Some(media_type) if media_type.eq_ignore_ascii_case(JSONAPI_MEDIA_TYPE) => Ok(()),
        _ => Err(JsonApiError::UnsupportedMediaType),
    }
}

/// Decodes a request body as JSON.
pub fn parse_json_body(body: &Bytes) -> Result<Value> {
    if body.is_empty() {
        return Err(JsonApiError::InvalidDocument(
            "the request body is empty".to_string(),
        ));
    }
    serde_json::from_slice(body)
        .map_err(|e| JsonApiError::InvalidDocument(format!("the request body is not valid JSON: {e}")))
}

/// Builds a response carrying a JSON:API document.
pub fn jsonapi_response(status: StatusCode, body: Bytes) -> Result<Response<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, HeaderValue::from_static(JSONAPI_MEDIA_TYPE))
        .body(body)
        .map_err(|e| JsonApiError::InternalError(format!("Failed to build response: {e}")))
}
