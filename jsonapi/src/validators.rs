//! Structural checks for request payloads.
//!
//! These only look at the shape of a document. Whether the referenced
//! resources exist is decided by the unserializer.

use crate::errors::{JsonApiError, Result};
use serde_json::Value;

/// Asserts that `document` is a JSON:API relationship object:
///
/// ```json
/// {"data": null | {"type": "...", "id": "..."} | [{"type": "...", "id": "..."}]}
/// ```
///
/// `links` and `meta` members are allowed and must be objects.
pub fn assert_relationship_object(document: &Value) -> Result<()> {
    let Value::Object(object) = document else {
        return Err(invalid("a relationship object must be a JSON object"));
    };

    for member in ["links", "meta"] {
        if let Some(value) = object.get(member)
            && !value.is_object()
        {
            return Err(invalid(format!("the '{member}' member must be an object")));
        }
    }

    let Some(data) = object.get("data") else {
        return Err(invalid("a relationship object must contain a 'data' member"));
    };

    match data {
        Value::Null => Ok(()),
        Value::Object(_) => assert_resource_identifier(data),
        Value::Array(items) => items.iter().try_for_each(assert_resource_identifier),
        _ => Err(invalid(
            "'data' must be null, a resource identifier or an array of resource identifiers",
        )),
    }
}

/// Asserts that `value` is a resource identifier object with string `type`
/// and `id` members and an optional `meta` object.
pub fn assert_resource_identifier(value: &Value) -> Result<()> {
    let Value::Object(object) = value else {
        return Err(invalid("a resource identifier must be a JSON object"));
    };

    for member in ["type", "id"] {
        match object.get(member) {
            Some(Value::String(s)) if !s.is_empty() => {}
            Some(_) => {
                return Err(invalid(format!(
                    "the '{member}' of a resource identifier must be a non-empty string"
                )));
            }
            None => {
                return Err(invalid(format!(
                    "a resource identifier must contain a '{member}' member"
                )));
            }
        }
    }

    if let Some(meta) = object.get("meta")
        && !meta.is_object()
    {
        return Err(invalid("the 'meta' member must be an object"));
    }

    Ok(())
}

fn invalid(detail: impl Into<String>) -> JsonApiError {
    JsonApiError::InvalidDocument(detail.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_relationship_objects() {
        let valid = [
            json!({"data": null}),
            json!({"data": []}),
            json!({"data": {"type": "people", "id": "9"}}),
            json!({"data": [{"type": "comments", "id": "5", "meta": {"x": 1}}]}),
            json!({"data": [], "links": {"self": "/x"}, "meta": {}}),
        ];
        for document in &valid {
            assert!(
                assert_relationship_object(document).is_ok(),
                "expected valid: {document}"
            );
        }
    }

    #[test]
    fn test_invalid_relationship_objects() {
        let invalid = [
            json!([]),
            json!("data"),
            json!({}),
            json!({"data": 1}),
            json!({"data": "people"}),
            json!({"data": {"type": "people"}}),
            json!({"data": {"id": "9"}}),
            json!({"data": {"type": "people", "id": 9}}),
            json!({"data": {"type": "", "id": "9"}}),
            json!({"data": [{"type": "comments", "id": "5"}, null]}),
            json!({"data": {"type": "people", "id": "9", "meta": []}}),
            json!({"data": null, "links": "/x"}),
        ];
        for document in &invalid {
            assert!(
                matches!(
                    assert_relationship_object(document),
                    Err(JsonApiError::InvalidDocument(_))
                ),
                "expected invalid: {document}"
            );
        }
    }
}
