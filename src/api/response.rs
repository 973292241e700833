use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use super::error::ApiError;

/// Wraps `payload` fields into a `{ "success": true, ... }` envelope.
/// Objects are merged; any other value lands under `data`.
pub fn success<T: Serialize>(payload: T) -> Result<Json<Value>, ApiError> {
    let mut body = json!({ "success": true });
    match serde_json::to_value(payload).map_err(ApiError::internal)? {
        Value::Object(fields) => {
            if let Value::Object(envelope) = &mut body {
                envelope.extend(fields);
            }
        }
        other => body["data"] = other,
    }
    Ok(Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_merges_objects_and_wraps_lists() {
        let Json(merged) = success(json!({"project": {"id": "1"}})).unwrap();
        assert_eq!(merged, json!({"success": true, "project": {"id": "1"}}));

        let Json(wrapped) = success(vec![1, 2]).unwrap();
        assert_eq!(wrapped, json!({"success": true, "data": [1, 2]}));
    }
}
