use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

const RESERVED_KEYS: [&str; 3] = ["success", "errorMsg", "cid"];

/// The uniform response shape: `{ success, errorMsg?, cid?, ...fields }`.
///
/// Domain fields are flattened into the top level. They are empty whenever
/// `success` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ActionResult {
    pub fn success(mut fields: Map<String, Value>, cid: impl Into<String>) -> Self {
        for key in RESERVED_KEYS {
            fields.remove(key);
        }

        Self {
            success: true,
            error_msg: None,
            cid: Some(cid.into()),
            fields,
        }
    }

    /// Success without payload and without a correlation id (logout and similar).
    pub fn ok() -> Self {
        Self {
            success: true,
            error_msg: None,
            cid: None,
            fields: Map::new(),
        }
    }

    pub fn failure(err: &ApiError) -> Self {
        Self {
            success: false,
            error_msg: Some(err.message().to_string()),
            cid: err.cid().map(str::to_string),
            fields: Map::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl From<&ApiError> for ActionResult {
    fn from(err: &ApiError) -> Self {
        ActionResult::failure(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_flattens_fields() {
        let fields = json!({ "visitor": { "id": "v1" } });
        let result = ActionResult::success(fields.as_object().unwrap().clone(), "abc");

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "success": true, "cid": "abc", "visitor": { "id": "v1" } })
        );
    }

    #[test]
    fn test_success_cannot_be_overridden_by_fields() {
        let fields = json!({ "success": false, "cid": "fake", "count": 1 });
        let result = ActionResult::success(fields.as_object().unwrap().clone(), "real");

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["cid"], json!("real"));
        assert_eq!(value["count"], json!(1));
    }

    #[test]
    fn test_failure_shape() {
        let err = ApiError::not_found("event not found").with_cid("c1");
        let value = serde_json::to_value(ActionResult::failure(&err)).unwrap();

        assert_eq!(
            value,
            json!({ "success": false, "errorMsg": "event not found", "cid": "c1" })
        );
    }

    #[test]
    fn test_deserialize_keeps_domain_fields() {
        let result: ActionResult =
            serde_json::from_value(json!({ "success": true, "cid": "c", "n": 2 })).unwrap();
        assert_eq!(result.field("n"), Some(&json!(2)));
        assert!(result.error_msg.is_none());
    }
}
