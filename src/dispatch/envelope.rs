//! Uniform response envelope wrapping every operation result.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
    /// Present only for partial failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_steps: Option<Vec<String>>,
}

/// Success and failure share one shape; callers branch on `success` and
/// never have to sniff the payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub operation: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    pub fn from_result(operation: &str, result: EngineResult<Value>) -> Self {
        match result {
            Ok(data) => Self {
                operation: operation.to_string(),
                success: true,
                data: Some(data),
                error: None,
                timestamp: Utc::now(),
            },
            Err(err) => Self::failure(operation, &err),
        }
    }

    pub fn failure(operation: &str, err: &EngineError) -> Self {
        Self {
            operation: operation.to_string(),
            success: false,
            data: None,
            error: Some(ErrorBody {
                kind: err.kind().to_string(),
                message: err.to_string(),
                completed_steps: err.completed_steps().map(<[String]>::to_vec),
            }),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_carries_data_and_no_error() {
        let envelope = Envelope::from_result("cart_get", Ok(json!({ "cart": {} })));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], json!(true));
        assert!(value["data"].is_object());
        assert!(value.get("error").is_none());
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn partial_failure_lists_completed_steps() {
        let err = EngineError::partial(
            vec!["created sales order SALE001".to_string()],
            "post loyalty points",
            EngineError::not_found("loyalty_cards", "LOY404"),
        );
        let envelope = Envelope::from_result("cart_checkout", Err(err));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error"]["kind"], json!("PartialFailure"));
        assert_eq!(
            value["error"]["completedSteps"],
            json!(["created sales order SALE001"])
        );
    }
}
