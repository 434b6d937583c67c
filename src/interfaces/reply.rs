use crate::error::{Result, SettlementError};
use serde::Serialize;

/// Tagged result handed back to callers: a success flag plus either the
/// payload's fields or an error message.
///
/// The payload is flattened into the reply, so it must serialize as a map.
#[derive(Debug, Serialize)]
pub struct Reply<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T: Serialize> Reply<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            error: None,
            kind: None,
            data: Some(data),
        }
    }

    pub fn failed(error: &SettlementError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            kind: Some(error.kind()),
            data: None,
        }
    }
}

impl<T: Serialize> From<Result<T>> for Reply<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failed(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_flattens_payload() {
        let reply: Reply<_> = Ok(json!({"marked": 2})).into();
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value, json!({"success": true, "marked": 2}));
    }

    #[test]
    fn test_failure_carries_message_and_kind() {
        let reply: Reply<serde_json::Value> = Err(SettlementError::EventFull).into();
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(
            value,
            json!({
                "success": false,
                "error": "Event is full. No more registrations accepted.",
                "kind": "event_full"
            })
        );
    }
}
