//! API response wrapper types.
//!
//! Every endpoint answers with the same envelope: a `success` flag, an
//! optional human-readable `message`, and the endpoint's payload fields
//! flattened next to them, e.g. `{"success":true,"databases":["app"]}`.

use serde::Serialize;
use utoipa::ToSchema;

/// Standard API response wrapper.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,

    /// Human-readable status or error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Payload fields, flattened into the envelope.
    #[serde(flatten)]
    pub data: Option<T>,
}

/// Placeholder payload for responses that only carry a message.
#[derive(Debug, Serialize, ToSchema)]
pub struct EmptyData {}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response with data.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Creates a successful response with data and a message.
    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<EmptyData> {
    /// Creates a successful response that only carries a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Creates an error response.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize, ToSchema)]
    struct Databases {
        databases: Vec<String>,
    }

    #[test]
    fn test_payload_is_flattened() {
        let resp = ApiResponse::ok(Databases {
            databases: vec!["app".into()],
        });
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value, json!({"success": true, "databases": ["app"]}));
    }

    #[test]
    fn test_message_only_response() {
        let value = serde_json::to_value(ApiResponse::message("Disconnected successfully")).unwrap();
        assert_eq!(value, json!({"success": true, "message": "Disconnected successfully"}));
    }

    #[test]
    fn test_failure_response() {
        let value = serde_json::to_value(ApiResponse::failure("No active connection")).unwrap();
        assert_eq!(value, json!({"success": false, "message": "No active connection"}));
    }
}
