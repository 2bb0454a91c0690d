use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One message in a push request, addressed to a single Expo token.
#[derive(Debug, Clone, Serialize)]
pub struct ExpoPushMessage {
    pub to: String,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, String>>,
    pub sound: String,
    pub badge: u32,
}

impl ExpoPushMessage {
    pub fn new(to: String, title: String, body: String) -> Self {
        Self {
            to,
            title,
            body,
            data: None,
            sound: "default".to_string(),
            badge: 1,
        }
    }

    pub fn with_data(mut self, data: HashMap<String, String>) -> Self {
        if !data.is_empty() {
            self.data = Some(data);
        }
        self
    }
}

/// Per-message receipt returned by the push endpoint, index-aligned with
/// the request array.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpoPushTicket {
    pub status: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<ExpoTicketDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpoTicketDetails {
    #[serde(default)]
    pub error: Option<String>,
}

impl ExpoPushTicket {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    /// The token is gone from the device; stop sending to it.
    pub fn is_device_not_registered(&self) -> bool {
        self.details
            .as_ref()
            .and_then(|d| d.error.as_deref())
            .map(|e| e == "DeviceNotRegistered")
            .unwrap_or(false)
    }
}

#[derive(Debug, Deserialize)]
pub struct ExpoPushResponse {
    #[serde(default)]
    pub data: Vec<ExpoPushTicket>,
    #[serde(default)]
    pub errors: Option<Vec<ExpoRequestError>>,
}

/// Request-level error (the whole POST was rejected, no tickets issued).
#[derive(Debug, Clone, Deserialize)]
pub struct ExpoRequestError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serialization_defaults() {
        let msg = ExpoPushMessage::new(
            "ExponentPushToken[abc123]".to_string(),
            "Booking confirmed".to_string(),
            "Your charger is reserved".to_string(),
        );
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["to"], "ExponentPushToken[abc123]");
        assert_eq!(json["sound"], "default");
        assert_eq!(json["badge"], 1);
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_message_with_data() {
        let mut data = HashMap::new();
        data.insert("booking_id".to_string(), "bk-42".to_string());
        let msg = ExpoPushMessage::new(
            "ExponentPushToken[abc123]".to_string(),
            "t".to_string(),
            "b".to_string(),
        )
        .with_data(data);

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["data"]["booking_id"], "bk-42");
    }

    #[test]
    fn test_ticket_device_not_registered() {
        let raw = r#"{
            "data": [
                {"status": "ok", "id": "ticket-1"},
                {"status": "error", "message": "device gone",
                 "details": {"error": "DeviceNotRegistered"}}
            ]
        }"#;

        let response: ExpoPushResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.data.len(), 2);
        assert!(response.data[0].is_ok());
        assert!(!response.data[0].is_device_not_registered());
        assert!(!response.data[1].is_ok());
        assert!(response.data[1].is_device_not_registered());
    }

    #[test]
    fn test_request_level_errors() {
        let raw = r#"{"errors": [{"code": "PUSH_TOO_MANY_EXPERIENCE_IDS", "message": "mixed"}]}"#;
        let response: ExpoPushResponse = serde_json::from_str(raw).unwrap();
        assert!(response.data.is_empty());
        let errors = response.errors.unwrap();
        assert_eq!(errors[0].code.as_deref(), Some("PUSH_TOO_MANY_EXPERIENCE_IDS"));
    }
}
