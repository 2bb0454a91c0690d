use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Firebase service account key (the subset of fields OAuth2 signing needs)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    pub auth_uri: String,
    pub token_uri: String,
}

/// OAuth2 token cache entry
#[derive(Debug, Clone)]
pub struct TokenCache {
    pub access_token: String,
    pub expires_at: i64,
}

/// JWT claims for Google OAuth2
#[derive(Debug, Serialize)]
pub struct JwtClaims {
    pub iss: String,
    pub sub: String,
    pub scope: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

/// Google OAuth2 token response
#[derive(Debug, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// FCM v1 send request envelope
#[derive(Debug, Serialize)]
pub struct FcmMessage {
    pub message: FcmMessageBody,
}

/// One wire message, addressed to a registration token or a topic
#[derive(Debug, Clone, Serialize)]
pub struct FcmMessageBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub notification: FcmNotification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webpush: Option<WebPushConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apns: Option<ApnsConfig>,
}

/// FCM notification block
#[derive(Debug, Clone, Serialize)]
pub struct FcmNotification {
    pub title: String,
    pub body: String,
}

/// Web push presentation hints
#[derive(Debug, Clone, Serialize)]
pub struct WebPushConfig {
    pub headers: HashMap<String, String>,
    pub notification: WebPushNotification,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPushNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    pub require_interaction: bool,
}

/// Android presentation hints
#[derive(Debug, Clone, Serialize)]
pub struct AndroidConfig {
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<AndroidNotification>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub sound: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_action: Option<String>,
}

/// APNs passthrough payload (FCM relays these to Apple devices)
#[derive(Debug, Clone, Serialize)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApnsPayload {
    pub aps: ApsPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApsPayload {
    pub alert: ApsAlert,
    pub sound: String,
    pub badge: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApsAlert {
    pub title: String,
    pub body: String,
}

/// FCM v1 API success response
#[derive(Debug, Deserialize)]
pub struct FcmApiResponse {
    pub name: Option<String>,
}

/// FCM v1 API error body
#[derive(Debug, Deserialize)]
pub struct FcmApiErrorBody {
    pub error: Option<FcmApiError>,
}

#[derive(Debug, Deserialize)]
pub struct FcmApiError {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub details: Vec<FcmErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct FcmErrorDetail {
    #[serde(rename = "@type")]
    pub detail_type: Option<String>,
    #[serde(rename = "errorCode")]
    pub error_code: Option<String>,
}

/// Result of a single FCM send
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcmSendResult {
    pub message_id: String,
}

/// Topic batch operation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSubscriptionResult {
    pub topic: String,
    pub accepted: usize,
    pub failed: usize,
}

/// IID batch endpoint response; an empty `results` object per token means ok
#[derive(Debug, Deserialize)]
pub struct IidBatchResponse {
    #[serde(default)]
    pub results: Vec<IidBatchResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IidBatchResult {
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serializes_token_without_topic() {
        let body = FcmMessageBody {
            token: Some("reg-token".to_string()),
            topic: None,
            notification: FcmNotification {
                title: "Booking confirmed".to_string(),
                body: "Bay 4 at 10:00".to_string(),
            },
            data: None,
            webpush: None,
            android: None,
            apns: None,
        };

        let json = serde_json::to_value(FcmMessage { message: body }).unwrap();
        assert_eq!(json["message"]["token"], "reg-token");
        assert!(json["message"].get("topic").is_none());
        assert!(json["message"].get("webpush").is_none());
    }

    #[test]
    fn test_presentation_blocks_serialize_with_camel_case_keys() {
        let mut headers = HashMap::new();
        headers.insert("Urgency".to_string(), "high".to_string());

        let body = FcmMessageBody {
            token: Some("reg-token".to_string()),
            topic: None,
            notification: FcmNotification {
                title: "t".to_string(),
                body: "b".to_string(),
            },
            data: None,
            webpush: Some(WebPushConfig {
                headers,
                notification: WebPushNotification {
                    icon: Some("/icon.png".to_string()),
                    badge: Some("/badge.png".to_string()),
                    require_interaction: true,
                },
            }),
            android: Some(AndroidConfig {
                priority: "high".to_string(),
                notification: Some(AndroidNotification {
                    icon: None,
                    color: Some("#00aa55".to_string()),
                    sound: "default".to_string(),
                    click_action: Some("/bookings".to_string()),
                }),
            }),
            apns: Some(ApnsConfig {
                payload: ApnsPayload {
                    aps: ApsPayload {
                        alert: ApsAlert {
                            title: "t".to_string(),
                            body: "b".to_string(),
                        },
                        sound: "default".to_string(),
                        badge: 1,
                    },
                },
            }),
        };

        let json = serde_json::to_value(FcmMessage { message: body }).unwrap();
        let message = &json["message"];
        assert_eq!(message["webpush"]["headers"]["Urgency"], "high");
        assert_eq!(message["webpush"]["notification"]["requireInteraction"], true);
        assert_eq!(message["android"]["priority"], "high");
        assert_eq!(message["android"]["notification"]["clickAction"], "/bookings");
        assert_eq!(message["apns"]["payload"]["aps"]["badge"], 1);
        assert_eq!(message["apns"]["payload"]["aps"]["sound"], "default");
    }

    #[test]
    fn test_error_body_extracts_error_code_detail() {
        let raw = r#"{
            "error": {
                "code": 404,
                "message": "Requested entity was not found.",
                "status": "NOT_FOUND",
                "details": [
                    {
                        "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError",
                        "errorCode": "UNREGISTERED"
                    }
                ]
            }
        }"#;

        let body: FcmApiErrorBody = serde_json::from_str(raw).unwrap();
        let error = body.error.unwrap();
        assert_eq!(error.code, Some(404));
        assert_eq!(error.status.as_deref(), Some("NOT_FOUND"));
        assert_eq!(error.details[0].error_code.as_deref(), Some("UNREGISTERED"));
    }

    #[test]
    fn test_iid_batch_response_counts_errors() {
        let raw = r#"{"results":[{},{"error":"NOT_FOUND"},{}]}"#;
        let parsed: IidBatchResponse = serde_json::from_str(raw).unwrap();
        let failed = parsed.results.iter().filter(|r| r.error.is_some()).count();
        assert_eq!(parsed.results.len(), 3);
        assert_eq!(failed, 1);
    }
}
