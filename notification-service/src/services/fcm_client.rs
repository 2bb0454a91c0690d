use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use chargease_fcm_shared::models::{
    AndroidConfig, AndroidNotification, ApnsConfig, ApnsPayload, ApsAlert, ApsPayload,
    FcmMessageBody, FcmNotification, WebPushConfig, WebPushNotification,
};
use chargease_fcm_shared::{FcmClient, FcmError, TopicSubscriptionResult};

use crate::error::{AppError, AppResult};
use crate::models::{DispatchOutcome, FailureKind, NotificationPayload, PushProviderKind};
use crate::services::push_dispatcher::ProviderAdapter;

/// FCM HTTP v1 multicast ceiling
pub const FCM_BATCH_LIMIT: usize = 500;

/// Accent color applied to Android notifications
const ANDROID_ACCENT_COLOR: &str = "#16a34a";

/// FCM provider adapter
///
/// Wraps the shared FCM client; a missing client (no credentials at
/// startup) downgrades every send to all-failed outcomes with one warning
/// instead of an error. Sends go out one message per token: the batch
/// endpoint has documented reliability problems, so per-token sends trade
/// latency for accurate per-token attribution.
pub struct FcmAdapter {
    client: Option<Arc<FcmClient>>,
}

impl FcmAdapter {
    pub fn new(client: Option<Arc<FcmClient>>) -> Self {
        Self { client }
    }

    pub fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    fn ready_client(&self) -> AppResult<&Arc<FcmClient>> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::ProviderNotConfigured("fcm".to_string()))
    }

    /// Map a provider error onto the outcome taxonomy. Only an explicit
    /// UNREGISTERED (or 404) proves the token is dead.
    fn classify(error: &FcmError) -> FailureKind {
        if error.is_token_unregistered() {
            FailureKind::TokenInvalid
        } else if error.is_invalid_argument() {
            FailureKind::Validation
        } else if error.is_transient() {
            FailureKind::Transient
        } else {
            FailureKind::Unknown
        }
    }

    /// Wire message with every presentation block filled in; the caller
    /// sets exactly one of `token` / `topic`.
    fn base_message(&self, payload: &NotificationPayload) -> FcmMessageBody {
        let title = payload.display_title().to_string();
        let body = payload.display_body().to_string();
        let click_action = payload.click_action_or_default().to_string();

        let mut data = payload.extra_data.clone();
        data.insert("click_action".to_string(), click_action.clone());
        data.insert("category".to_string(), payload.category.as_str().to_string());

        let mut webpush_headers = HashMap::new();
        webpush_headers.insert("Urgency".to_string(), "high".to_string());

        FcmMessageBody {
            token: None,
            topic: None,
            notification: FcmNotification {
                title: title.clone(),
                body: body.clone(),
            },
            data: Some(data),
            webpush: Some(WebPushConfig {
                headers: webpush_headers,
                notification: WebPushNotification {
                    icon: payload.icon.clone(),
                    badge: payload.icon.clone(),
                    require_interaction: true,
                },
            }),
            android: Some(AndroidConfig {
                priority: "high".to_string(),
                notification: Some(AndroidNotification {
                    icon: payload.icon.clone(),
                    color: Some(ANDROID_ACCENT_COLOR.to_string()),
                    sound: "default".to_string(),
                    click_action: Some(click_action),
                }),
            }),
            apns: Some(ApnsConfig {
                payload: ApnsPayload {
                    aps: ApsPayload {
                        alert: ApsAlert { title, body },
                        sound: "default".to_string(),
                        badge: 1,
                    },
                },
            }),
        }
    }

    /// Broadcast to a topic without enumerating tokens.
    pub async fn send_to_topic(
        &self,
        topic: &str,
        payload: &NotificationPayload,
    ) -> AppResult<String> {
        validate_topic(topic)?;
        let client = self.ready_client()?;

        let mut message = self.base_message(payload);
        message.topic = Some(topic.to_string());

        let result = client.send(message).await?;
        debug!(topic, message_id = %result.message_id, "topic message accepted");
        Ok(result.message_id)
    }

    pub async fn subscribe_to_topic(
        &self,
        tokens: &[String],
        topic: &str,
    ) -> AppResult<TopicSubscriptionResult> {
        validate_topic(topic)?;
        if tokens.is_empty() {
            return Err(AppError::Validation("no tokens to subscribe".to_string()));
        }
        let client = self.ready_client()?;
        Ok(client.subscribe_to_topic(tokens, topic).await?)
    }

    pub async fn unsubscribe_from_topic(
        &self,
        tokens: &[String],
        topic: &str,
    ) -> AppResult<TopicSubscriptionResult> {
        validate_topic(topic)?;
        if tokens.is_empty() {
            return Err(AppError::Validation("no tokens to unsubscribe".to_string()));
        }
        let client = self.ready_client()?;
        Ok(client.unsubscribe_from_topic(tokens, topic).await?)
    }
}

#[async_trait]
impl ProviderAdapter for FcmAdapter {
    fn kind(&self) -> PushProviderKind {
        PushProviderKind::Fcm
    }

    fn max_batch_size(&self) -> usize {
        FCM_BATCH_LIMIT
    }

    async fn send(
        &self,
        tokens: &[String],
        payload: &NotificationPayload,
    ) -> Vec<DispatchOutcome> {
        let client = match &self.client {
            Some(client) => client,
            None => {
                warn!(tokens = tokens.len(), "FCM client not configured, failing batch");
                return tokens
                    .iter()
                    .map(|token| {
                        DispatchOutcome::failed(
                            token.clone(),
                            FailureKind::Unknown,
                            Some("FCM client not configured".to_string()),
                        )
                    })
                    .collect();
            }
        };

        let mut outcomes = Vec::with_capacity(tokens.len());
        for token in tokens {
            let mut message = self.base_message(payload);
            message.token = Some(token.clone());

            match client.send(message).await {
                Ok(result) => {
                    debug!(message_id = %result.message_id, "FCM delivery accepted");
                    outcomes.push(DispatchOutcome::ok(token.clone()));
                }
                Err(error) => {
                    let failure = Self::classify(&error);
                    warn!(failure = failure.as_str(), error = %error, "FCM delivery failed");
                    outcomes.push(DispatchOutcome::failed(
                        token.clone(),
                        failure,
                        Some(error.to_string()),
                    ));
                }
            }
        }
        outcomes
    }
}

/// FCM topic names: `[a-zA-Z0-9-_.~%]+`.
fn validate_topic(topic: &str) -> AppResult<()> {
    let valid = !topic.is_empty()
        && topic
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | '%'));
    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!("invalid topic name: {:?}", topic)))
    }
}
