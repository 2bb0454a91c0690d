use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use chargease_expo_shared::{
    is_expo_push_token, ExpoClient, ExpoError, ExpoPushMessage, EXPO_CHUNK_LIMIT,
};

use crate::models::{DispatchOutcome, FailureKind, NotificationPayload, PushProviderKind};
use crate::services::push_dispatcher::ProviderAdapter;

/// Expo provider adapter
///
/// Tokens that fail the Expo format check are dropped before the batch
/// forms: they produce no outcome at all, only a warning. Valid tokens go
/// out as one JSON array per chunk and are matched to tickets by index.
pub struct ExpoAdapter {
    client: Arc<ExpoClient>,
}

impl ExpoAdapter {
    pub fn new(client: Arc<ExpoClient>) -> Self {
        Self { client }
    }

    /// Expo needs no credentials; the adapter is always ready.
    pub fn is_ready(&self) -> bool {
        true
    }

    fn classify_chunk_error(error: &ExpoError) -> FailureKind {
        if error.is_transient() {
            FailureKind::Transient
        } else if matches!(error, ExpoError::Api { status: 400, .. }) {
            FailureKind::Validation
        } else {
            FailureKind::Unknown
        }
    }

    fn build_message(&self, token: &str, payload: &NotificationPayload) -> ExpoPushMessage {
        let mut data = payload.extra_data.clone();
        data.insert(
            "click_action".to_string(),
            payload.click_action_or_default().to_string(),
        );
        data.insert("category".to_string(), payload.category.as_str().to_string());

        ExpoPushMessage::new(
            token.to_string(),
            payload.display_title().to_string(),
            payload.display_body().to_string(),
        )
        .with_data(data)
    }
}

#[async_trait]
impl ProviderAdapter for ExpoAdapter {
    fn kind(&self) -> PushProviderKind {
        PushProviderKind::Expo
    }

    fn max_batch_size(&self) -> usize {
        EXPO_CHUNK_LIMIT
    }

    async fn send(
        &self,
        tokens: &[String],
        payload: &NotificationPayload,
    ) -> Vec<DispatchOutcome> {
        let valid: Vec<&String> = tokens
            .iter()
            .filter(|token| {
                let ok = is_expo_push_token(token);
                if !ok {
                    warn!(length = token.len(), "dropping malformed Expo push token");
                }
                ok
            })
            .collect();

        if valid.is_empty() {
            return Vec::new();
        }

        let messages: Vec<ExpoPushMessage> = valid
            .iter()
            .map(|token| self.build_message(token, payload))
            .collect();

        match self.client.send(&messages).await {
            Ok(tickets) => {
                debug!(tickets = tickets.len(), "Expo tickets received");
                valid
                    .iter()
                    .zip(tickets.iter())
                    .map(|(token, ticket)| {
                        if ticket.is_ok() {
                            DispatchOutcome::ok((*token).clone())
                        } else if ticket.is_device_not_registered() {
                            DispatchOutcome::failed(
                                (*token).clone(),
                                FailureKind::TokenInvalid,
                                ticket.message.clone(),
                            )
                        } else {
                            DispatchOutcome::failed(
                                (*token).clone(),
                                FailureKind::Unknown,
                                ticket.message.clone(),
                            )
                        }
                    })
                    .collect()
            }
            Err(error) => {
                let failure = Self::classify_chunk_error(&error);
                warn!(
                    error = %error,
                    failure = failure.as_str(),
                    chunk = valid.len(),
                    "Expo chunk send failed"
                );
                valid
                    .into_iter()
                    .map(|token| {
                        DispatchOutcome::failed(token.clone(), failure, Some(error.to_string()))
                    })
                    .collect()
            }
        }
    }
}
