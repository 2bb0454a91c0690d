use tracing::debug;

use crate::errors::ExpoError;
use crate::models::{ExpoPushMessage, ExpoPushResponse, ExpoPushTicket};

const EXPO_PUSH_ENDPOINT: &str = "https://exp.host/--/api/v2/push/send";

/// Hard limit of the push endpoint; larger requests are rejected outright.
pub const EXPO_CHUNK_LIMIT: usize = 100;

/// Tokens minted by the Expo SDK look like `ExponentPushToken[...]` (or the
/// older `ExpoPushToken[...]`); anything else never came from an Expo app.
pub fn is_expo_push_token(token: &str) -> bool {
    let inner = token
        .strip_prefix("ExponentPushToken[")
        .or_else(|| token.strip_prefix("ExpoPushToken["));
    match inner.and_then(|rest| rest.strip_suffix(']')) {
        Some(body) => !body.is_empty() && !body.contains(']'),
        None => false,
    }
}

/// Expo push API client
///
/// Sends batched push messages through Expo's hosted service. An access
/// token is only required for apps with enhanced push security enabled.
pub struct ExpoClient {
    endpoint: String,
    access_token: Option<String>,
    http_client: reqwest::Client,
}

impl ExpoClient {
    pub fn new(endpoint: Option<String>, access_token: Option<String>) -> Self {
        Self {
            endpoint: endpoint.unwrap_or_else(|| EXPO_PUSH_ENDPOINT.to_string()),
            access_token,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a batch of messages, returning one ticket per message in the
    /// same order. Batches over [`EXPO_CHUNK_LIMIT`] are split into
    /// multiple requests transparently.
    pub async fn send(&self, messages: &[ExpoPushMessage]) -> Result<Vec<ExpoPushTicket>, ExpoError> {
        let mut tickets = Vec::with_capacity(messages.len());
        for chunk in messages.chunks(EXPO_CHUNK_LIMIT) {
            tickets.extend(self.send_chunk(chunk).await?);
        }
        Ok(tickets)
    }

    async fn send_chunk(&self, chunk: &[ExpoPushMessage]) -> Result<Vec<ExpoPushTicket>, ExpoError> {
        let mut request = self
            .http_client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(chunk);

        if let Some(token) = &self.access_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ExpoError::SendRequest(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExpoError::Api {
                status: status.as_u16(),
                message: (!body.is_empty()).then(|| body.chars().take(200).collect()),
            });
        }

        let parsed: ExpoPushResponse = response
            .json()
            .await
            .map_err(|e| ExpoError::ResponseParse(e.to_string()))?;

        if let Some(errors) = parsed.errors {
            let message = errors
                .into_iter()
                .next()
                .and_then(|e| e.message.or(e.code));
            return Err(ExpoError::Api {
                status: status.as_u16(),
                message,
            });
        }

        // Tickets must line up one-to-one with the chunk or we cannot
        // attribute failures to tokens.
        if parsed.data.len() != chunk.len() {
            return Err(ExpoError::TicketMismatch {
                sent: chunk.len(),
                received: parsed.data.len(),
            });
        }

        debug!(sent = chunk.len(), "expo chunk delivered");
        Ok(parsed.data)
    }
}
