use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use tracing::debug;
use uuid::Uuid;

use crate::errors::FcmError;
use crate::models::*;

const FCM_PROJECTS_ENDPOINT: &str = "https://fcm.googleapis.com/v1/projects";
const IID_BATCH_ADD_ENDPOINT: &str = "https://iid.googleapis.com/iid/v1:batchAdd";
const IID_BATCH_REMOVE_ENDPOINT: &str = "https://iid.googleapis.com/iid/v1:batchRemove";
const OAUTH_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Registration tokens are opaque, but real ones sit in a narrow length
/// band; anything outside it was mangled before it reached us.
pub fn is_plausible_registration_token(token: &str) -> bool {
    token.len() >= 10 && token.len() <= 1000
}

/// Firebase Cloud Messaging client
///
/// Manages OAuth2 token generation, caching, and message delivery against
/// the FCM HTTP v1 API for a single Firebase project.
#[derive(Debug)]
pub struct FcmClient {
    project_id: String,
    credentials: Arc<ServiceAccountKey>,
    token_cache: Arc<Mutex<Option<TokenCache>>>,
    http_client: reqwest::Client,
}

impl FcmClient {
    /// Create a new FCM client.
    ///
    /// The project id must match the Firebase format (lowercase letters,
    /// digits and hyphens); anything else fails construction so a broken
    /// credential is caught once at startup, not on every send.
    pub fn new(project_id: String, credentials: ServiceAccountKey) -> Result<Self, FcmError> {
        if !Self::is_valid_project_id(&project_id) {
            return Err(FcmError::InvalidProjectId(project_id));
        }

        Ok(Self {
            project_id,
            credentials: Arc::new(credentials),
            token_cache: Arc::new(Mutex::new(None)),
            http_client: reqwest::Client::new(),
        })
    }

    /// Load a service account key file and build a client for its project.
    pub fn from_key_file(path: &str) -> Result<Self, FcmError> {
        let raw = std::fs::read_to_string(path).map_err(|e| FcmError::CredentialsRead {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let key: ServiceAccountKey =
            serde_json::from_str(&raw).map_err(|e| FcmError::CredentialsParse(e.to_string()))?;
        Self::new(key.project_id.clone(), key)
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn is_valid_project_id(project_id: &str) -> bool {
        !project_id.is_empty()
            && project_id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }

    /// Send one wire message (token- or topic-addressed).
    pub async fn send(&self, message: FcmMessageBody) -> Result<FcmSendResult, FcmError> {
        let access_token = self.get_access_token().await?;

        let url = format!("{}/{}/messages:send", FCM_PROJECTS_ENDPOINT, self.project_id);
        let envelope = FcmMessage { message };

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .json(&envelope)
            .send()
            .await
            .map_err(|e| FcmError::SendRequest(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            let api: FcmApiResponse = response
                .json()
                .await
                .map_err(|e| FcmError::ResponseParse(e.to_string()))?;

            Ok(FcmSendResult {
                message_id: api.name.unwrap_or_else(|| Uuid::new_v4().to_string()),
            })
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Self::api_error(status.as_u16(), &body))
        }
    }

    /// Subscribe a batch of registration tokens to a topic.
    pub async fn subscribe_to_topic(
        &self,
        tokens: &[String],
        topic: &str,
    ) -> Result<TopicSubscriptionResult, FcmError> {
        self.topic_batch(IID_BATCH_ADD_ENDPOINT, tokens, topic).await
    }

    /// Remove a batch of registration tokens from a topic.
    pub async fn unsubscribe_from_topic(
        &self,
        tokens: &[String],
        topic: &str,
    ) -> Result<TopicSubscriptionResult, FcmError> {
        self.topic_batch(IID_BATCH_REMOVE_ENDPOINT, tokens, topic)
            .await
    }

    async fn topic_batch(
        &self,
        endpoint: &str,
        tokens: &[String],
        topic: &str,
    ) -> Result<TopicSubscriptionResult, FcmError> {
        let access_token = self.get_access_token().await?;

        let body = serde_json::json!({
            "to": format!("/topics/{}", topic),
            "registration_tokens": tokens,
        });

        let response = self
            .http_client
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("access_token_auth", "true")
            .json(&body)
            .send()
            .await
            .map_err(|e| FcmError::SendRequest(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::api_error(status.as_u16(), &body));
        }

        // The IID endpoint reports per-token errors when it feels like it;
        // an absent results array means the whole batch was accepted.
        let parsed: IidBatchResponse = response.json().await.unwrap_or(IidBatchResponse {
            results: Vec::new(),
        });
        let failed = parsed
            .results
            .iter()
            .filter(|r| r.error.is_some())
            .count();

        debug!(
            topic,
            accepted = tokens.len() - failed,
            failed,
            "topic batch complete"
        );

        Ok(TopicSubscriptionResult {
            topic: topic.to_string(),
            accepted: tokens.len().saturating_sub(failed),
            failed,
        })
    }

    /// Get an access token from the service account (with caching).
    pub async fn get_access_token(&self) -> Result<String, FcmError> {
        // Reuse the cached token while it is still valid for at least 60s.
        {
            let cache = self.token_cache.lock().expect("token cache lock poisoned");
            if let Some(cached) = cache.as_ref() {
                let now = Utc::now().timestamp();
                if cached.expires_at > now + 60 {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        // Generate a new JWT and exchange it for an access token.
        let now = Utc::now();
        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            sub: self.credentials.client_email.clone(),
            scope: OAUTH_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| FcmError::KeyParse(e.to_string()))?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| FcmError::JwtEncode(e.to_string()))?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.credentials.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| FcmError::SendRequest(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FcmError::TokenRequestFailed(response.status().as_u16()));
        }

        let token_response: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| FcmError::TokenParse(e.to_string()))?;

        let expires_at = Utc::now().timestamp() + token_response.expires_in;
        {
            let mut cache = self.token_cache.lock().expect("token cache lock poisoned");
            *cache = Some(TokenCache {
                access_token: token_response.access_token.clone(),
                expires_at,
            });
        }

        Ok(token_response.access_token)
    }

    fn api_error(status: u16, body: &str) -> FcmError {
        let parsed: Option<FcmApiErrorBody> = serde_json::from_str(body).ok();
        let (error_code, message) = match parsed.and_then(|b| b.error) {
            Some(err) => {
                let code = err
                    .details
                    .iter()
                    .find_map(|d| d.error_code.clone())
                    .or(err.status);
                (code, err.message)
            }
            None => (
                None,
                (!body.is_empty()).then(|| body.chars().take(200).collect::<String>()),
            ),
        };

        FcmError::Api {
            status,
            error_code,
            message,
        }
    }
}
