use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    DevicePlatform, NotificationPreferences, PushToken, TokenRegistration,
};

/// Read snapshot of one recipient
#[derive(Debug, Clone)]
pub struct RecipientView {
    pub preferences: Option<NotificationPreferences>,
    pub token_count: usize,
}

/// Storage contract for recipient tokens and preferences
///
/// All mutation methods are idempotent under retry; callers never see
/// partial state.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Insert or refresh a token. A re-registered token value replaces the
    /// existing entry; the per-recipient cap is enforced by evicting the
    /// least-recently-used entries after insert.
    async fn register(
        &self,
        recipient_id: Uuid,
        registration: TokenRegistration,
    ) -> AppResult<PushToken>;

    /// Remove a token. Ok when the recipient or token is already gone.
    async fn remove_token(&self, recipient_id: Uuid, token: &str) -> AppResult<()>;

    /// Active tokens younger than `max_age`, in insertion order.
    async fn active_tokens(
        &self,
        recipient_id: Uuid,
        max_age: Duration,
    ) -> AppResult<Vec<PushToken>>;

    /// Mark a token as used right now and re-activate it. No-op if absent.
    async fn touch(&self, recipient_id: Uuid, token: &str) -> AppResult<()>;

    async fn recipient(&self, recipient_id: Uuid) -> AppResult<Option<RecipientView>>;

    async fn set_preferences(
        &self,
        recipient_id: Uuid,
        preferences: NotificationPreferences,
    ) -> AppResult<()>;

    async fn preferences(&self, recipient_id: Uuid)
        -> AppResult<Option<NotificationPreferences>>;

    /// Every known recipient id, for the admin broadcast sweep.
    async fn all_recipients(&self) -> AppResult<Vec<Uuid>>;
}

#[derive(Debug, Default)]
struct RecipientRecord {
    /// Insertion-ordered; token value unique within the vec
    tokens: Vec<PushToken>,
    preferences: Option<NotificationPreferences>,
}

/// In-memory token store
///
/// Single RwLock over the recipient map; every mutation completes under
/// one write guard, so the cap and uniqueness invariants hold under
/// concurrent dispatch.
pub struct InMemoryTokenStore {
    recipients: Arc<RwLock<HashMap<Uuid, RecipientRecord>>>,
    max_tokens_per_recipient: usize,
}

impl InMemoryTokenStore {
    pub fn new(max_tokens_per_recipient: usize) -> Self {
        Self {
            recipients: Arc::new(RwLock::new(HashMap::new())),
            max_tokens_per_recipient,
        }
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn register(
        &self,
        recipient_id: Uuid,
        registration: TokenRegistration,
    ) -> AppResult<PushToken> {
        let now = Utc::now();
        let token = PushToken {
            token: registration.token,
            provider: registration.provider,
            platform: DevicePlatform::normalize(&registration.platform),
            device_id: registration.device_id,
            device_name: registration.device_name,
            app_version: registration.app_version,
            os_version: registration.os_version,
            is_active: true,
            created_at: now,
            last_used_at: Some(now),
        };

        let mut recipients = self.recipients.write().await;
        let record = recipients.entry(recipient_id).or_default();

        record.tokens.retain(|t| t.token != token.token);
        record.tokens.push(token.clone());

        while record.tokens.len() > self.max_tokens_per_recipient {
            let lru = record
                .tokens
                .iter()
                .enumerate()
                .min_by_key(|(_, t)| t.last_used_at.unwrap_or(t.created_at))
                .map(|(i, _)| i);
            match lru {
                Some(index) => {
                    let evicted = record.tokens.remove(index);
                    debug!(
                        recipient_id = %recipient_id,
                        provider = evicted.provider.as_str(),
                        "evicted least-recently-used push token"
                    );
                }
                None => break,
            }
        }

        Ok(token)
    }

    async fn remove_token(&self, recipient_id: Uuid, token: &str) -> AppResult<()> {
        let mut recipients = self.recipients.write().await;
        if let Some(record) = recipients.get_mut(&recipient_id) {
            record.tokens.retain(|t| t.token != token);
        }
        Ok(())
    }

    async fn active_tokens(
        &self,
        recipient_id: Uuid,
        max_age: Duration,
    ) -> AppResult<Vec<PushToken>> {
        let cutoff = Utc::now() - max_age;
        let recipients = self.recipients.read().await;
        let tokens = recipients
            .get(&recipient_id)
            .map(|record| {
                record
                    .tokens
                    .iter()
                    .filter(|t| t.is_active && t.created_at > cutoff)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(tokens)
    }

    async fn touch(&self, recipient_id: Uuid, token: &str) -> AppResult<()> {
        let mut recipients = self.recipients.write().await;
        if let Some(record) = recipients.get_mut(&recipient_id) {
            if let Some(entry) = record.tokens.iter_mut().find(|t| t.token == token) {
                entry.last_used_at = Some(Utc::now());
                entry.is_active = true;
            }
        }
        Ok(())
    }

    async fn recipient(&self, recipient_id: Uuid) -> AppResult<Option<RecipientView>> {
        let recipients = self.recipients.read().await;
        Ok(recipients.get(&recipient_id).map(|record| RecipientView {
            preferences: record.preferences.clone(),
            token_count: record.tokens.len(),
        }))
    }

    async fn set_preferences(
        &self,
        recipient_id: Uuid,
        preferences: NotificationPreferences,
    ) -> AppResult<()> {
        let mut recipients = self.recipients.write().await;
        recipients.entry(recipient_id).or_default().preferences = Some(preferences);
        Ok(())
    }

    async fn preferences(
        &self,
        recipient_id: Uuid,
    ) -> AppResult<Option<NotificationPreferences>> {
        let recipients = self.recipients.read().await;
        Ok(recipients
            .get(&recipient_id)
            .and_then(|record| record.preferences.clone()))
    }

    async fn all_recipients(&self) -> AppResult<Vec<Uuid>> {
        let recipients = self.recipients.read().await;
        Ok(recipients.keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PushProviderKind;

    fn registration(token: &str) -> TokenRegistration {
        TokenRegistration {
            token: token.to_string(),
            provider: PushProviderKind::Fcm,
            platform: "android".to_string(),
            device_id: None,
            device_name: None,
            app_version: None,
            os_version: None,
        }
    }

    #[tokio::test]
    async fn test_register_caps_tokens_per_recipient() {
        let store = InMemoryTokenStore::new(5);
        let recipient = Uuid::new_v4();

        for i in 0..6 {
            store
                .register(recipient, registration(&format!("token-{}", i)))
                .await
                .unwrap();
        }

        let tokens = store
            .active_tokens(recipient, Duration::days(90))
            .await
            .unwrap();
        assert_eq!(tokens.len(), 5);
        // token-0 was the least recently used
        assert!(tokens.iter().all(|t| t.token != "token-0"));
    }

    #[tokio::test]
    async fn test_touch_protects_from_eviction() {
        let store = InMemoryTokenStore::new(5);
        let recipient = Uuid::new_v4();

        for i in 0..5 {
            store
                .register(recipient, registration(&format!("token-{}", i)))
                .await
                .unwrap();
        }
        store.touch(recipient, "token-0").await.unwrap();
        store
            .register(recipient, registration("token-5"))
            .await
            .unwrap();

        let tokens = store
            .active_tokens(recipient, Duration::days(90))
            .await
            .unwrap();
        assert_eq!(tokens.len(), 5);
        assert!(tokens.iter().any(|t| t.token == "token-0"));
        assert!(tokens.iter().all(|t| t.token != "token-1"));
    }

    #[tokio::test]
    async fn test_reregister_replaces_in_place() {
        let store = InMemoryTokenStore::new(5);
        let recipient = Uuid::new_v4();

        let first = store
            .register(recipient, registration("token-a"))
            .await
            .unwrap();
        store
            .register(recipient, registration("token-b"))
            .await
            .unwrap();

        let mut renewed = registration("token-a");
        renewed.device_name = Some("Pixel 8".to_string());
        let second = store.register(recipient, renewed).await.unwrap();

        let tokens = store
            .active_tokens(recipient, Duration::days(90))
            .await
            .unwrap();
        assert_eq!(tokens.len(), 2);
        // replaced entry moves to the insertion tail with fresh metadata
        assert_eq!(tokens[1].token, "token-a");
        assert_eq!(tokens[1].device_name.as_deref(), Some("Pixel 8"));
        assert!(second.last_used_at >= first.last_used_at);
    }

    #[tokio::test]
    async fn test_active_tokens_order_and_filtering() {
        let store = InMemoryTokenStore::new(5);
        let recipient = Uuid::new_v4();

        for name in ["token-a", "token-b", "token-c"] {
            store.register(recipient, registration(name)).await.unwrap();
        }

        {
            let mut recipients = store.recipients.write().await;
            let record = recipients.get_mut(&recipient).unwrap();
            record.tokens[0].created_at = Utc::now() - Duration::days(120);
            record.tokens[1].is_active = false;
        }

        let tokens = store
            .active_tokens(recipient, Duration::days(90))
            .await
            .unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token, "token-c");
    }

    #[tokio::test]
    async fn test_remove_token_is_idempotent() {
        let store = InMemoryTokenStore::new(5);
        let recipient = Uuid::new_v4();

        store.register(recipient, registration("token-a")).await.unwrap();
        store.remove_token(recipient, "token-a").await.unwrap();
        store.remove_token(recipient, "token-a").await.unwrap();
        store.remove_token(Uuid::new_v4(), "token-x").await.unwrap();

        let tokens = store
            .active_tokens(recipient, Duration::days(90))
            .await
            .unwrap();
        assert!(tokens.is_empty());
    }

    #[tokio::test]
    async fn test_preferences_roundtrip() {
        let store = InMemoryTokenStore::new(5);
        let recipient = Uuid::new_v4();

        assert!(store.preferences(recipient).await.unwrap().is_none());

        let prefs = NotificationPreferences {
            booking_updates: Some(false),
            ..Default::default()
        };
        store.set_preferences(recipient, prefs.clone()).await.unwrap();

        assert_eq!(store.preferences(recipient).await.unwrap(), Some(prefs));
        let view = store.recipient(recipient).await.unwrap().unwrap();
        assert_eq!(view.token_count, 0);
        assert!(view.preferences.is_some());
    }

    #[tokio::test]
    async fn test_unknown_platform_normalized_to_web() {
        let store = InMemoryTokenStore::new(5);
        let recipient = Uuid::new_v4();

        let mut reg = registration("token-a");
        reg.platform = "smartfridge".to_string();
        let token = store.register(recipient, reg).await.unwrap();
        assert_eq!(token.platform, DevicePlatform::Web);
    }
}
