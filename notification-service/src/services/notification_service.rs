use std::collections::HashMap;
use std::sync::Arc;

use futures::{stream, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use chargease_expo_shared::is_expo_push_token;
use chargease_fcm_shared::{is_plausible_registration_token, TopicSubscriptionResult};

use crate::config::DispatchConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    should_send, DispatchSummary, NotificationPayload, NotificationPreferences, PushProviderKind,
    PushToken, ServiceStatus, TokenRegistration,
};
use crate::services::expo_client::ExpoAdapter;
use crate::services::fcm_client::FcmAdapter;
use crate::services::push_dispatcher::{ProviderAdapter, PushDispatcher};
use crate::services::token_pruner::TokenPruner;
use crate::store::TokenStore;

/// Notification orchestrator
///
/// Owns the token store, the batch dispatcher and the pruner. Per-token
/// delivery failures never surface as errors from here; callers always get
/// an aggregated summary distinguishing suppressed, no-destination and
/// attempted dispatches.
pub struct NotificationService {
    store: Arc<dyn TokenStore>,
    dispatcher: PushDispatcher,
    pruner: TokenPruner,
    fcm: Arc<FcmAdapter>,
    expo: Arc<ExpoAdapter>,
    config: DispatchConfig,
}

impl NotificationService {
    pub fn new(
        store: Arc<dyn TokenStore>,
        fcm: Arc<FcmAdapter>,
        expo: Arc<ExpoAdapter>,
        config: DispatchConfig,
    ) -> Self {
        let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![fcm.clone(), expo.clone()];
        Self::with_adapters(store, adapters, fcm, expo, config)
    }

    /// Assemble with an explicit dispatch adapter set. The FCM adapter is
    /// still held separately for the topic API.
    pub fn with_adapters(
        store: Arc<dyn TokenStore>,
        adapters: Vec<Arc<dyn ProviderAdapter>>,
        fcm: Arc<FcmAdapter>,
        expo: Arc<ExpoAdapter>,
        config: DispatchConfig,
    ) -> Self {
        let dispatcher = PushDispatcher::new(adapters, config.clone());
        let pruner = TokenPruner::new(store.clone());
        Self {
            store,
            dispatcher,
            pruner,
            fcm,
            expo,
            config,
        }
    }

    /// Dispatch one notification to one recipient.
    ///
    /// Pipeline: validate, load recipient, preference gate, partition
    /// active tokens by provider, dispatch, prune invalid tokens. Pruning
    /// completes before this returns, so a `TOKEN_INVALID` token is gone
    /// from the store once the summary is in hand.
    pub async fn notify(
        &self,
        recipient_id: Uuid,
        payload: &NotificationPayload,
    ) -> AppResult<DispatchSummary> {
        payload.validate()?;

        let recipient = self
            .store
            .recipient(recipient_id)
            .await?
            .ok_or(AppError::RecipientNotFound(recipient_id))?;

        if !should_send(recipient.preferences.as_ref(), payload.category) {
            info!(
                recipient_id = %recipient_id,
                category = payload.category.as_str(),
                "notification suppressed by recipient preferences"
            );
            return Ok(DispatchSummary::suppressed());
        }

        let tokens = self
            .store
            .active_tokens(recipient_id, self.config.token_max_age())
            .await?;
        if tokens.is_empty() {
            info!(recipient_id = %recipient_id, "no active push destination");
            return Ok(DispatchSummary::no_destination());
        }

        let mut by_provider: HashMap<PushProviderKind, Vec<String>> = HashMap::new();
        for token in tokens {
            by_provider
                .entry(token.provider)
                .or_default()
                .push(token.token);
        }

        let outcomes = self.dispatcher.dispatch(by_provider, payload).await;
        let pruned = self.pruner.prune(recipient_id, &outcomes).await;

        let summary = DispatchSummary::from_outcomes(&outcomes);
        info!(
            recipient_id = %recipient_id,
            category = payload.category.as_str(),
            success = summary.success_count,
            failed = summary.failure_count,
            pruned,
            "dispatch complete"
        );
        Ok(summary)
    }

    /// Admin sweep over every known recipient with bounded fan-out.
    /// Per-recipient failures are folded into the aggregate; one bad
    /// recipient never aborts the broadcast. The aggregate status reads
    /// `Completed` only when at least one recipient was dispatched to,
    /// `Suppressed` when preferences silenced everyone, and
    /// `NoDestination` when there was nobody to reach.
    pub async fn broadcast(&self, payload: &NotificationPayload) -> AppResult<DispatchSummary> {
        payload.validate()?;

        let recipients = self.store.all_recipients().await?;
        info!(recipients = recipients.len(), "starting broadcast");

        let results: Vec<(Uuid, AppResult<DispatchSummary>)> = stream::iter(recipients)
            .map(|recipient_id| async move {
                (recipient_id, self.notify(recipient_id, payload).await)
            })
            .buffer_unordered(self.config.broadcast_concurrency.max(1))
            .collect()
            .await;

        let mut aggregate = DispatchSummary::no_destination();
        let mut errored = 0usize;
        for (recipient_id, result) in results {
            match result {
                Ok(summary) => aggregate.merge(summary),
                Err(error) => {
                    errored += 1;
                    warn!(recipient_id = %recipient_id, error = %error, "broadcast recipient failed");
                }
            }
        }

        info!(
            success = aggregate.success_count,
            failed = aggregate.failure_count,
            errored,
            "broadcast complete"
        );
        Ok(aggregate)
    }

    /// Validate and store a token registration.
    pub async fn register_token(
        &self,
        recipient_id: Uuid,
        mut registration: TokenRegistration,
    ) -> AppResult<PushToken> {
        registration.token = registration.token.trim().to_string();
        if registration.token.is_empty() {
            return Err(AppError::Validation("token must not be empty".to_string()));
        }

        let plausible = match registration.provider {
            PushProviderKind::Fcm => is_plausible_registration_token(&registration.token),
            PushProviderKind::Expo => is_expo_push_token(&registration.token),
        };
        if !plausible {
            return Err(AppError::Validation(format!(
                "token does not look like a {} token",
                registration.provider.as_str()
            )));
        }

        self.store.register(recipient_id, registration).await
    }

    pub async fn unregister_token(&self, recipient_id: Uuid, token: &str) -> AppResult<()> {
        self.store.remove_token(recipient_id, token).await
    }

    pub async fn touch_token(&self, recipient_id: Uuid, token: &str) -> AppResult<()> {
        self.store.touch(recipient_id, token).await
    }

    pub async fn preferences(&self, recipient_id: Uuid) -> AppResult<NotificationPreferences> {
        let view = self
            .store
            .recipient(recipient_id)
            .await?
            .ok_or(AppError::RecipientNotFound(recipient_id))?;
        Ok(view.preferences.unwrap_or_default())
    }

    pub async fn update_preferences(
        &self,
        recipient_id: Uuid,
        preferences: NotificationPreferences,
    ) -> AppResult<()> {
        self.store.set_preferences(recipient_id, preferences).await
    }

    /// Provider-level broadcast to a topic. Does not consult preferences:
    /// topic membership is opt-in at subscribe time.
    pub async fn send_to_topic(
        &self,
        topic: &str,
        payload: &NotificationPayload,
    ) -> AppResult<String> {
        payload.validate()?;
        self.fcm.send_to_topic(topic, payload).await
    }

    pub async fn subscribe_to_topic(
        &self,
        tokens: &[String],
        topic: &str,
    ) -> AppResult<TopicSubscriptionResult> {
        self.fcm.subscribe_to_topic(tokens, topic).await
    }

    pub async fn unsubscribe_from_topic(
        &self,
        tokens: &[String],
        topic: &str,
    ) -> AppResult<TopicSubscriptionResult> {
        self.fcm.unsubscribe_from_topic(tokens, topic).await
    }

    /// Dispatch-readiness view for one recipient.
    pub async fn status(&self, recipient_id: Uuid) -> AppResult<ServiceStatus> {
        self.store
            .recipient(recipient_id)
            .await?
            .ok_or(AppError::RecipientNotFound(recipient_id))?;

        let tokens = self
            .store
            .active_tokens(recipient_id, self.config.token_max_age())
            .await?;
        let fcm_tokens = tokens
            .iter()
            .filter(|t| t.provider == PushProviderKind::Fcm)
            .count();

        Ok(ServiceStatus {
            recipient_id,
            fcm_ready: self.fcm.is_ready(),
            expo_ready: self.expo.is_ready(),
            fcm_tokens,
            expo_tokens: tokens.len() - fcm_tokens,
        })
    }
}
