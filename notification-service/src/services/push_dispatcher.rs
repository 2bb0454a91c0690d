use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::{stream, StreamExt};
use tracing::{debug, warn};

use crate::config::DispatchConfig;
use crate::metrics;
use crate::models::{DispatchOutcome, FailureKind, NotificationPayload, PushProviderKind};

/// Provider-facing send capability
///
/// Implementations never raise for per-token failures; every submitted
/// token maps to an outcome. The Expo adapter may drop malformed tokens
/// before the batch forms, producing fewer outcomes than inputs.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> PushProviderKind;

    /// Provider-documented ceiling for one network call.
    fn max_batch_size(&self) -> usize;

    async fn send(
        &self,
        tokens: &[String],
        payload: &NotificationPayload,
    ) -> Vec<DispatchOutcome>;
}

/// Batch dispatcher
///
/// Splits each provider's token list into provider-sized chunks and drives
/// all chunks concurrently (bounded) under a single dispatch deadline.
pub struct PushDispatcher {
    adapters: HashMap<PushProviderKind, Arc<dyn ProviderAdapter>>,
    config: DispatchConfig,
}

impl PushDispatcher {
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>, config: DispatchConfig) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.kind(), adapter))
            .collect();
        Self { adapters, config }
    }

    fn chunk_size(&self, adapter: &dyn ProviderAdapter) -> usize {
        let configured = match adapter.kind() {
            PushProviderKind::Fcm => self.config.fcm_batch_size,
            PushProviderKind::Expo => self.config.expo_batch_size,
        };
        configured.clamp(1, adapter.max_batch_size())
    }

    pub async fn dispatch(
        &self,
        tokens_by_provider: HashMap<PushProviderKind, Vec<String>>,
        payload: &NotificationPayload,
    ) -> Vec<DispatchOutcome> {
        let deadline = Instant::now() + self.config.send_deadline();

        // Sequence numbers restore chunk order after unordered completion.
        let mut chunks: Vec<(usize, Option<Arc<dyn ProviderAdapter>>, Vec<String>)> = Vec::new();
        for (provider, tokens) in tokens_by_provider {
            if tokens.is_empty() {
                continue;
            }
            match self.adapters.get(&provider) {
                Some(adapter) => {
                    for chunk in tokens.chunks(self.chunk_size(adapter.as_ref())) {
                        chunks.push((chunks.len(), Some(adapter.clone()), chunk.to_vec()));
                    }
                }
                None => {
                    warn!(
                        provider = provider.as_str(),
                        tokens = tokens.len(),
                        "no adapter registered for provider"
                    );
                    chunks.push((chunks.len(), None, tokens));
                }
            }
        }

        if chunks.is_empty() {
            return Vec::new();
        }
        debug!(chunks = chunks.len(), "dispatching token chunks");

        let mut results: Vec<(usize, Vec<DispatchOutcome>)> = stream::iter(chunks)
            .map(|(sequence, adapter, tokens)| async move {
                let outcomes = match adapter {
                    Some(adapter) => Self::send_chunk(adapter, tokens, payload, deadline).await,
                    None => tokens
                        .into_iter()
                        .map(|token| {
                            DispatchOutcome::failed(
                                token,
                                FailureKind::Unknown,
                                Some("no adapter registered for provider".to_string()),
                            )
                        })
                        .collect(),
                };
                (sequence, outcomes)
            })
            .buffer_unordered(self.config.chunk_concurrency.max(1))
            .collect()
            .await;

        results.sort_by_key(|(sequence, _)| *sequence);
        results
            .into_iter()
            .flat_map(|(_, outcomes)| outcomes)
            .collect()
    }

    async fn send_chunk(
        adapter: Arc<dyn ProviderAdapter>,
        tokens: Vec<String>,
        payload: &NotificationPayload,
        deadline: Instant,
    ) -> Vec<DispatchOutcome> {
        let provider = adapter.kind().as_str();

        let remaining = deadline.saturating_duration_since(Instant::now());
        let outcomes = if remaining.is_zero() {
            warn!(provider, chunk = tokens.len(), "dispatch deadline exhausted before send");
            Self::deadline_outcomes(tokens)
        } else {
            match tokio::time::timeout(remaining, adapter.send(&tokens, payload)).await {
                Ok(outcomes) => outcomes,
                Err(_) => {
                    warn!(provider, chunk = tokens.len(), "chunk send exceeded dispatch deadline");
                    Self::deadline_outcomes(tokens)
                }
            }
        };

        let sent = outcomes.iter().filter(|o| o.success).count() as u64;
        metrics::record_push_sent(provider, sent);
        for outcome in outcomes.iter().filter(|o| !o.success) {
            metrics::record_push_failed(provider, outcome.failure.as_str());
        }

        outcomes
    }

    fn deadline_outcomes(tokens: Vec<String>) -> Vec<DispatchOutcome> {
        tokens
            .into_iter()
            .map(|token| {
                DispatchOutcome::failed(
                    token,
                    FailureKind::Transient,
                    Some("dispatch deadline exceeded".to_string()),
                )
            })
            .collect()
    }
}
