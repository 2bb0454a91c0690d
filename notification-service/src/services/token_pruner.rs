use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::metrics;
use crate::models::{DispatchOutcome, FailureKind};
use crate::store::TokenStore;

/// Removes tokens a provider confirmed permanently invalid
///
/// Best-effort: a store failure is logged and swallowed, never escalated
/// to the dispatch that triggered the prune.
pub struct TokenPruner {
    store: Arc<dyn TokenStore>,
}

impl TokenPruner {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Remove every `TOKEN_INVALID` outcome's token. Returns how many were
    /// removed.
    pub async fn prune(&self, recipient_id: Uuid, outcomes: &[DispatchOutcome]) -> usize {
        let invalid: Vec<&str> = outcomes
            .iter()
            .filter(|o| o.failure == FailureKind::TokenInvalid)
            .map(|o| o.token.as_str())
            .collect();
        if invalid.is_empty() {
            return 0;
        }

        let mut removed = 0;
        for token in invalid {
            match self.store.remove_token(recipient_id, token).await {
                Ok(()) => removed += 1,
                Err(error) => {
                    warn!(
                        recipient_id = %recipient_id,
                        error = %error,
                        "failed to prune invalid push token"
                    );
                }
            }
        }

        metrics::record_tokens_pruned(removed as u64);
        info!(recipient_id = %recipient_id, removed, "pruned invalid push tokens");
        removed
    }
}
