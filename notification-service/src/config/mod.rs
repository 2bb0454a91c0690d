use dotenvy::dotenv;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub fcm: FcmConfig,
    pub expo: ExpoConfig,
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcmConfig {
    /// Firebase project id; empty means FCM delivery is disabled.
    pub project_id: Option<String>,
    pub credentials_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpoConfig {
    /// Override for the push endpoint, mainly for local testing.
    pub push_url: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub fcm_batch_size: usize,
    pub expo_batch_size: usize,
    pub chunk_concurrency: usize,
    pub broadcast_concurrency: usize,
    pub send_deadline_secs: u64,
    pub token_max_age_days: i64,
    pub max_tokens_per_recipient: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            fcm_batch_size: 500,
            expo_batch_size: 100,
            chunk_concurrency: 4,
            broadcast_concurrency: 8,
            send_deadline_secs: 30,
            token_max_age_days: 90,
            max_tokens_per_recipient: 5,
        }
    }
}

impl DispatchConfig {
    pub fn send_deadline(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.send_deadline_secs)
    }

    pub fn token_max_age(&self) -> chrono::Duration {
        chrono::Duration::days(self.token_max_age_days)
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenv().ok();

        let defaults = DispatchConfig::default();

        Ok(Config {
            app: AppConfig {
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                port: parse_var("APP_PORT", 8084)?,
            },
            fcm: FcmConfig {
                project_id: non_empty_var("FCM_PROJECT_ID"),
                credentials_path: non_empty_var("FCM_CREDENTIALS_PATH"),
            },
            expo: ExpoConfig {
                push_url: non_empty_var("EXPO_PUSH_URL"),
                access_token: non_empty_var("EXPO_ACCESS_TOKEN"),
            },
            dispatch: DispatchConfig {
                fcm_batch_size: parse_var("DISPATCH_FCM_BATCH_SIZE", defaults.fcm_batch_size)?,
                expo_batch_size: parse_var("DISPATCH_EXPO_BATCH_SIZE", defaults.expo_batch_size)?,
                chunk_concurrency: parse_var(
                    "DISPATCH_CHUNK_CONCURRENCY",
                    defaults.chunk_concurrency,
                )?,
                broadcast_concurrency: parse_var(
                    "DISPATCH_BROADCAST_CONCURRENCY",
                    defaults.broadcast_concurrency,
                )?,
                send_deadline_secs: parse_var(
                    "DISPATCH_SEND_DEADLINE_SECS",
                    defaults.send_deadline_secs,
                )?,
                token_max_age_days: parse_var("TOKEN_MAX_AGE_DAYS", defaults.token_max_age_days)?,
                max_tokens_per_recipient: parse_var(
                    "MAX_TOKENS_PER_RECIPIENT",
                    defaults.max_tokens_per_recipient,
                )?,
            },
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> AppResult<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("invalid value for {}: {}", name, raw))),
        Err(_) => Ok(default),
    }
}
