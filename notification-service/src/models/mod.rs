use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const DEFAULT_TITLE: &str = "ChargEase Notification";
pub const DEFAULT_BODY: &str = "You have a new notification";
pub const DEFAULT_CLICK_ACTION: &str = "/";

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_BODY_LEN: usize = 1000;
pub const MAX_EXTRA_ENTRIES: usize = 16;
pub const MAX_EXTRA_KEY_LEN: usize = 64;
pub const MAX_EXTRA_VALUE_LEN: usize = 1024;

/// Push provider enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum PushProviderKind {
    /// Firebase Cloud Messaging (Android/Web native tokens)
    Fcm,
    /// Expo push service (React Native apps)
    Expo,
}

impl PushProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushProviderKind::Fcm => "fcm",
            PushProviderKind::Expo => "expo",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fcm" => Some(PushProviderKind::Fcm),
            "expo" => Some(PushProviderKind::Expo),
            _ => None,
        }
    }
}

/// Device platform reported at registration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DevicePlatform {
    Ios,
    Android,
    Web,
    Unknown,
}

impl DevicePlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            DevicePlatform::Ios => "ios",
            DevicePlatform::Android => "android",
            DevicePlatform::Web => "web",
            DevicePlatform::Unknown => "unknown",
        }
    }

    /// Normalize a client-supplied platform string. Unrecognized values are
    /// logged and mapped to `Web` rather than rejected.
    pub fn normalize(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "ios" => DevicePlatform::Ios,
            "android" => DevicePlatform::Android,
            "web" => DevicePlatform::Web,
            "unknown" => DevicePlatform::Unknown,
            _ => {
                warn!(platform = raw, "unrecognized device platform, defaulting to web");
                DevicePlatform::Web
            }
        }
    }
}

/// Notification category enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationCategory {
    /// Booking was confirmed by the station vendor
    BookingConfirmed,
    /// Booking was cancelled (by either side)
    BookingCancelled,
    /// Upcoming booking reminder
    BookingReminder,
    /// Payment settled
    PaymentReceived,
    /// Payment declined or errored
    PaymentFailed,
    /// A watched station has a free connector
    StationAvailable,
    /// A station entered maintenance
    StationMaintenance,
    /// Product announcement
    Announcement,
    /// Operational messages (never user-suppressible)
    System,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::BookingConfirmed => "booking_confirmed",
            NotificationCategory::BookingCancelled => "booking_cancelled",
            NotificationCategory::BookingReminder => "booking_reminder",
            NotificationCategory::PaymentReceived => "payment_received",
            NotificationCategory::PaymentFailed => "payment_failed",
            NotificationCategory::StationAvailable => "station_available",
            NotificationCategory::StationMaintenance => "station_maintenance",
            NotificationCategory::Announcement => "announcement",
            NotificationCategory::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "booking_confirmed" => Some(NotificationCategory::BookingConfirmed),
            "booking_cancelled" => Some(NotificationCategory::BookingCancelled),
            "booking_reminder" => Some(NotificationCategory::BookingReminder),
            "payment_received" => Some(NotificationCategory::PaymentReceived),
            "payment_failed" => Some(NotificationCategory::PaymentFailed),
            "station_available" => Some(NotificationCategory::StationAvailable),
            "station_maintenance" => Some(NotificationCategory::StationMaintenance),
            "announcement" => Some(NotificationCategory::Announcement),
            "system" => Some(NotificationCategory::System),
            _ => None,
        }
    }

    /// The preference toggle gating this category. `None` means the
    /// category is always sendable.
    pub fn preference_toggle(&self) -> Option<PreferenceToggle> {
        match self {
            NotificationCategory::BookingConfirmed
            | NotificationCategory::BookingCancelled
            | NotificationCategory::BookingReminder => Some(PreferenceToggle::BookingUpdates),
            NotificationCategory::PaymentReceived | NotificationCategory::PaymentFailed => {
                Some(PreferenceToggle::PaymentUpdates)
            }
            NotificationCategory::StationAvailable | NotificationCategory::StationMaintenance => {
                Some(PreferenceToggle::StationUpdates)
            }
            NotificationCategory::Announcement => Some(PreferenceToggle::GeneralAnnouncements),
            NotificationCategory::System => None,
        }
    }
}

/// Per-category preference toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceToggle {
    BookingUpdates,
    PaymentUpdates,
    StationUpdates,
    GeneralAnnouncements,
}

impl PreferenceToggle {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceToggle::BookingUpdates => "booking_updates",
            PreferenceToggle::PaymentUpdates => "payment_updates",
            PreferenceToggle::StationUpdates => "station_updates",
            PreferenceToggle::GeneralAnnouncements => "general_announcements",
        }
    }
}

/// Notification preferences per recipient
///
/// Every toggle is tri-state: absent means the recipient never expressed a
/// choice and delivery proceeds. Only an explicit `false` suppresses.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationPreferences {
    pub booking_updates: Option<bool>,
    pub payment_updates: Option<bool>,
    pub station_updates: Option<bool>,
    pub general_announcements: Option<bool>,
}

impl NotificationPreferences {
    pub fn toggle(&self, toggle: PreferenceToggle) -> Option<bool> {
        match toggle {
            PreferenceToggle::BookingUpdates => self.booking_updates,
            PreferenceToggle::PaymentUpdates => self.payment_updates,
            PreferenceToggle::StationUpdates => self.station_updates,
            PreferenceToggle::GeneralAnnouncements => self.general_announcements,
        }
    }
}

/// Preference gate: fail-open. Missing preferences, missing toggles and
/// unmapped categories all allow delivery; only `Some(false)` suppresses.
pub fn should_send(
    preferences: Option<&NotificationPreferences>,
    category: NotificationCategory,
) -> bool {
    match category.preference_toggle() {
        Some(toggle) => preferences
            .and_then(|p| p.toggle(toggle))
            .unwrap_or(true),
        None => true,
    }
}

/// Registered push token for a recipient device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushToken {
    /// Opaque provider token; unique key within a recipient
    pub token: String,

    /// Provider the token belongs to, fixed at registration
    pub provider: PushProviderKind,

    /// Normalized device platform
    pub platform: DevicePlatform,

    /// Client-reported device identifier
    pub device_id: Option<String>,

    /// Human-readable device name
    pub device_name: Option<String>,

    /// App version at registration
    pub app_version: Option<String>,

    /// OS version at registration
    pub os_version: Option<String>,

    /// Inactive tokens are skipped at dispatch but kept until pruned
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last touch or successful registration refresh
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Write-shape accepted by the token store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRegistration {
    pub token: String,
    pub provider: PushProviderKind,
    /// Raw platform string; normalized by the store
    pub platform: String,
    pub device_id: Option<String>,
    pub device_name: Option<String>,
    pub app_version: Option<String>,
    pub os_version: Option<String>,
}

/// Notification content, built once and shared by every provider adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,

    /// Icon reference for providers that support one
    pub icon: Option<String>,

    /// Category for preference gating and client-side routing
    pub category: NotificationCategory,

    /// In-app route opened on tap; defaults to "/"
    pub click_action: Option<String>,

    /// Flat string map forwarded to the client
    #[serde(default)]
    pub extra_data: HashMap<String, String>,
}

impl NotificationPayload {
    pub fn new(title: String, body: String, category: NotificationCategory) -> Self {
        Self {
            title,
            body,
            icon: None,
            category,
            click_action: None,
            extra_data: HashMap::new(),
        }
    }

    /// Title with the wire-level fallback applied.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            DEFAULT_TITLE
        } else {
            &self.title
        }
    }

    /// Body with the wire-level fallback applied.
    pub fn display_body(&self) -> &str {
        if self.body.trim().is_empty() {
            DEFAULT_BODY
        } else {
            &self.body
        }
    }

    pub fn click_action_or_default(&self) -> &str {
        self.click_action.as_deref().unwrap_or(DEFAULT_CLICK_ACTION)
    }

    /// Bounds check before any provider call. Empty title/body pass (the
    /// fallbacks cover them); oversized content is rejected.
    pub fn validate(&self) -> AppResult<()> {
        if self.title.len() > MAX_TITLE_LEN {
            return Err(AppError::Validation(format!(
                "title exceeds {} characters",
                MAX_TITLE_LEN
            )));
        }
        if self.body.len() > MAX_BODY_LEN {
            return Err(AppError::Validation(format!(
                "body exceeds {} characters",
                MAX_BODY_LEN
            )));
        }
        if self.extra_data.len() > MAX_EXTRA_ENTRIES {
            return Err(AppError::Validation(format!(
                "extra_data exceeds {} entries",
                MAX_EXTRA_ENTRIES
            )));
        }
        for (key, value) in &self.extra_data {
            if key.is_empty() || key.len() > MAX_EXTRA_KEY_LEN {
                return Err(AppError::Validation(format!(
                    "extra_data key {:?} outside 1..={} characters",
                    key, MAX_EXTRA_KEY_LEN
                )));
            }
            if value.len() > MAX_EXTRA_VALUE_LEN {
                return Err(AppError::Validation(format!(
                    "extra_data value for {:?} exceeds {} characters",
                    key, MAX_EXTRA_VALUE_LEN
                )));
            }
        }
        Ok(())
    }
}

/// Per-token failure classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Delivery accepted by the provider
    None,
    /// Provider confirmed the token is permanently dead
    TokenInvalid,
    /// Worth retrying on a later dispatch
    Transient,
    /// The message itself was rejected
    Validation,
    /// Unclassified failure
    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::None => "none",
            FailureKind::TokenInvalid => "token_invalid",
            FailureKind::Transient => "transient",
            FailureKind::Validation => "validation",
            FailureKind::Unknown => "unknown",
        }
    }
}

/// Result of one send attempt for one token
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub token: String,
    pub success: bool,
    pub failure: FailureKind,
    /// Provider diagnostic retained for logging
    pub message: Option<String>,
}

impl DispatchOutcome {
    pub fn ok(token: String) -> Self {
        Self {
            token,
            success: true,
            failure: FailureKind::None,
            message: None,
        }
    }

    pub fn failed(token: String, failure: FailureKind, message: Option<String>) -> Self {
        Self {
            token,
            success: false,
            failure,
            message,
        }
    }
}

/// Terminal state of a notify call
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchStatus {
    /// Delivery was attempted; counts describe the result
    Completed,
    /// Recipient preferences suppressed the category
    Suppressed,
    /// Recipient exists but has no active destination
    NoDestination,
}

impl DispatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Completed => "completed",
            DispatchStatus::Suppressed => "suppressed",
            DispatchStatus::NoDestination => "no_destination",
        }
    }
}

/// Aggregate view of a dispatch returned to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub status: DispatchStatus,
    pub success_count: usize,
    pub failure_count: usize,
    /// Tokens the provider reported permanently dead (pruned by the caller)
    pub invalid_tokens: Vec<String>,
}

impl DispatchSummary {
    pub fn suppressed() -> Self {
        Self {
            status: DispatchStatus::Suppressed,
            success_count: 0,
            failure_count: 0,
            invalid_tokens: Vec::new(),
        }
    }

    pub fn no_destination() -> Self {
        Self {
            status: DispatchStatus::NoDestination,
            success_count: 0,
            failure_count: 0,
            invalid_tokens: Vec::new(),
        }
    }

    pub fn from_outcomes(outcomes: &[DispatchOutcome]) -> Self {
        let success_count = outcomes.iter().filter(|o| o.success).count();
        let invalid_tokens = outcomes
            .iter()
            .filter(|o| o.failure == FailureKind::TokenInvalid)
            .map(|o| o.token.clone())
            .collect();

        Self {
            status: DispatchStatus::Completed,
            success_count,
            failure_count: outcomes.len() - success_count,
            invalid_tokens,
        }
    }

    /// Fold another summary in (broadcast aggregation). Counts and invalid
    /// tokens accumulate. The status keeps the strongest signal seen: an
    /// attempted dispatch outranks suppression, which outranks having no
    /// destination, so the aggregate reads `Completed` only when at least
    /// one recipient was actually dispatched to.
    pub fn merge(&mut self, other: DispatchSummary) {
        self.status = match (self.status, other.status) {
            (DispatchStatus::Completed, _) | (_, DispatchStatus::Completed) => {
                DispatchStatus::Completed
            }
            (DispatchStatus::Suppressed, _) | (_, DispatchStatus::Suppressed) => {
                DispatchStatus::Suppressed
            }
            _ => DispatchStatus::NoDestination,
        };
        self.success_count += other.success_count;
        self.failure_count += other.failure_count;
        self.invalid_tokens.extend(other.invalid_tokens);
    }
}

/// Dispatch-readiness snapshot for the status endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub recipient_id: Uuid,
    pub fcm_ready: bool,
    pub expo_ready: bool,
    pub fcm_tokens: usize,
    pub expo_tokens: usize,
}
