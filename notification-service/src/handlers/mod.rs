use std::collections::HashMap;

use crate::error::AppError;
use crate::models::{NotificationCategory, NotificationPayload};

pub mod devices;
/// HTTP handlers for the notification dispatch API
pub mod notifications;
pub mod preferences;
pub mod topics;

pub use devices::*;
pub use notifications::*;
pub use preferences::*;
pub use topics::*;

/// Payload construction shared by the send, broadcast and topic routes.
/// The category string must name a known category: it selects the
/// preference toggle, so it is rejected rather than defaulted.
fn build_payload(
    title: String,
    body: String,
    category: &str,
    icon: Option<String>,
    click_action: Option<String>,
    extra_data: HashMap<String, String>,
) -> Result<NotificationPayload, AppError> {
    let category = NotificationCategory::parse(category)
        .ok_or_else(|| AppError::Validation(format!("unknown category: {}", category)))?;

    let mut payload = NotificationPayload::new(title, body, category);
    payload.icon = icon;
    payload.click_action = click_action;
    payload.extra_data = extra_data;
    Ok(payload)
}
