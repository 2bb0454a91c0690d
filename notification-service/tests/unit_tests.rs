/// Unit tests for notification-service core functionality
///
/// This test module covers:
/// - Preference gating (should_send)
/// - Category and platform parsing helpers
/// - Payload validation and display fallbacks
/// - Dispatch summary aggregation
use notification_service::models::*;
use std::collections::HashMap;

#[test]
fn test_should_send_defaults_to_enabled() {
    // No stored preferences means nothing was ever disabled
    let categories = vec![
        NotificationCategory::BookingConfirmed,
        NotificationCategory::BookingCancelled,
        NotificationCategory::BookingReminder,
        NotificationCategory::PaymentReceived,
        NotificationCategory::PaymentFailed,
        NotificationCategory::StationAvailable,
        NotificationCategory::StationMaintenance,
        NotificationCategory::Announcement,
        NotificationCategory::System,
    ];

    for category in categories {
        assert!(should_send(None, category), "{:?}", category);
    }
}

#[test]
fn test_should_send_unset_toggle_is_enabled() {
    let prefs = NotificationPreferences::default();

    assert!(should_send(
        Some(&prefs),
        NotificationCategory::BookingConfirmed
    ));
    assert!(should_send(
        Some(&prefs),
        NotificationCategory::Announcement
    ));
}

#[test]
fn test_should_send_respects_disabled_toggle() {
    let prefs = NotificationPreferences {
        booking_updates: Some(false),
        ..Default::default()
    };

    assert!(!should_send(
        Some(&prefs),
        NotificationCategory::BookingConfirmed
    ));
    assert!(!should_send(
        Some(&prefs),
        NotificationCategory::BookingCancelled
    ));
    assert!(!should_send(
        Some(&prefs),
        NotificationCategory::BookingReminder
    ));

    // Other toggles are untouched
    assert!(should_send(
        Some(&prefs),
        NotificationCategory::PaymentReceived
    ));
    assert!(should_send(
        Some(&prefs),
        NotificationCategory::StationAvailable
    ));
}

#[test]
fn test_should_send_system_ignores_preferences() {
    // System notifications have no toggle and always go out
    let prefs = NotificationPreferences {
        booking_updates: Some(false),
        payment_updates: Some(false),
        station_updates: Some(false),
        general_announcements: Some(false),
    };

    assert!(should_send(Some(&prefs), NotificationCategory::System));
    assert!(!should_send(
        Some(&prefs),
        NotificationCategory::Announcement
    ));
}

#[test]
fn test_category_toggle_mapping() {
    let booking = [
        NotificationCategory::BookingConfirmed,
        NotificationCategory::BookingCancelled,
        NotificationCategory::BookingReminder,
    ];
    for category in booking {
        assert_eq!(
            category.preference_toggle(),
            Some(PreferenceToggle::BookingUpdates)
        );
    }

    assert_eq!(
        NotificationCategory::PaymentReceived.preference_toggle(),
        Some(PreferenceToggle::PaymentUpdates)
    );
    assert_eq!(
        NotificationCategory::PaymentFailed.preference_toggle(),
        Some(PreferenceToggle::PaymentUpdates)
    );
    assert_eq!(
        NotificationCategory::StationAvailable.preference_toggle(),
        Some(PreferenceToggle::StationUpdates)
    );
    assert_eq!(
        NotificationCategory::StationMaintenance.preference_toggle(),
        Some(PreferenceToggle::StationUpdates)
    );
    assert_eq!(
        NotificationCategory::Announcement.preference_toggle(),
        Some(PreferenceToggle::GeneralAnnouncements)
    );
    assert_eq!(NotificationCategory::System.preference_toggle(), None);
}

#[test]
fn test_category_parsing() {
    assert_eq!(
        NotificationCategory::parse("booking_confirmed"),
        Some(NotificationCategory::BookingConfirmed)
    );
    // Parsing is case-insensitive, matching the wire casing too
    assert_eq!(
        NotificationCategory::parse("BOOKING_CONFIRMED"),
        Some(NotificationCategory::BookingConfirmed)
    );
    assert_eq!(
        NotificationCategory::parse("station_maintenance"),
        Some(NotificationCategory::StationMaintenance)
    );
    assert_eq!(NotificationCategory::parse("newsletter"), None);
    assert_eq!(NotificationCategory::parse(""), None);
}

#[test]
fn test_category_wire_casing() {
    let json = serde_json::to_string(&NotificationCategory::BookingConfirmed).unwrap();
    assert_eq!(json, "\"BOOKING_CONFIRMED\"");

    let parsed: NotificationCategory = serde_json::from_str("\"STATION_AVAILABLE\"").unwrap();
    assert_eq!(parsed, NotificationCategory::StationAvailable);
}

#[test]
fn test_provider_parsing() {
    assert_eq!(PushProviderKind::parse("fcm"), Some(PushProviderKind::Fcm));
    assert_eq!(PushProviderKind::parse("FCM"), Some(PushProviderKind::Fcm));
    assert_eq!(
        PushProviderKind::parse("expo"),
        Some(PushProviderKind::Expo)
    );
    assert_eq!(PushProviderKind::parse("apns"), None);
    assert_eq!(PushProviderKind::parse(""), None);
}

#[test]
fn test_platform_normalization() {
    assert_eq!(DevicePlatform::normalize("ios"), DevicePlatform::Ios);
    assert_eq!(DevicePlatform::normalize("iOS"), DevicePlatform::Ios);
    assert_eq!(
        DevicePlatform::normalize("ANDROID"),
        DevicePlatform::Android
    );
    assert_eq!(DevicePlatform::normalize("web"), DevicePlatform::Web);
    assert_eq!(
        DevicePlatform::normalize("unknown"),
        DevicePlatform::Unknown
    );

    // Unrecognized values fall back to web rather than failing registration
    assert_eq!(DevicePlatform::normalize("kaios"), DevicePlatform::Web);
    assert_eq!(DevicePlatform::normalize(""), DevicePlatform::Web);
}

#[test]
fn test_payload_display_fallbacks() {
    let payload = NotificationPayload::new(
        "  ".to_string(),
        String::new(),
        NotificationCategory::System,
    );

    assert_eq!(payload.display_title(), DEFAULT_TITLE);
    assert_eq!(payload.display_body(), DEFAULT_BODY);
    assert_eq!(payload.click_action_or_default(), DEFAULT_CLICK_ACTION);

    let payload = NotificationPayload::new(
        "Charger ready".to_string(),
        "Bay 4 is free".to_string(),
        NotificationCategory::StationAvailable,
    );
    assert_eq!(payload.display_title(), "Charger ready");
    assert_eq!(payload.display_body(), "Bay 4 is free");
}

#[test]
fn test_payload_validation_bounds() {
    let ok = NotificationPayload::new(
        "Booking confirmed".to_string(),
        "See you at 14:00".to_string(),
        NotificationCategory::BookingConfirmed,
    );
    assert!(ok.validate().is_ok());

    // Empty title is fine, the display fallback covers it
    let empty = NotificationPayload::new(
        String::new(),
        String::new(),
        NotificationCategory::System,
    );
    assert!(empty.validate().is_ok());

    let mut long_title = ok.clone();
    long_title.title = "x".repeat(MAX_TITLE_LEN + 1);
    assert!(long_title.validate().is_err());

    let mut long_body = ok.clone();
    long_body.body = "x".repeat(MAX_BODY_LEN + 1);
    assert!(long_body.validate().is_err());

    let mut too_many_entries = ok.clone();
    for i in 0..=MAX_EXTRA_ENTRIES {
        too_many_entries
            .extra_data
            .insert(format!("k{}", i), "v".to_string());
    }
    assert!(too_many_entries.validate().is_err());

    let mut long_key = ok.clone();
    long_key
        .extra_data
        .insert("k".repeat(MAX_EXTRA_KEY_LEN + 1), "v".to_string());
    assert!(long_key.validate().is_err());

    let mut long_value = ok.clone();
    long_value
        .extra_data
        .insert("k".to_string(), "v".repeat(MAX_EXTRA_VALUE_LEN + 1));
    assert!(long_value.validate().is_err());
}

#[test]
fn test_dispatch_summary_from_outcomes() {
    let outcomes = vec![
        DispatchOutcome::ok("token-a".to_string()),
        DispatchOutcome::failed(
            "token-b".to_string(),
            FailureKind::TokenInvalid,
            Some("UNREGISTERED".to_string()),
        ),
        DispatchOutcome::failed("token-c".to_string(), FailureKind::Transient, None),
        DispatchOutcome::ok("token-d".to_string()),
    ];

    let summary = DispatchSummary::from_outcomes(&outcomes);
    assert_eq!(summary.status, DispatchStatus::Completed);
    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.failure_count, 2);
    // Only the permanently dead token is reported for pruning
    assert_eq!(summary.invalid_tokens, vec!["token-b".to_string()]);
}

#[test]
fn test_dispatch_summary_merge() {
    let mut total = DispatchSummary::from_outcomes(&[
        DispatchOutcome::ok("a".to_string()),
        DispatchOutcome::failed("b".to_string(), FailureKind::TokenInvalid, None),
    ]);

    total.merge(DispatchSummary::from_outcomes(&[
        DispatchOutcome::ok("c".to_string()),
        DispatchOutcome::ok("d".to_string()),
        DispatchOutcome::failed("e".to_string(), FailureKind::Unknown, None),
    ]));
    total.merge(DispatchSummary::suppressed());

    // An attempted dispatch keeps the aggregate Completed
    assert_eq!(total.status, DispatchStatus::Completed);
    assert_eq!(total.success_count, 3);
    assert_eq!(total.failure_count, 2);
    assert_eq!(total.invalid_tokens, vec!["b".to_string()]);
}

#[test]
fn test_dispatch_summary_merge_folds_status() {
    // Nothing merged in yet: nothing to reach
    let mut total = DispatchSummary::no_destination();
    assert_eq!(total.status, DispatchStatus::NoDestination);

    // A suppressed recipient outranks an empty sweep
    total.merge(DispatchSummary::suppressed());
    assert_eq!(total.status, DispatchStatus::Suppressed);

    total.merge(DispatchSummary::no_destination());
    assert_eq!(total.status, DispatchStatus::Suppressed);

    // One real dispatch flips the aggregate to Completed for good
    total.merge(DispatchSummary::from_outcomes(&[DispatchOutcome::ok(
        "a".to_string(),
    )]));
    assert_eq!(total.status, DispatchStatus::Completed);

    total.merge(DispatchSummary::suppressed());
    assert_eq!(total.status, DispatchStatus::Completed);
    assert_eq!(total.success_count, 1);
}

#[test]
fn test_dispatch_status_labels() {
    assert_eq!(DispatchStatus::Completed.as_str(), "completed");
    assert_eq!(DispatchStatus::Suppressed.as_str(), "suppressed");
    assert_eq!(DispatchStatus::NoDestination.as_str(), "no_destination");

    let empty = DispatchSummary::suppressed();
    assert_eq!(empty.status, DispatchStatus::Suppressed);
    assert_eq!(empty.success_count, 0);
    assert_eq!(empty.failure_count, 0);

    let idle = DispatchSummary::no_destination();
    assert_eq!(idle.status, DispatchStatus::NoDestination);
    assert!(idle.invalid_tokens.is_empty());
}

#[test]
fn test_failure_kind_labels() {
    // Labels feed the push_failed metric; they stay lowercase
    assert_eq!(FailureKind::TokenInvalid.as_str(), "token_invalid");
    assert_eq!(FailureKind::Transient.as_str(), "transient");
    assert_eq!(FailureKind::Validation.as_str(), "validation");
    assert_eq!(FailureKind::Unknown.as_str(), "unknown");
}

#[test]
fn test_preferences_deserialize_missing_fields() {
    // Older clients may send partial documents
    let prefs: NotificationPreferences = serde_json::from_str("{}").unwrap();
    assert_eq!(prefs, NotificationPreferences::default());

    let prefs: NotificationPreferences =
        serde_json::from_str(r#"{"booking_updates": false}"#).unwrap();
    assert_eq!(prefs.booking_updates, Some(false));
    assert_eq!(prefs.payment_updates, None);
}

#[test]
fn test_extra_data_round_trip_through_payload() {
    let mut extra = HashMap::new();
    extra.insert("booking_id".to_string(), "bk_123".to_string());
    extra.insert("station_id".to_string(), "st_9".to_string());

    let mut payload = NotificationPayload::new(
        "Booking confirmed".to_string(),
        "Stall 2, 14:00".to_string(),
        NotificationCategory::BookingConfirmed,
    );
    payload.extra_data = extra;
    payload.click_action = Some("/bookings/bk_123".to_string());

    assert!(payload.validate().is_ok());
    assert_eq!(payload.click_action_or_default(), "/bookings/bk_123");
    assert_eq!(
        payload.extra_data.get("booking_id").map(String::as_str),
        Some("bk_123")
    );
}
