/// ChargEase FCM Shared Library
///
/// This library provides the Firebase Cloud Messaging (FCM) HTTP v1 client
/// used for Android and Web push delivery across the ChargEase platform.
///
/// It handles:
/// - OAuth2 token generation using Google service accounts
/// - Token caching with automatic refresh
/// - Single-message delivery with typed wire payloads
/// - Topic sends and IID batch subscribe/unsubscribe
/// - Registration token plausibility checks

pub mod client;
pub mod errors;
pub mod models;

pub use client::{is_plausible_registration_token, FcmClient};
pub use errors::FcmError;
pub use models::{
    FcmMessageBody, FcmSendResult, ServiceAccountKey, TopicSubscriptionResult,
};
