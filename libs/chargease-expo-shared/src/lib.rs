//! Shared Expo push client library for ChargEase services
//!
//! Provides a thin client for the Expo push API used by the React Native
//! apps, with ticket-level error reporting and chunked delivery.

pub mod client;
pub mod errors;
pub mod models;

pub use client::{is_expo_push_token, ExpoClient, EXPO_CHUNK_LIMIT};
pub use errors::ExpoError;
pub use models::{ExpoPushMessage, ExpoPushTicket, ExpoTicketDetails};
