pub mod expo_client;
pub mod fcm_client;
pub mod notification_service;
pub mod push_dispatcher;
pub mod token_pruner;

pub use expo_client::*;
pub use fcm_client::*;
pub use notification_service::*;
pub use push_dispatcher::*;
pub use token_pruner::*;
