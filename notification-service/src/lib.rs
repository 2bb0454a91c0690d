pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use handlers::*;
pub use services::*;
pub use store::{InMemoryTokenStore, TokenStore};
