use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExpoError {
    #[error("Expo request failed: {0}")]
    SendRequest(String),

    #[error("Failed to parse Expo response: {0}")]
    ResponseParse(String),

    #[error("Expo ticket count mismatch: sent {sent}, received {received}")]
    TicketMismatch { sent: usize, received: usize },

    #[error("Expo API error (status {status}): {message:?}")]
    Api { status: u16, message: Option<String> },
}

impl ExpoError {
    /// True when the whole request is worth retrying later.
    pub fn is_transient(&self) -> bool {
        match self {
            ExpoError::SendRequest(_) => true,
            ExpoError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
