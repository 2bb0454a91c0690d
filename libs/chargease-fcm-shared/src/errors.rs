use thiserror::Error;

/// FCM client error types
#[derive(Error, Debug)]
pub enum FcmError {
    #[error("invalid FCM project id {0:?}: expected lowercase letters, digits and hyphens")]
    InvalidProjectId(String),

    #[error("failed to read service account key {path}: {reason}")]
    CredentialsRead { path: String, reason: String },

    #[error("failed to parse service account key: {0}")]
    CredentialsParse(String),

    #[error("failed to parse private key: {0}")]
    KeyParse(String),

    #[error("failed to encode JWT: {0}")]
    JwtEncode(String),

    #[error("token request failed with status: {0}")]
    TokenRequestFailed(u16),

    #[error("failed to parse token response: {0}")]
    TokenParse(String),

    #[error("FCM send request failed: {0}")]
    SendRequest(String),

    #[error("failed to parse FCM response: {0}")]
    ResponseParse(String),

    /// Provider rejected the message. `error_code` carries the v1 error
    /// code (e.g. "UNREGISTERED") when the response body was parseable.
    #[error("FCM API error: status {status}, code {error_code:?}")]
    Api {
        status: u16,
        error_code: Option<String>,
        message: Option<String>,
    },
}

impl FcmError {
    /// True when the provider confirmed the registration token is dead.
    pub fn is_token_unregistered(&self) -> bool {
        match self {
            FcmError::Api {
                status, error_code, ..
            } => error_code.as_deref() == Some("UNREGISTERED") || *status == 404,
            _ => false,
        }
    }

    /// True when the provider rejected the request as malformed.
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            FcmError::Api {
                status, error_code, ..
            } => error_code.as_deref() == Some("INVALID_ARGUMENT") || *status == 400,
            _ => false,
        }
    }

    /// Rate limits, server errors and transport failures may succeed on
    /// a later attempt; none of them prove the token is dead.
    pub fn is_transient(&self) -> bool {
        match self {
            FcmError::Api { status, .. } => *status == 429 || *status >= 500,
            FcmError::SendRequest(_) | FcmError::TokenRequestFailed(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, code: Option<&str>) -> FcmError {
        FcmError::Api {
            status,
            error_code: code.map(|c| c.to_string()),
            message: None,
        }
    }

    #[test]
    fn test_unregistered_classification() {
        assert!(api(404, Some("UNREGISTERED")).is_token_unregistered());
        assert!(api(404, None).is_token_unregistered());
        assert!(api(200, Some("UNREGISTERED")).is_token_unregistered());
        assert!(!api(400, Some("INVALID_ARGUMENT")).is_token_unregistered());
        assert!(!FcmError::SendRequest("timeout".into()).is_token_unregistered());
    }

    #[test]
    fn test_invalid_argument_classification() {
        assert!(api(400, Some("INVALID_ARGUMENT")).is_invalid_argument());
        assert!(api(400, None).is_invalid_argument());
        assert!(!api(404, Some("UNREGISTERED")).is_invalid_argument());
    }

    #[test]
    fn test_transient_classification() {
        assert!(api(429, None).is_transient());
        assert!(api(500, None).is_transient());
        assert!(api(503, None).is_transient());
        assert!(FcmError::SendRequest("connection refused".into()).is_transient());
        assert!(FcmError::TokenRequestFailed(502).is_transient());
        assert!(!api(404, Some("UNREGISTERED")).is_transient());
        assert!(!api(400, None).is_transient());
    }
}
