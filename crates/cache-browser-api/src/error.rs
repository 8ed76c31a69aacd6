//! Cache service client errors.

/// Failure of one cache service call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// 401 or 403. The auth-error bus event has already been emitted.
    #[error("authentication required ({status}) for {endpoint}")]
    Auth { status: u16, endpoint: String },

    /// Any other non-2xx status.
    #[error("HTTP {status}: {status_text}")]
    Http {
        status: u16,
        status_text: String,
        body: String,
    },

    /// No usable response. The network-error bus event has already been
    /// emitted.
    #[error("network error: {message}")]
    Network { endpoint: String, message: String },

    /// The response body could not be read as announced.
    #[error("could not decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth { .. })
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network { .. } | ApiError::Decode { .. })
    }

    /// HTTP status, where one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Auth { status, .. } | ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for cache service calls.
pub type Result<T> = std::result::Result<T, ApiError>;
