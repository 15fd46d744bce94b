use thiserror::Error;

/// Main error type for an order-placement invocation
#[derive(Error, Debug)]
pub enum StratexError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Missing credentials or other conditions checked before validation
    #[error("Precondition failed: {0}")]
    Precondition(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Exchange errors surfaced outside the per-order isolation path
    // (connectivity probe, price snapshot)
    #[error("Exchange error: {0}")]
    Gateway(#[from] GatewayError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Planning errors
    #[error("Planning error: {0}")]
    Planning(String),

    // Crypto/signing errors
    #[error("Signature error: {0}")]
    Signature(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for StratexError
pub type Result<T> = std::result::Result<T, StratexError>;

/// Whether a parameter failed to parse or parsed but broke a range rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    Format,
    Range,
}

/// Rejected strategy parameters, with the human-readable reason
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub reason: String,
}

impl ValidationError {
    pub fn format(reason: impl Into<String>) -> Self {
        Self {
            kind: ValidationErrorKind::Format,
            reason: reason.into(),
        }
    }

    pub fn range(reason: impl Into<String>) -> Self {
        Self {
            kind: ValidationErrorKind::Range,
            reason: reason.into(),
        }
    }
}

/// Classified failure of a single exchange call.
///
/// Every variant is terminal for the attempt that produced it; nothing is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The exchange rejected a well-formed request (bad symbol, precision, business rule)
    #[error("Client rejected (code {code}): {message}")]
    ClientRejected { code: i64, message: String },

    /// Transient or server-side failure, including timeouts and refused connections
    #[error("Server unavailable: {message}")]
    ServerUnavailable { message: String },

    /// Anything else that went wrong during the attempt
    #[error("Unclassified error: {message}")]
    Unclassified { message: String },
}

impl GatewayError {
    pub fn client_rejected(code: i64, message: impl Into<String>) -> Self {
        Self::ClientRejected {
            code,
            message: message.into(),
        }
    }

    pub fn server_unavailable(message: impl Into<String>) -> Self {
        Self::ServerUnavailable {
            message: message.into(),
        }
    }

    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::Unclassified {
            message: message.into(),
        }
    }

    /// Stable label used in structured events
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ClientRejected { .. } => "ClientRejected",
            Self::ServerUnavailable { .. } => "ServerUnavailable",
            Self::Unclassified { .. } => "Unclassified",
        }
    }

    /// Exchange error code, when the exchange supplied one
    pub fn api_code(&self) -> Option<i64> {
        match self {
            Self::ClientRejected { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::ClientRejected { message, .. }
            | Self::ServerUnavailable { message }
            | Self::Unclassified { message } => message,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            GatewayError::server_unavailable(err.to_string())
        } else {
            GatewayError::unclassified(err.to_string())
        }
    }
}
