use thiserror::Error;

/// Failure taxonomy shared by the session store, the auth service client and
/// the credential storage. Messages are safe to show to a user; they never
/// carry token material.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// HTTP status carried by the error, if the server answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message without the variant prefix, used for inline form errors.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Config(message)
            | Self::Network(message)
            | Self::Timeout(message)
            | Self::Parse(message)
            | Self::Serialization(message)
            | Self::Validation(message)
            | Self::Storage(message)
            | Self::Http { message, .. } => message,
        }
    }
}
