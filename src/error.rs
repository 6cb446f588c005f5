use thiserror::Error;

/// Generic message shown for every transport-level failure
pub const UNREACHABLE_MESSAGE: &str = "Unable to reach the server. Please try again.";

/// Every failure the admin client can surface.
///
/// `Display` renders the message that is shown to the admin, so callers can
/// forward `error.to_string()` straight into a notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminError {
    /// Detected locally before any request was sent
    #[error("{0}")]
    Validation(String),

    /// Network unreachable, non-JSON body or unexpected response shape
    #[error("Unable to reach the server. Please try again.")]
    Transport { detail: String },

    /// A well-formed failure envelope returned by the backend
    #[error("{message}")]
    Backend { status: Option<u16>, message: String },

    /// No token in the auth store, or the backend rejected it
    #[error("Your session has expired. Please log in again.")]
    Unauthenticated,

    /// A destructive mutation was fired without an armed confirmation
    #[error("Please confirm before you {action}.")]
    ConfirmationRequired { action: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl AdminError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        Self::Transport {
            detail: detail.into(),
        }
    }

    pub fn backend(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    /// True for errors produced without talking to the backend
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::ConfirmationRequired { .. } | Self::Config(_)
        )
    }

    /// The message to show, falling back when the backend sent an empty one
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Backend { message, .. } if message.trim().is_empty() => fallback.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for AdminError {
    fn from(error: reqwest::Error) -> Self {
        Self::transport(error.to_string())
    }
}
