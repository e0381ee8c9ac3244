use std::time::Duration;

/// Errors surfaced by a [`crate::ChatPlatform`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The target (message, channel, guild) no longer exists.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    /// Network or protocol failure talking to the platform.
    #[error("transport error: {0}")]
    Transport(String),

    /// The platform answered with a server-side error.
    #[error("platform unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Other(String),
}

impl PlatformError {
    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Transport(_) | Self::Unavailable(_)
        )
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
