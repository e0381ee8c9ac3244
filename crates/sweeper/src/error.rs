use {
    chrono::{DateTime, Utc},
    prunebot_channels::{MessageId, PlatformError},
};

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("sweeper already started")]
    AlreadyStarted,

    #[error("sweeper was stopped")]
    Stopped,

    #[error("chat session never became ready: {0}")]
    NotReady(#[source] PlatformError),

    /// The platform yielded a message newer than the requested bound.
    #[error("message {message_id} created at {created_at} is newer than cutoff {cutoff}")]
    CutoffViolation {
        message_id: MessageId,
        created_at: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    },

    /// The platform yielded messages out of oldest-first order.
    #[error("message {message_id} created at {created_at} arrived after a message from {previous}")]
    OutOfOrder {
        message_id: MessageId,
        created_at: DateTime<Utc>,
        previous: DateTime<Utc>,
    },

    #[error("history walk failed: {0}")]
    History(#[source] PlatformError),

    #[error("failed to delete message {message_id} after {attempts} attempt(s): {source}")]
    DeleteFailed {
        message_id: MessageId,
        attempts: u32,
        source: PlatformError,
    },

    #[error("sweep cancelled")]
    Cancelled,
}

impl SweepError {
    /// Contract violations by the platform, as opposed to I/O failures.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::CutoffViolation { .. } | Self::OutOfOrder { .. })
    }
}
