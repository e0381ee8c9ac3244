//! Bounded retry with exponential backoff around single delete calls.

use {
    prunebot_channels::{ChannelRef, ChatPlatform, MessageId, PlatformError},
    tokio_util::sync::CancellationToken,
    tracing::{debug, warn},
};

use crate::{error::SweepError, policy::RetryPolicy};

/// How a delete call ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Someone else removed the message first.
    AlreadyGone,
}

/// Delete one message, retrying transient failures.
///
/// `NotFound` is not an error. Non-transient errors fail immediately. The
/// backoff sleep is abandoned when `cancel` fires; an in-flight delete call
/// is not.
pub async fn delete_with_retry(
    platform: &dyn ChatPlatform,
    channel: &ChannelRef,
    message_id: MessageId,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<DeleteOutcome, SweepError> {
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 0..max_attempts {
        let error = match platform.delete_message(channel, message_id).await {
            Ok(()) => {
                if attempt > 0 {
                    debug!(
                        channel = %channel.name,
                        message_id = %message_id,
                        attempt = attempt + 1,
                        "delete succeeded after retry"
                    );
                }
                return Ok(DeleteOutcome::Deleted);
            },
            Err(PlatformError::NotFound(_)) => {
                debug!(
                    channel = %channel.name,
                    message_id = %message_id,
                    "message already deleted"
                );
                return Ok(DeleteOutcome::AlreadyGone);
            },
            Err(e) => e,
        };

        if !error.is_transient() || attempt + 1 == max_attempts {
            return Err(SweepError::DeleteFailed {
                message_id,
                attempts: attempt + 1,
                source: error,
            });
        }

        let delay = policy
            .delay_for_attempt(attempt)
            .max(error.retry_after().unwrap_or_default());
        warn!(
            channel = %channel.name,
            message_id = %message_id,
            error = %error,
            attempt = attempt + 1,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            "delete failed, will retry after delay"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SweepError::Cancelled),
            _ = tokio::time::sleep(delay) => {},
        }
    }

    // max_attempts >= 1, so the loop always returns.
    Err(SweepError::Cancelled)
}
