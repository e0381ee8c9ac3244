use std::fmt;

use {
    chrono::{DateTime, Utc},
    prunebot_channels::{ChannelId, GuildId, Permission},
    tracing::info,
};

use crate::error::SweepError;

/// What happened to one channel during a sweep.
#[derive(Debug)]
pub enum ChannelOutcome {
    /// The history walk ran to completion.
    Purged { deleted: usize, already_gone: usize },
    /// Dry run: eligible messages were counted, nothing was deleted.
    DryRun { eligible: usize },
    /// No message older than the cutoff exists.
    NothingToPurge,
    MissingPermission(Permission),
    ChannelNotFound,
    /// The guild or the bot's member in it could not be resolved.
    GuildUnavailable,
    /// Resolving, permission checking or probing failed.
    Failed(String),
    /// The walk started but was abandoned part way.
    Aborted { deleted: usize, error: SweepError },
    /// The sweeper was stopped while this channel was being purged.
    Cancelled { deleted: usize },
}

impl ChannelOutcome {
    pub fn deleted(&self) -> usize {
        match self {
            Self::Purged { deleted, .. } |
            Self::Aborted { deleted, .. } |
            Self::Cancelled { deleted } => *deleted,
            _ => 0,
        }
    }
}

impl fmt::Display for ChannelOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Purged {
                deleted,
                already_gone,
            } => write!(f, "purged {deleted} ({already_gone} already gone)"),
            Self::DryRun { eligible } => write!(f, "dry run, {eligible} eligible"),
            Self::NothingToPurge => f.write_str("nothing to purge"),
            Self::MissingPermission(p) => write!(f, "skipped, not able to {p}"),
            Self::ChannelNotFound => f.write_str("channel not found"),
            Self::GuildUnavailable => f.write_str("guild unavailable"),
            Self::Failed(e) => write!(f, "failed: {e}"),
            Self::Aborted { deleted, error } => {
                write!(f, "aborted after {deleted} deletions: {error}")
            },
            Self::Cancelled { deleted } => write!(f, "cancelled after {deleted} deletions"),
        }
    }
}

#[derive(Debug)]
pub struct ChannelReport {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub outcome: ChannelOutcome,
}

/// Result of one sweep run. Only used for logging and tests.
#[derive(Debug)]
pub struct SweepReport {
    pub cutoff: DateTime<Utc>,
    pub channels: Vec<ChannelReport>,
    /// The sweep stopped before visiting every channel.
    pub cancelled: bool,
}

impl SweepReport {
    pub fn new(cutoff: DateTime<Utc>) -> Self {
        Self {
            cutoff,
            channels: Vec::new(),
            cancelled: false,
        }
    }

    pub fn total_deleted(&self) -> usize {
        self.channels.iter().map(|c| c.outcome.deleted()).sum()
    }

    pub fn get(&self, channel_id: ChannelId) -> Option<&ChannelOutcome> {
        self.channels
            .iter()
            .find(|c| c.channel_id == channel_id)
            .map(|c| &c.outcome)
    }

    pub fn visited(&self) -> Vec<ChannelId> {
        self.channels.iter().map(|c| c.channel_id).collect()
    }

    pub fn log_summary(&self) {
        let skipped = self
            .channels
            .iter()
            .filter(|c| {
                matches!(
                    c.outcome,
                    ChannelOutcome::MissingPermission(_) |
                        ChannelOutcome::ChannelNotFound |
                        ChannelOutcome::GuildUnavailable
                )
            })
            .count();
        let failed = self
            .channels
            .iter()
            .filter(|c| {
                matches!(
                    c.outcome,
                    ChannelOutcome::Failed(_) | ChannelOutcome::Aborted { .. }
                )
            })
            .count();
        info!(
            cutoff = %self.cutoff,
            channels = self.channels.len(),
            deleted = self.total_deleted(),
            skipped,
            failed,
            cancelled = self.cancelled,
            "retention sweep finished"
        );
    }
}
