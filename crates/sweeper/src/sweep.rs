//! One retention sweep over every configured channel.

use {
    chrono::{DateTime, Utc},
    prunebot_channels::{ChannelId, ChannelRef, ChatPlatform, GuildId, HistoryQuery, MemberRef},
    tokio_stream::StreamExt,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{
    error::SweepError,
    policy::RetentionPolicy,
    report::{ChannelOutcome, ChannelReport, SweepReport},
    retry::{DeleteOutcome, delete_with_retry},
    targets::SweepTargets,
};

/// Run one sweep with `cutoff = now - policy.window`.
///
/// Guilds and channels are visited in target order. Per-channel problems
/// are recorded in the report and never stop the sweep. Cancellation stops
/// it at the next suspension point after the in-flight delete call.
pub async fn run_sweep(
    platform: &dyn ChatPlatform,
    policy: &RetentionPolicy,
    targets: &SweepTargets,
    now: DateTime<Utc>,
    cancel: &CancellationToken,
) -> SweepReport {
    let cutoff = policy.cutoff(now);
    let mut report = SweepReport::new(cutoff);
    info!(
        platform = platform.name(),
        %cutoff,
        channels = targets.channel_count(),
        dry_run = policy.dry_run,
        "starting retention sweep"
    );

    let pruner = ChannelPruner {
        platform,
        policy,
        cutoff,
        cancel,
    };

    'guilds: for guild in targets.guilds() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let member = match platform.self_member(guild.guild_id).await {
            Ok(Some(member)) => Some(member),
            Ok(None) => {
                error!(guild_id = %guild.guild_id, "guild not available, skipping its channels");
                None
            },
            Err(e) => {
                error!(
                    guild_id = %guild.guild_id,
                    error = %e,
                    "failed to resolve own member, skipping guild"
                );
                None
            },
        };

        let Some(member) = member else {
            report
                .channels
                .extend(guild.channels.iter().map(|&channel_id| ChannelReport {
                    guild_id: guild.guild_id,
                    channel_id,
                    outcome: ChannelOutcome::GuildUnavailable,
                }));
            continue;
        };

        for &channel_id in &guild.channels {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break 'guilds;
            }
            let outcome = pruner.prune(guild.guild_id, channel_id, &member).await;
            let stop = matches!(outcome, ChannelOutcome::Cancelled { .. });
            report.channels.push(ChannelReport {
                guild_id: guild.guild_id,
                channel_id,
                outcome,
            });
            if stop {
                report.cancelled = true;
                break 'guilds;
            }
        }
    }

    report
}

struct ChannelPruner<'a> {
    platform: &'a dyn ChatPlatform,
    policy: &'a RetentionPolicy,
    cutoff: DateTime<Utc>,
    cancel: &'a CancellationToken,
}

impl ChannelPruner<'_> {
    async fn prune(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        member: &MemberRef,
    ) -> ChannelOutcome {
        let channel = match self.platform.resolve_channel(guild_id, channel_id).await {
            Ok(Some(channel)) => channel,
            Ok(None) => {
                warn!(%guild_id, %channel_id, "channel not found, skipping");
                return ChannelOutcome::ChannelNotFound;
            },
            Err(e) => {
                error!(%guild_id, %channel_id, error = %e, "failed to resolve channel");
                return ChannelOutcome::Failed(e.to_string());
            },
        };

        let perms = match self.platform.permissions_for(&channel, member).await {
            Ok(perms) => perms,
            Err(e) => {
                error!(channel = %channel.name, %channel_id, error = %e, "failed to read permissions");
                return ChannelOutcome::Failed(e.to_string());
            },
        };
        if let Some(missing) = perms.missing() {
            warn!(
                channel = %channel.name,
                %channel_id,
                permission = %missing,
                "skipping channel: not able to {missing}"
            );
            return ChannelOutcome::MissingPermission(missing);
        }

        let candidate = self
            .platform
            .history_before(&channel, HistoryQuery::probe(self.cutoff))
            .next()
            .await;
        match candidate {
            None => {
                info!(channel = %channel.name, %channel_id, "nothing to purge");
                return ChannelOutcome::NothingToPurge;
            },
            Some(Err(e)) => {
                error!(channel = %channel.name, %channel_id, error = %e, "failed to probe history");
                return ChannelOutcome::Failed(e.to_string());
            },
            Some(Ok(_)) => {},
        }

        info!(
            channel = %channel.name,
            %channel_id,
            cutoff = %self.cutoff,
            "starting message purge"
        );
        let outcome = self.purge(&channel).await;
        match &outcome {
            ChannelOutcome::Purged {
                deleted,
                already_gone,
            } => info!(
                channel = %channel.name,
                %channel_id,
                deleted,
                already_gone,
                "deleted {deleted} msgs"
            ),
            ChannelOutcome::DryRun { eligible } => info!(
                channel = %channel.name,
                %channel_id,
                eligible,
                "dry run: {eligible} msgs eligible for deletion"
            ),
            ChannelOutcome::Aborted { deleted, error } if error.is_contract_violation() => error!(
                channel = %channel.name,
                %channel_id,
                deleted,
                error = %error,
                "platform broke the history contract, aborting channel"
            ),
            ChannelOutcome::Aborted { deleted, error } => error!(
                channel = %channel.name,
                %channel_id,
                deleted,
                error = %error,
                "purge aborted"
            ),
            ChannelOutcome::Cancelled { deleted } => info!(
                channel = %channel.name,
                %channel_id,
                deleted,
                "purge cancelled"
            ),
            _ => {},
        }
        outcome
    }

    /// Walk history oldest-first up to the cutoff, deleting as we go.
    async fn purge(&self, channel: &ChannelRef) -> ChannelOutcome {
        let mut history = self
            .platform
            .history_before(channel, HistoryQuery::oldest_first(self.cutoff));
        let mut deleted = 0;
        let mut already_gone = 0;
        let mut eligible = 0;
        let mut previous: Option<DateTime<Utc>> = None;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return ChannelOutcome::Cancelled { deleted },
                next = history.next() => next,
            };
            let message = match next {
                None => break,
                Some(Ok(message)) => message,
                Some(Err(e)) => {
                    return ChannelOutcome::Aborted {
                        deleted,
                        error: SweepError::History(e),
                    };
                },
            };

            if message.created_at > self.cutoff {
                return ChannelOutcome::Aborted {
                    deleted,
                    error: SweepError::CutoffViolation {
                        message_id: message.id,
                        created_at: message.created_at,
                        cutoff: self.cutoff,
                    },
                };
            }
            if let Some(previous) = previous
                && message.created_at < previous
            {
                return ChannelOutcome::Aborted {
                    deleted,
                    error: SweepError::OutOfOrder {
                        message_id: message.id,
                        created_at: message.created_at,
                        previous,
                    },
                };
            }
            previous = Some(message.created_at);

            if self.policy.dry_run {
                eligible += 1;
                continue;
            }

            match delete_with_retry(
                self.platform,
                channel,
                message.id,
                &self.policy.retry,
                self.cancel,
            )
            .await
            {
                Ok(DeleteOutcome::Deleted) => {
                    deleted += 1;
                    debug!(
                        channel = %channel.name,
                        message_id = %message.id,
                        created_at = %message.created_at,
                        "deleted message"
                    );
                },
                Ok(DeleteOutcome::AlreadyGone) => already_gone += 1,
                Err(SweepError::Cancelled) => return ChannelOutcome::Cancelled { deleted },
                Err(error) => return ChannelOutcome::Aborted { deleted, error },
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return ChannelOutcome::Cancelled { deleted },
                _ = tokio::time::sleep(self.policy.pacing) => {},
            }
        }

        if self.policy.dry_run {
            ChannelOutcome::DryRun { eligible }
        } else {
            ChannelOutcome::Purged {
                deleted,
                already_gone,
            }
        }
    }
}
