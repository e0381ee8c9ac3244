use std::sync::Arc;

use {
    async_trait::async_trait,
    prunebot_channels::{
        ChannelId, ChannelPermissions, ChannelRef, ChatPlatform, GuildId, HistoryQuery, MemberRef,
        MessageId, MessageRef, MessageStream, PlatformError, UserId,
    },
    serenity::{
        all::{
            ChannelId as DiscordChannelId, GuildChannel, GuildId as DiscordGuildId, Member,
            Message, MessageId as DiscordMessageId, UserId as DiscordUserId,
        },
        cache::Cache,
        http::{Http, MessagePagination},
    },
    tokio::sync::watch,
    tokio_stream::StreamExt,
    tracing::{debug, trace},
};

use crate::{error::to_platform_error, history, snowflake};

/// [`ChatPlatform`] backed by a serenity client's HTTP handle and cache.
#[derive(Clone)]
pub struct DiscordPlatform {
    http: Arc<Http>,
    cache: Arc<Cache>,
    ready: watch::Receiver<bool>,
}

impl DiscordPlatform {
    pub(crate) fn new(http: Arc<Http>, cache: Arc<Cache>, ready: watch::Receiver<bool>) -> Self {
        Self { http, cache, ready }
    }

    fn current_user_id(&self) -> DiscordUserId {
        self.cache.current_user().id
    }

    async fn member(
        &self,
        guild_id: DiscordGuildId,
        user_id: DiscordUserId,
    ) -> Result<Member, PlatformError> {
        let cached = self
            .cache
            .guild(guild_id)
            .and_then(|g| g.members.get(&user_id).cloned());
        if let Some(member) = cached {
            return Ok(member);
        }
        self.http
            .get_member(guild_id, user_id)
            .await
            .map_err(to_platform_error)
    }

    async fn guild_channel(
        &self,
        guild_id: DiscordGuildId,
        channel_id: DiscordChannelId,
    ) -> Result<Option<GuildChannel>, PlatformError> {
        let cached = self
            .cache
            .guild(guild_id)
            .and_then(|g| g.channels.get(&channel_id).cloned());
        if cached.is_some() {
            return Ok(cached);
        }
        match self.http.get_channel(channel_id).await {
            Ok(channel) => Ok(channel.guild().filter(|c| c.guild_id == guild_id)),
            Err(e) => match to_platform_error(e) {
                PlatformError::NotFound(_) => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn page(
        &self,
        channel_id: DiscordChannelId,
        target: MessagePagination,
        limit: u8,
    ) -> Result<Vec<Message>, PlatformError> {
        trace!(%channel_id, limit, "fetching history page");
        self.http
            .get_messages(channel_id, Some(target), Some(limit))
            .await
            .map_err(to_platform_error)
    }
}

fn to_message_ref(message: &Message) -> MessageRef {
    MessageRef {
        id: MessageId(message.id.get()),
        channel_id: ChannelId(message.channel_id.get()),
        created_at: snowflake::created_at(message.id.get()),
    }
}

#[async_trait]
impl ChatPlatform for DiscordPlatform {
    fn name(&self) -> &str {
        "discord"
    }

    async fn wait_until_ready(&self) -> Result<(), PlatformError> {
        let mut ready = self.ready.clone();
        ready
            .wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| PlatformError::Unavailable("discord client shut down".into()))
    }

    async fn self_member(&self, guild_id: GuildId) -> Result<Option<MemberRef>, PlatformError> {
        let user_id = self.current_user_id();
        match self
            .member(DiscordGuildId::new(guild_id.get()), user_id)
            .await
        {
            Ok(member) => Ok(Some(MemberRef {
                guild_id,
                user_id: UserId(member.user.id.get()),
            })),
            Err(PlatformError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn resolve_channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Option<ChannelRef>, PlatformError> {
        let channel = self
            .guild_channel(
                DiscordGuildId::new(guild_id.get()),
                DiscordChannelId::new(channel_id.get()),
            )
            .await?;
        Ok(channel.map(|c| ChannelRef {
            guild_id,
            id: channel_id,
            name: c.name,
        }))
    }

    async fn permissions_for(
        &self,
        channel: &ChannelRef,
        member: &MemberRef,
    ) -> Result<ChannelPermissions, PlatformError> {
        let guild_id = DiscordGuildId::new(channel.guild_id.get());
        let member = self
            .member(guild_id, DiscordUserId::new(member.user_id.get()))
            .await?;
        let guild_channel = self
            .guild_channel(guild_id, DiscordChannelId::new(channel.id.get()))
            .await?
            .ok_or_else(|| PlatformError::NotFound(format!("channel {}", channel.id)))?;

        let cached = self
            .cache
            .guild(guild_id)
            .map(|g| g.user_permissions_in(&guild_channel, &member));
        let permissions = match cached {
            Some(permissions) => permissions,
            None => self
                .http
                .get_guild(guild_id)
                .await
                .map_err(to_platform_error)?
                .user_permissions_in(&guild_channel, &member),
        };

        debug!(
            channel = %channel.name,
            permissions = ?permissions,
            "resolved channel permissions"
        );
        Ok(ChannelPermissions {
            read_message_history: permissions.read_message_history(),
            manage_messages: permissions.manage_messages(),
        })
    }

    fn history_before<'a>(
        &'a self,
        channel: &'a ChannelRef,
        query: HistoryQuery,
    ) -> MessageStream<'a> {
        let channel_id = DiscordChannelId::new(channel.id.get());
        let pages = history::paginate(
            move |target, limit| self.page(channel_id, target, limit),
            |message: &Message| message.id.get(),
            snowflake::lower_bound(query.before),
            query.limit,
            query.oldest_first,
        );
        Box::pin(pages.map(|message| message.map(|m| to_message_ref(&m))))
    }

    async fn delete_message(
        &self,
        channel: &ChannelRef,
        message_id: MessageId,
    ) -> Result<(), PlatformError> {
        DiscordChannelId::new(channel.id.get())
            .delete_message(&self.http, DiscordMessageId::new(message_id.get()))
            .await
            .map_err(to_platform_error)
    }
}
