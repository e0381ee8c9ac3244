use std::pin::Pin;

use {async_trait::async_trait, tokio_stream::Stream};

use crate::{
    error::PlatformError,
    types::{
        ChannelId, ChannelPermissions, ChannelRef, GuildId, HistoryQuery, MemberRef, MessageId,
        MessageRef,
    },
};

/// Lazy message history. Pages are fetched as the stream is polled, and a
/// stream cannot be restarted once consumed.
pub type MessageStream<'a> =
    Pin<Box<dyn Stream<Item = Result<MessageRef, PlatformError>> + Send + 'a>>;

/// Session with a chat platform, owned by the surrounding process.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Platform name for logs (e.g. "discord").
    fn name(&self) -> &str;

    /// Resolves once the session is established and caches are populated.
    async fn wait_until_ready(&self) -> Result<(), PlatformError>;

    /// The bot's own member in `guild_id`, or `None` if the guild is unknown.
    async fn self_member(&self, guild_id: GuildId) -> Result<Option<MemberRef>, PlatformError>;

    async fn resolve_channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Option<ChannelRef>, PlatformError>;

    async fn permissions_for(
        &self,
        channel: &ChannelRef,
        member: &MemberRef,
    ) -> Result<ChannelPermissions, PlatformError>;

    /// Messages created strictly before `query.before`, in the requested
    /// order, up to `query.limit`.
    fn history_before<'a>(&'a self, channel: &'a ChannelRef, query: HistoryQuery)
    -> MessageStream<'a>;

    async fn delete_message(
        &self,
        channel: &ChannelRef,
        message_id: MessageId,
    ) -> Result<(), PlatformError>;
}
