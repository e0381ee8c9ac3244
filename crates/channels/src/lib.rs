//! Chat-platform capabilities consumed by the retention sweeper.
//!
//! A platform (Discord today) implements [`ChatPlatform`]: resolving the
//! bot's own member in a guild, resolving channels, evaluating permissions,
//! streaming message history and deleting messages.

pub mod error;
pub mod platform;
pub mod types;

pub use {
    error::PlatformError,
    platform::{ChatPlatform, MessageStream},
    types::{
        ChannelId, ChannelPermissions, ChannelRef, GuildId, HistoryQuery, MemberRef, MessageId,
        MessageRef, Permission, UserId,
    },
};
