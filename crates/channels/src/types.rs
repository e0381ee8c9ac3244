use std::fmt;

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake_id!(
    /// Identifier of a guild (a server grouping channels and members).
    GuildId
);
snowflake_id!(
    /// Identifier of a channel within a guild.
    ChannelId
);
snowflake_id!(MessageId);
snowflake_id!(UserId);

/// The bot's own membership record within a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    pub guild_id: GuildId,
    pub user_id: UserId,
}

/// A resolved channel. `name` is only used for log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub guild_id: GuildId,
    pub id: ChannelId,
    pub name: String,
}

/// A message yielded by a history walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub created_at: DateTime<Utc>,
}

/// The two permission flags the sweeper needs in a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelPermissions {
    pub read_message_history: bool,
    pub manage_messages: bool,
}

impl ChannelPermissions {
    /// First missing permission, checked in sweep order (history before
    /// manage).
    pub fn missing(&self) -> Option<Permission> {
        if !self.read_message_history {
            Some(Permission::ReadMessageHistory)
        } else if !self.manage_messages {
            Some(Permission::ManageMessages)
        } else {
            None
        }
    }
}

/// A single permission required to prune a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ReadMessageHistory,
    ManageMessages,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadMessageHistory => f.write_str("read message history"),
            Self::ManageMessages => f.write_str("manage messages"),
        }
    }
}

/// Parameters for [`crate::ChatPlatform::history_before`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Only messages created strictly before this instant are yielded.
    pub before: DateTime<Utc>,
    /// `None` walks the whole bounded history.
    pub limit: Option<usize>,
    pub oldest_first: bool,
}

impl HistoryQuery {
    /// Newest-first lookup of at most one message before `before`.
    pub fn probe(before: DateTime<Utc>) -> Self {
        Self {
            before,
            limit: Some(1),
            oldest_first: false,
        }
    }

    /// Unbounded oldest-first walk of everything before `before`.
    pub fn oldest_first(before: DateTime<Utc>) -> Self {
        Self {
            before,
            limit: None,
            oldest_first: true,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.limit.is_none()
    }
}
