use {
    prunebot_channels::{ChannelId, GuildId},
    prunebot_config::GuildEntry,
};

/// Channels to prune in one guild, in sweep order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildTargets {
    pub guild_id: GuildId,
    pub channels: Vec<ChannelId>,
}

/// Every configured channel, grouped by guild. Guilds and channels are
/// swept in the order they appear here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepTargets {
    guilds: Vec<GuildTargets>,
}

impl SweepTargets {
    pub fn new(guilds: Vec<GuildTargets>) -> Self {
        Self { guilds }
    }

    pub fn from_config(entries: &[GuildEntry]) -> Self {
        let guilds = entries
            .iter()
            .map(|entry| GuildTargets {
                guild_id: GuildId(entry.id),
                channels: entry.channels.iter().copied().map(ChannelId).collect(),
            })
            .collect();
        Self { guilds }
    }

    pub fn guilds(&self) -> &[GuildTargets] {
        &self.guilds
    }

    pub fn channel_count(&self) -> usize {
        self.guilds.iter().map(|g| g.channels.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.channel_count() == 0
    }
}
