//! In-memory chat platform that records every call, for sweep tests.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    io,
    sync::{Arc, Mutex, MutexGuard},
};

use {
    async_trait::async_trait,
    chrono::{DateTime, TimeDelta, Utc},
    prunebot_channels::{
        ChannelId, ChannelPermissions, ChannelRef, ChatPlatform, GuildId, HistoryQuery, MemberRef,
        MessageId, MessageRef, MessageStream, PlatformError, UserId,
    },
    tokio::sync::watch,
    tracing_subscriber::fmt::MakeWriter,
};

pub(crate) const BOT_USER: UserId = UserId(4242);

pub(crate) fn perms(read_message_history: bool, manage_messages: bool) -> ChannelPermissions {
    ChannelPermissions {
        read_message_history,
        manage_messages,
    }
}

/// Collects formatted log lines emitted on the current thread.
#[derive(Clone, Default)]
pub(crate) struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Route events to this capture until the guard is dropped. Only
    /// events from the current thread are seen, which covers
    /// `#[tokio::test]`'s single-threaded runtime.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    SelfMember(GuildId),
    ResolveChannel(ChannelId),
    Permissions(ChannelId),
    /// History request with a limit.
    Probe(ChannelId),
    /// Unbounded history walk.
    Walk(ChannelId),
    Delete(ChannelId, MessageId),
}

#[derive(Debug, Clone)]
pub(crate) struct DeleteRecord {
    pub channel_id: ChannelId,
    pub created_at: DateTime<Utc>,
    pub at: tokio::time::Instant,
}

struct FakeChannel {
    guild_id: GuildId,
    name: String,
    perms: ChannelPermissions,
    /// Sorted oldest first.
    messages: Vec<MessageRef>,
    /// Yielded at the end of every walk regardless of the bound.
    rogue: Vec<MessageRef>,
    delete_failures: VecDeque<PlatformError>,
    walk_error: bool,
}

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,
    deletes: Vec<DeleteRecord>,
    channels: HashMap<ChannelId, FakeChannel>,
    next_message_id: u64,
}

pub(crate) struct FakePlatform {
    pub now: DateTime<Utc>,
    ready: watch::Sender<bool>,
    guilds: HashSet<GuildId>,
    broken_guilds: HashSet<GuildId>,
    inner: Mutex<Inner>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            now: Utc::now(),
            ready: watch::Sender::new(true),
            guilds: HashSet::new(),
            broken_guilds: HashSet::new(),
            inner: Mutex::new(Inner {
                next_message_id: 1,
                ..Default::default()
            }),
        }
    }

    pub fn not_ready() -> Self {
        let fake = Self::new();
        fake.ready.send_replace(false);
        fake
    }

    pub fn mark_ready(&self) {
        self.ready.send_replace(true);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_guild(&mut self, guild: u64) {
        self.guilds.insert(GuildId(guild));
    }

    /// A guild whose self-member lookup fails with a transport error.
    pub fn add_broken_guild(&mut self, guild: u64) {
        self.broken_guilds.insert(GuildId(guild));
    }

    /// Adds a channel holding one message per entry of `ages_days`.
    pub fn add_channel(
        &mut self,
        guild: u64,
        channel: u64,
        perms: ChannelPermissions,
        ages_days: &[i64],
    ) {
        let now = self.now;
        let mut inner = self.lock();
        let mut messages: Vec<MessageRef> = ages_days
            .iter()
            .map(|days| {
                let id = MessageId(inner.next_message_id);
                inner.next_message_id += 1;
                MessageRef {
                    id,
                    channel_id: ChannelId(channel),
                    created_at: now - TimeDelta::days(*days),
                }
            })
            .collect();
        messages.sort_by_key(|m| m.created_at);
        inner.channels.insert(ChannelId(channel), FakeChannel {
            guild_id: GuildId(guild),
            name: format!("channel-{channel}"),
            perms,
            messages,
            rogue: Vec::new(),
            delete_failures: VecDeque::new(),
            walk_error: false,
        });
    }

    /// Makes every walk of `channel` end with a message `days_ago` old,
    /// even when it is newer than the requested bound.
    pub fn inject_into_walk(&self, channel: u64, days_ago: i64) {
        let now = self.now;
        let mut inner = self.lock();
        let id = MessageId(inner.next_message_id);
        inner.next_message_id += 1;
        if let Some(ch) = inner.channels.get_mut(&ChannelId(channel)) {
            ch.rogue.push(MessageRef {
                id,
                channel_id: ChannelId(channel),
                created_at: now - TimeDelta::days(days_ago),
            });
        }
    }

    /// Queue errors returned by the next delete calls in `channel`.
    pub fn fail_deletes(&self, channel: u64, errors: Vec<PlatformError>) {
        if let Some(ch) = self.lock().channels.get_mut(&ChannelId(channel)) {
            ch.delete_failures.extend(errors);
        }
    }

    /// Makes walks of `channel` end with a transport error.
    pub fn fail_walk(&self, channel: u64) {
        if let Some(ch) = self.lock().channels.get_mut(&ChannelId(channel)) {
            ch.walk_error = true;
        }
    }

    pub fn channel_ref(&self, guild: u64, channel: u64) -> ChannelRef {
        ChannelRef {
            guild_id: GuildId(guild),
            id: ChannelId(channel),
            name: format!("channel-{channel}"),
        }
    }

    /// Ids of the messages still present, oldest first.
    pub fn message_ids(&self, channel: u64) -> Vec<MessageId> {
        self.lock()
            .channels
            .get(&ChannelId(channel))
            .map(|ch| ch.messages.iter().map(|m| m.id).collect())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn deletes(&self) -> Vec<DeleteRecord> {
        self.lock().deletes.clone()
    }

    pub fn delete_calls(&self, channel: u64) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Delete(id, _) if *id == ChannelId(channel)))
            .count()
    }

    pub fn walks(&self, channel: u64) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| **c == Call::Walk(ChannelId(channel)))
            .count()
    }

    /// Channels in the order their resolution was requested.
    pub fn visited(&self) -> Vec<ChannelId> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::ResolveChannel(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn sweeps_started(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::SelfMember(_)))
            .count()
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    fn name(&self) -> &str {
        "fake"
    }

    async fn wait_until_ready(&self) -> Result<(), PlatformError> {
        let mut rx = self.ready.subscribe();
        rx.wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| PlatformError::Unavailable("session closed".into()))
    }

    async fn self_member(&self, guild_id: GuildId) -> Result<Option<MemberRef>, PlatformError> {
        self.lock().calls.push(Call::SelfMember(guild_id));
        if self.broken_guilds.contains(&guild_id) {
            return Err(PlatformError::Transport("gateway hiccup".into()));
        }
        Ok(self.guilds.contains(&guild_id).then_some(MemberRef {
            guild_id,
            user_id: BOT_USER,
        }))
    }

    async fn resolve_channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Option<ChannelRef>, PlatformError> {
        let mut inner = self.lock();
        inner.calls.push(Call::ResolveChannel(channel_id));
        Ok(inner
            .channels
            .get(&channel_id)
            .filter(|ch| ch.guild_id == guild_id)
            .map(|ch| ChannelRef {
                guild_id,
                id: channel_id,
                name: ch.name.clone(),
            }))
    }

    async fn permissions_for(
        &self,
        channel: &ChannelRef,
        member: &MemberRef,
    ) -> Result<ChannelPermissions, PlatformError> {
        assert_eq!(member.user_id, BOT_USER);
        let mut inner = self.lock();
        inner.calls.push(Call::Permissions(channel.id));
        inner
            .channels
            .get(&channel.id)
            .map(|ch| ch.perms)
            .ok_or_else(|| PlatformError::NotFound(format!("channel {}", channel.id)))
    }

    fn history_before<'a>(
        &'a self,
        channel: &'a ChannelRef,
        query: HistoryQuery,
    ) -> MessageStream<'a> {
        let mut inner = self.lock();
        inner.calls.push(if query.is_unbounded() {
            Call::Walk(channel.id)
        } else {
            Call::Probe(channel.id)
        });

        let mut items: Vec<Result<MessageRef, PlatformError>> = Vec::new();
        if let Some(ch) = inner.channels.get(&channel.id) {
            let mut eligible: Vec<MessageRef> = ch
                .messages
                .iter()
                .filter(|m| m.created_at < query.before)
                .cloned()
                .collect();
            if !query.oldest_first {
                eligible.reverse();
            }
            if let Some(limit) = query.limit {
                eligible.truncate(limit);
            }
            items.extend(eligible.into_iter().map(Ok));
            if query.is_unbounded() {
                items.extend(ch.rogue.iter().cloned().map(Ok));
                if ch.walk_error {
                    items.push(Err(PlatformError::Transport("connection reset".into())));
                }
            }
        }
        Box::pin(tokio_stream::iter(items))
    }

    async fn delete_message(
        &self,
        channel: &ChannelRef,
        message_id: MessageId,
    ) -> Result<(), PlatformError> {
        let mut inner = self.lock();
        inner.calls.push(Call::Delete(channel.id, message_id));
        let Some(ch) = inner.channels.get_mut(&channel.id) else {
            return Err(PlatformError::NotFound(format!("channel {}", channel.id)));
        };
        if let Some(err) = ch.delete_failures.pop_front() {
            return Err(err);
        }
        let Some(pos) = ch
            .messages
            .iter()
            .chain(ch.rogue.iter())
            .position(|m| m.id == message_id)
        else {
            return Err(PlatformError::NotFound(format!("message {message_id}")));
        };
        let removed = if pos < ch.messages.len() {
            ch.messages.remove(pos)
        } else {
            ch.rogue.remove(pos - ch.messages.len())
        };
        inner.deletes.push(DeleteRecord {
            channel_id: channel.id,
            created_at: removed.created_at,
            at: tokio::time::Instant::now(),
        });
        Ok(())
    }
}
