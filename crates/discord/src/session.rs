use std::sync::Arc;

use {
    anyhow::Context as _,
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serenity::{
        Client,
        all::{Context, EventHandler, GatewayIntents, GuildId, Ready, ShardManager},
    },
    tokio::{sync::watch, task::JoinHandle},
    tracing::{info, warn},
};

use crate::platform::DiscordPlatform;

/// Flips the ready flag once the gateway session and guild cache are up.
struct ReadyHandler {
    ready: watch::Sender<bool>,
}

#[async_trait]
impl EventHandler for ReadyHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            user = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord session established"
        );
        // `cache_ready` never fires for a bot that is in no guilds.
        if ready.guilds.is_empty() {
            warn!("bot is not a member of any guild");
            self.ready.send_replace(true);
        }
    }

    async fn cache_ready(&self, _ctx: Context, guilds: Vec<GuildId>) {
        info!(guilds = guilds.len(), "discord guild cache ready");
        self.ready.send_replace(true);
    }
}

/// A running Discord client.
pub struct DiscordSession {
    pub platform: Arc<DiscordPlatform>,
    shard_manager: Arc<ShardManager>,
    client_task: JoinHandle<Result<(), serenity::Error>>,
}

impl DiscordSession {
    /// Disconnect every shard and wait for the client task to end.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.shard_manager.shutdown_all().await;
        match self.client_task.await {
            Ok(result) => result.context("discord client failed"),
            Err(e) => Err(e).context("discord client task panicked"),
        }
    }

    /// Resolves when the client stops on its own, which only happens on
    /// failure (bad token, missing intents, gateway errors).
    pub async fn closed(&mut self) -> anyhow::Result<()> {
        match (&mut self.client_task).await {
            Ok(result) => result.context("discord client stopped"),
            Err(e) => Err(e).context("discord client task panicked"),
        }
    }
}

/// Build a serenity client with the intents the sweeper needs and start it
/// on a background task.
pub async fn connect(token: &Secret<String>) -> anyhow::Result<DiscordSession> {
    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES;
    let (ready_tx, ready_rx) = watch::channel(false);

    let mut client = Client::builder(token.expose_secret(), intents)
        .event_handler(ReadyHandler { ready: ready_tx })
        .await
        .context("failed to build discord client")?;

    let platform = Arc::new(DiscordPlatform::new(
        Arc::clone(&client.http),
        Arc::clone(&client.cache),
        ready_rx,
    ));
    let shard_manager = Arc::clone(&client.shard_manager);

    let client_task = tokio::spawn(async move { client.start().await });
    info!("discord client starting");

    Ok(DiscordSession {
        platform,
        shard_manager,
        client_task,
    })
}
