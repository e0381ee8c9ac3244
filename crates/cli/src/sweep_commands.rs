use std::{path::Path, sync::Arc};

use {
    anyhow::{Context as _, Result},
    prunebot_channels::ChatPlatform,
    prunebot_config::{PrunebotConfig, discover_and_load, validate},
    prunebot_discord::{DiscordSession, connect},
    prunebot_sweeper::{RetentionPolicy, RetentionSweeper, SweepTargets},
    tracing::{info, warn},
};

/// Load and validate the config, failing on hard errors.
fn load(path: Option<&Path>) -> Result<PrunebotConfig> {
    let config = discover_and_load(path)?;
    validate(&config).context("invalid config")?;
    Ok(config)
}

async fn open_session(config: &PrunebotConfig) -> Result<DiscordSession> {
    let token = config.discord.resolve_token()?;
    connect(&token).await
}

pub async fn run(path: Option<&Path>) -> Result<()> {
    let config = load(path)?;
    let mut session = open_session(&config).await?;

    let platform: Arc<dyn ChatPlatform> = session.platform.clone();
    let sweeper = RetentionSweeper::new(
        platform,
        RetentionPolicy::from(&config.retention),
        SweepTargets::from_config(&config.guilds),
    );
    sweeper.start()?;

    let client_exit = tokio::select! {
        _ = shutdown_signal() => None,
        result = session.closed() => Some(result),
    };

    sweeper.stop();
    sweeper.stopped().await;

    match client_exit {
        None => {
            info!("shutting down discord client");
            session.shutdown().await
        },
        Some(result) => {
            result?;
            anyhow::bail!("discord client exited unexpectedly")
        },
    }
}

pub async fn sweep_once(path: Option<&Path>, dry_run: bool) -> Result<()> {
    let config = load(path)?;
    let mut policy = RetentionPolicy::from(&config.retention);
    policy.dry_run |= dry_run;
    let targets = SweepTargets::from_config(&config.guilds);

    let mut session = open_session(&config).await?;
    let platform: Arc<dyn ChatPlatform> = session.platform.clone();

    tokio::select! {
        ready = platform.wait_until_ready() => ready.context("discord session not ready")?,
        result = session.closed() => {
            result?;
            anyhow::bail!("discord client exited before becoming ready");
        },
    }

    let sweeper = RetentionSweeper::new(platform, policy, targets);
    let report = tokio::select! {
        report = sweeper.sweep_once() => report?,
        _ = shutdown_signal() => {
            sweeper.stop();
            warn!("sweep interrupted");
            return session.shutdown().await;
        },
    };

    println!("cutoff: {}", report.cutoff);
    for channel in &report.channels {
        println!(
            "  guild {} channel {}: {}",
            channel.guild_id, channel.channel_id, channel.outcome
        );
    }
    println!("deleted: {}", report.total_deleted());

    session.shutdown().await
}

pub fn check_config(path: Option<&Path>) -> Result<()> {
    let config = discover_and_load(path)?;
    let warnings = validate(&config).context("invalid config")?;

    let token = if config.discord.resolve_token().is_ok() {
        "set (redacted)"
    } else {
        "missing"
    };
    let policy = RetentionPolicy::from(&config.retention);
    let targets = SweepTargets::from_config(&config.guilds);

    println!("token:     {token}");
    println!("window:    {}s", policy.window.as_secs());
    println!("interval:  {}s", policy.interval.as_secs());
    println!("pacing:    {}ms", policy.pacing.as_millis());
    println!(
        "retry:     {} attempts, {}ms..{}ms",
        policy.retry.max_attempts,
        policy.retry.base_delay.as_millis(),
        policy.retry.max_delay.as_millis()
    );
    println!("dry run:   {}", policy.dry_run);
    println!("channels:  {}", config.channel_count());
    for guild in targets.guilds() {
        let channels: Vec<String> = guild.channels.iter().map(ToString::to_string).collect();
        println!("  guild {}: {}", guild.guild_id, channels.join(", "));
    }
    for warning in &warnings {
        println!("warning:   {warning}");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
