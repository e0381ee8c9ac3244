use std::collections::HashSet;

use tracing::warn;

use crate::schema::{MAX_INTERVAL_MINUTES, MAX_WINDOW_DAYS, PrunebotConfig};

/// Check a loaded config before it is used to delete anything.
///
/// Hard errors abort startup. Softer problems are logged and returned so
/// callers (e.g. `check-config`) can show them.
pub fn validate(config: &PrunebotConfig) -> anyhow::Result<Vec<String>> {
    let retention = &config.retention;
    if retention.window_days == 0 {
        anyhow::bail!("retention.window_days must be at least 1");
    }
    if retention.window_days > MAX_WINDOW_DAYS {
        anyhow::bail!(
            "retention.window_days ({}) exceeds the maximum of {MAX_WINDOW_DAYS}",
            retention.window_days
        );
    }
    if retention.interval_minutes == 0 {
        anyhow::bail!("retention.interval_minutes must be at least 1");
    }
    if retention.interval_minutes > MAX_INTERVAL_MINUTES {
        anyhow::bail!(
            "retention.interval_minutes ({}) exceeds the maximum of {MAX_INTERVAL_MINUTES}",
            retention.interval_minutes
        );
    }
    if retention.retry.max_attempts == 0 {
        anyhow::bail!("retention.retry.max_attempts must be at least 1");
    }
    if retention.retry.max_delay_ms < retention.retry.base_delay_ms {
        anyhow::bail!(
            "retention.retry.max_delay_ms ({}) is below base_delay_ms ({})",
            retention.retry.max_delay_ms,
            retention.retry.base_delay_ms
        );
    }

    let mut warnings = Vec::new();
    if config.guilds.is_empty() {
        warnings.push("no guilds configured; sweeps will do nothing".to_string());
    }

    let mut seen_guilds = HashSet::new();
    for guild in &config.guilds {
        if !seen_guilds.insert(guild.id) {
            warnings.push(format!("guild {} is listed more than once", guild.id));
        }
        if guild.channels.is_empty() {
            warnings.push(format!("guild {} has no channels", guild.id));
        }
        let mut seen = HashSet::new();
        for channel in &guild.channels {
            if !seen.insert(channel) {
                warnings.push(format!(
                    "channel {channel} is listed more than once in guild {}; it will be swept twice",
                    guild.id
                ));
            }
        }
    }

    for w in &warnings {
        warn!("config: {w}");
    }
    Ok(warnings)
}
