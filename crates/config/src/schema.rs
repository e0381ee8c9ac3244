/// Config schema types (discord session, retention policy, guild targets).
use std::time::Duration;

use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

use crate::env_subst::has_placeholder;

/// Environment variable consulted when `[discord] token` is not set.
pub const TOKEN_ENV_VAR: &str = "DISCORD_TOKEN";

/// Root configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PrunebotConfig {
    pub discord: DiscordConfig,
    pub retention: RetentionConfig,
    /// Sweep targets, in sweep order.
    pub guilds: Vec<GuildEntry>,
}

/// Discord session settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token. Falls back to `$DISCORD_TOKEN` when absent.
    pub token: Option<Secret<String>>,
}

impl DiscordConfig {
    /// The configured token, or `$DISCORD_TOKEN`.
    ///
    /// A value that is empty or still holds an unexpanded `${...}`
    /// placeholder counts as absent.
    pub fn resolve_token(&self) -> anyhow::Result<Secret<String>> {
        self.resolve_token_with(|name| std::env::var(name).ok())
    }

    fn resolve_token_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Secret<String>> {
        if let Some(token) = &self.token {
            let raw = token.expose_secret().trim();
            if !raw.is_empty() && !has_placeholder(raw) {
                return Ok(Secret::new(raw.to_string()));
            }
        }
        match lookup(TOKEN_ENV_VAR) {
            Some(token) if !token.trim().is_empty() => Ok(Secret::new(token.trim().to_string())),
            _ => anyhow::bail!(
                "no discord token configured; set [discord] token or ${TOKEN_ENV_VAR}"
            ),
        }
    }
}

/// Retention policy settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Messages older than this many days are deleted.
    pub window_days: u64,
    /// Minutes between sweeps.
    pub interval_minutes: u64,
    /// Pause between two deletions in the same channel.
    pub pacing_ms: u64,
    /// Walk and count eligible messages without deleting them.
    pub dry_run: bool,
    pub retry: RetryConfig,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            interval_minutes: 4 * 60,
            pacing_ms: 1000,
            dry_run: false,
            retry: RetryConfig::default(),
        }
    }
}

/// Longest accepted retention window (about 100 years).
pub const MAX_WINDOW_DAYS: u64 = 36_500;

/// Longest accepted sweep interval (one year).
pub const MAX_INTERVAL_MINUTES: u64 = 366 * 24 * 60;

impl RetentionConfig {
    /// Saturates instead of wrapping; `validate` rejects values above
    /// [`MAX_WINDOW_DAYS`].
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_days.saturating_mul(24 * 60 * 60))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

/// Retry settings for individual delete calls.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per delete, including the first one.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

/// One guild and the channels to prune in it, in order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GuildEntry {
    pub id: u64,
    #[serde(default)]
    pub channels: Vec<u64>,
}

impl PrunebotConfig {
    /// Total number of configured channels across all guilds.
    pub fn channel_count(&self) -> usize {
        self.guilds.iter().map(|g| g.channels.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_policy() {
        let cfg = RetentionConfig::default();
        assert_eq!(cfg.window(), Duration::from_secs(7 * 86_400));
        assert_eq!(cfg.interval(), Duration::from_secs(4 * 3600));
        assert_eq!(cfg.pacing(), Duration::from_secs(1));
        assert!(!cfg.dry_run);
        assert_eq!(cfg.retry.max_attempts, 3);
    }

    #[test]
    fn huge_values_saturate_instead_of_wrapping() {
        let cfg: PrunebotConfig = toml::from_str(
            "[retention]\nwindow_days = 213503982334602\ninterval_minutes = 9223372036854775807",
        )
        .unwrap();
        assert_eq!(cfg.retention.window(), Duration::from_secs(u64::MAX));
        assert_eq!(cfg.retention.interval(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn token_from_config_wins() {
        let cfg = DiscordConfig {
            token: Some(Secret::new(" from-file ".into())),
        };
        let token = cfg.resolve_token_with(|_| Some("from-env".into())).unwrap();
        assert_eq!(token.expose_secret(), "from-file");
    }

    #[test]
    fn token_falls_back_to_env() {
        let cfg = DiscordConfig::default();
        let token = cfg.resolve_token_with(|_| Some("from-env".into())).unwrap();
        assert_eq!(token.expose_secret(), "from-env");
    }

    #[test]
    fn unexpanded_placeholder_counts_as_missing() {
        let cfg = DiscordConfig {
            token: Some(Secret::new("${DISCORD_TOKEN}".into())),
        };
        let token = cfg.resolve_token_with(|_| Some("env".into())).unwrap();
        assert_eq!(token.expose_secret(), "env");
        assert!(cfg.resolve_token_with(|_| None).is_err());
    }

    #[test]
    fn missing_token_is_an_error() {
        let cfg = DiscordConfig::default();
        let err = cfg.resolve_token_with(|_| Some("  ".into())).unwrap_err();
        assert!(err.to_string().contains("DISCORD_TOKEN"));
    }

    #[test]
    fn token_is_redacted_in_debug() {
        let cfg = DiscordConfig {
            token: Some(Secret::new("hunter2".into())),
        };
        assert!(!format!("{cfg:?}").contains("hunter2"));
    }

    #[test]
    fn guild_order_is_preserved() {
        let cfg: PrunebotConfig = toml::from_str(
            r#"
            [[guilds]]
            id = 2
            channels = [20, 21]

            [[guilds]]
            id = 1
            channels = [10]
            "#,
        )
        .unwrap();
        let ids: Vec<u64> = cfg.guilds.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(cfg.guilds[0].channels, vec![20, 21]);
        assert_eq!(cfg.channel_count(), 3);
    }
}
