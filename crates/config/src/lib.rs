//! Configuration: schema, discovery and loading for prunebot.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{discover_and_load, load_config},
    schema::{
        DiscordConfig, GuildEntry, MAX_INTERVAL_MINUTES, MAX_WINDOW_DAYS, PrunebotConfig,
        RetentionConfig, RetryConfig, TOKEN_ENV_VAR,
    },
    validate::validate,
};
