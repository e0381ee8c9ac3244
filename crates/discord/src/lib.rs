//! Discord implementation of the chat-platform capabilities, built on
//! serenity.

pub mod error;
mod history;
pub mod platform;
pub mod session;
pub mod snowflake;

pub use {
    platform::DiscordPlatform,
    session::{DiscordSession, connect},
};
