//! Retention sweeps: periodically delete messages older than a retention
//! window from a fixed, ordered set of guild channels.
//!
//! [`RetentionSweeper`] owns the schedule and lifecycle, [`sweep::run_sweep`]
//! is one pass over every configured channel.

pub mod error;
pub mod policy;
pub mod report;
pub mod retry;
pub mod state;
pub mod sweep;
pub mod sweeper;
pub mod targets;

#[cfg(test)]
pub(crate) mod testing;

pub use {
    error::SweepError,
    policy::{RetentionPolicy, RetryPolicy},
    report::{ChannelOutcome, ChannelReport, SweepReport},
    state::SweeperState,
    sweeper::RetentionSweeper,
    targets::{GuildTargets, SweepTargets},
};
