use std::sync::{Arc, Mutex};

use {
    chrono::Utc,
    prunebot_channels::ChatPlatform,
    tokio::{
        sync::watch,
        task::JoinHandle,
        time::{MissedTickBehavior, interval},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{
    error::SweepError, policy::RetentionPolicy, report::SweepReport, state::SweeperState,
    sweep::run_sweep, targets::SweepTargets,
};

struct Inner {
    platform: Arc<dyn ChatPlatform>,
    policy: RetentionPolicy,
    targets: SweepTargets,
    state: watch::Sender<SweeperState>,
    cancel: CancellationToken,
    /// Held for the duration of a sweep so runs never overlap.
    sweep_lock: tokio::sync::Mutex<()>,
}

impl Inner {
    fn transition(&self, next: SweeperState) -> bool {
        self.state.send_if_modified(|state| {
            if state.can_transition_to(next) {
                debug!(from = %state, to = %next, "sweeper state change");
                *state = next;
                true
            } else {
                false
            }
        })
    }

    /// Run one sweep. A scheduled sweep ends in `Idle`; a one-off sweep
    /// restores `WaitingForReady` if the loop has not seen ready yet.
    async fn sweep(&self, scheduled: bool) -> SweepReport {
        let _guard = self.sweep_lock.lock().await;
        let resume = match *self.state.borrow() {
            SweeperState::WaitingForReady if !scheduled => SweeperState::WaitingForReady,
            _ => SweeperState::Idle,
        };
        self.transition(SweeperState::Sweeping);
        let report = run_sweep(
            self.platform.as_ref(),
            &self.policy,
            &self.targets,
            Utc::now(),
            &self.cancel,
        )
        .await;
        report.log_summary();
        self.transition(resume);
        report
    }
}

/// Periodically prunes every configured channel.
///
/// The first sweep runs as soon as the platform reports ready, then one
/// every `policy.interval`. A sweep always completes (or is cancelled)
/// before the next one can start; late ticks are delayed, not bunched.
///
/// On [`stop`](Self::stop) the in-flight delete call, if any, finishes and
/// the sweep is abandoned at the next pause or history fetch.
pub struct RetentionSweeper {
    inner: Arc<Inner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RetentionSweeper {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        policy: RetentionPolicy,
        targets: SweepTargets,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                platform,
                policy,
                targets,
                state: watch::Sender::new(SweeperState::Idle),
                cancel: CancellationToken::new(),
                sweep_lock: tokio::sync::Mutex::new(()),
            }),
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SweeperState {
        *self.inner.state.borrow()
    }

    /// Spawn the sweep loop on the current tokio runtime.
    pub fn start(&self) -> Result<(), SweepError> {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if task.is_some() {
            return Err(SweepError::AlreadyStarted);
        }
        if self.inner.cancel.is_cancelled() {
            return Err(SweepError::Stopped);
        }
        self.inner.transition(SweeperState::WaitingForReady);
        *task = Some(tokio::spawn(run_loop(Arc::clone(&self.inner))));
        Ok(())
    }

    /// Request cancellation. Takes effect before the next tick; see the
    /// type docs for what happens to a sweep in progress.
    pub fn stop(&self) {
        if !self.inner.cancel.is_cancelled() {
            info!("stopping retention sweeper");
        }
        self.inner.cancel.cancel();
        self.inner.transition(SweeperState::Cancelled);
    }

    /// Wait for the sweep loop to exit. Returns immediately if it was never
    /// started.
    pub async fn stopped(&self) {
        let handle = self
            .task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            error!(error = %e, "sweep loop panicked");
        }
    }

    /// Run a single sweep now, outside the schedule. Waits for any sweep
    /// already in progress to finish first.
    pub async fn sweep_once(&self) -> Result<SweepReport, SweepError> {
        if self.inner.cancel.is_cancelled() {
            return Err(SweepError::Stopped);
        }
        Ok(self.inner.sweep(false).await)
    }
}

impl Drop for RetentionSweeper {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}

async fn run_loop(inner: Arc<Inner>) {
    debug!(platform = inner.platform.name(), "waiting for chat session");
    let ready = tokio::select! {
        biased;
        _ = inner.cancel.cancelled() => return,
        ready = inner.platform.wait_until_ready() => ready,
    };
    if let Err(e) = ready {
        error!(error = %SweepError::NotReady(e), "retention sweeper giving up");
        inner.transition(SweeperState::Cancelled);
        return;
    }

    info!(
        interval_secs = inner.policy.interval.as_secs(),
        window_secs = inner.policy.window.as_secs(),
        channels = inner.targets.channel_count(),
        "chat session ready, retention sweeps scheduled"
    );
    if inner.targets.is_empty() {
        warn!("no channels configured, sweeps will do nothing");
    }

    // First tick completes immediately.
    let mut ticker = interval(inner.policy.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = inner.cancel.cancelled() => break,
            _ = ticker.tick() => {},
        }
        inner.sweep(true).await;
        if inner.cancel.is_cancelled() {
            break;
        }
    }

    inner.transition(SweeperState::Cancelled);
    debug!("retention sweep loop exited");
}
