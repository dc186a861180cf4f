//! Lifecycle controller for the polling loop.
//!
//! At most one background loop exists per [`Monitor`]. `start`/`stop` take a
//! single mutex around the state check and transition; cancellation is
//! signalled after the lock is released. A stopped loop that is still
//! finishing its cycle is kept as `Idle { draining }` and `start` waits for it
//! before spawning the next one. Manual test polls bypass the state entirely
//! and may overlap a scheduled cycle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MonitorSettings;
use crate::history::OUTCOME_SUCCESS;
use crate::poll::{PollCycle, PollOutcome};

enum MonitorState {
    Idle {
        /// Loop told to stop but possibly still inside its last cycle.
        draining: Option<JoinHandle<()>>,
    },
    Running {
        cancel: CancellationToken,
        handle: JoinHandle<()>,
    },
}

#[derive(Clone)]
struct Setup {
    cycle: Arc<PollCycle>,
    settings: MonitorSettings,
}

struct Inner {
    state: Mutex<MonitorState>,
    setup: RwLock<Setup>,
    active_loops: AtomicUsize,
}

impl Inner {
    fn snapshot(&self) -> Setup {
        self.setup
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Decrements the live-loop counter when the loop task ends, however it ends.
struct LoopGuard(Arc<Inner>);

impl Drop for LoopGuard {
    fn drop(&mut self) {
        self.0.active_loops.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct Monitor {
    inner: Arc<Inner>,
}

impl Monitor {
    pub fn new(cycle: PollCycle, settings: MonitorSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(MonitorState::Idle { draining: None }),
                setup: RwLock::new(Setup {
                    cycle: Arc::new(cycle),
                    settings,
                }),
                active_loops: AtomicUsize::new(0),
            }),
        }
    }

    /// Launches the background loop. Returns `false` if one is already running.
    ///
    /// If a stopped loop is still finishing its cycle, waits for it first.
    pub async fn start(&self) -> bool {
        let mut state = self.inner.state.lock().await;
        if matches!(*state, MonitorState::Running { .. }) {
            drop(state);
            warn!("monitor already running; ignoring start");
            return false;
        }
        let draining = match &mut *state {
            MonitorState::Idle { draining } => draining.take(),
            MonitorState::Running { .. } => None,
        };
        if let Some(previous) = draining {
            if !previous.is_finished() {
                info!("waiting for the previous loop to finish its cycle");
            }
            if let Err(e) = previous.await {
                warn!(error=%e, "previous monitor loop task failed");
            }
        }

        let setup = self.inner.snapshot();
        let project = setup.settings.project.clone();
        let interval = setup.settings.interval;
        let cancel = CancellationToken::new();
        self.inner.active_loops.fetch_add(1, Ordering::SeqCst);
        let guard = LoopGuard(self.inner.clone());
        let handle = tokio::spawn(run_loop(setup, cancel.clone(), guard));
        *state = MonitorState::Running { cancel, handle };
        drop(state);

        info!(
            project = %project,
            interval_secs = interval.as_secs(),
            "monitor started"
        );
        true
    }

    /// Requests the loop to stop. Returns `false` if nothing was running.
    ///
    /// A cycle already in flight finishes; no new cycle starts afterwards.
    pub async fn stop(&self) -> bool {
        let cancel = {
            let mut state = self.inner.state.lock().await;
            match std::mem::replace(&mut *state, MonitorState::Idle { draining: None }) {
                MonitorState::Running { cancel, handle } => {
                    *state = MonitorState::Idle {
                        draining: Some(handle),
                    };
                    cancel
                }
                idle => {
                    *state = idle;
                    drop(state);
                    warn!("monitor not running; ignoring stop");
                    return false;
                }
            }
        };
        info!("cancelling monitor loop");
        cancel.cancel();
        info!(outcome = OUTCOME_SUCCESS, "monitor stopped");
        true
    }

    /// Stops the loop and waits up to `grace` for it, or for a loop stopped
    /// earlier, to finish its current cycle.
    pub async fn shutdown(&self, grace: Duration) {
        let handle = {
            let mut state = self.inner.state.lock().await;
            match std::mem::replace(&mut *state, MonitorState::Idle { draining: None }) {
                MonitorState::Running { cancel, handle } => {
                    cancel.cancel();
                    handle
                }
                MonitorState::Idle {
                    draining: Some(handle),
                } => handle,
                MonitorState::Idle { draining: None } => return,
            }
        };
        match tokio::time::timeout(grace, handle).await {
            Ok(Ok(())) => info!("monitor loop finished"),
            Ok(Err(e)) => warn!(error=%e, "monitor loop task failed"),
            Err(_) => warn!(
                grace_ms = grace.as_millis() as u64,
                "monitor loop still busy after grace period; leaving it detached"
            ),
        }
    }

    /// Runs one poll on its own task without touching the run state.
    pub fn trigger_test(&self) -> JoinHandle<PollOutcome> {
        let Setup { cycle, settings } = self.inner.snapshot();
        info!(project = %settings.project, "manual poll triggered");
        tokio::spawn(async move { cycle.run_once(&settings.project).await })
    }

    /// Swaps the poll cycle and settings used by the next `start` or test.
    /// A loop that is already running keeps what it started with.
    pub fn reconfigure(&self, settings: MonitorSettings, cycle: PollCycle) {
        let mut setup = self
            .inner
            .setup
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *setup = Setup {
            cycle: Arc::new(cycle),
            settings: settings.clone(),
        };
        drop(setup);
        info!(
            project = %settings.project,
            interval_secs = settings.interval.as_secs(),
            "monitor reconfigured"
        );
    }

    pub fn settings(&self) -> MonitorSettings {
        self.inner.snapshot().settings
    }

    pub async fn is_running(&self) -> bool {
        matches!(*self.inner.state.lock().await, MonitorState::Running { .. })
    }

    /// Background loops currently alive, including one that was told to stop
    /// but is still finishing its cycle.
    pub fn active_loops(&self) -> usize {
        self.inner.active_loops.load(Ordering::SeqCst)
    }
}

async fn run_loop(setup: Setup, cancel: CancellationToken, _guard: LoopGuard) {
    let Setup { cycle, settings } = setup;
    debug!("monitor loop started");

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let started = Instant::now();
        let outcome = cycle.run_once(&settings.project).await;
        debug!(
            fetched = outcome.fetched,
            acknowledged = outcome.acknowledged(),
            failed = outcome.failed(),
            "poll cycle finished"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = sleep_until(started + settings.interval) => {}
        }
    }

    debug!("monitor loop received cancellation; exiting");
}
