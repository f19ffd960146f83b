//! Elapsed-time ticker for Tagkey sessions.
//!
//! A repeating timer that is explicitly started when a session becomes
//! active and stopped when it ends. While stopped,
//! [`ElapsedTicker::wait_for_tick`] pends forever, so no tick can fire for
//! an idle controller.
//!
//! # Integration
//!
//! The ticker sits inside the controller actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* start / end / resolve */ }
//!         info = ticker.wait_for_tick() => controller.tick(),
//!     }
//! }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the ticker wakes up late (the task was starved or the
/// device slept).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TickPolicy {
    /// Forget the missed ticks and resume the cadence from now.
    #[default]
    Skip,
    /// Fire the missed ticks back-to-back, at most `max_catchup` of them,
    /// so elapsed time stays close to wall-clock time.
    CatchUp {
        /// Cap on consecutive catch-up ticks.
        max_catchup: u32,
    },
}

/// Configuration for the elapsed ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Time between ticks. One tick = one elapsed second for the
    /// controller, so this is 1 s outside of tests.
    pub interval: Duration,
    /// Overrun handling policy.
    pub policy: TickPolicy,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            policy: TickPolicy::default(),
        }
    }
}

impl TickConfig {
    /// Shortest interval accepted.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

    /// Create a config with a specific interval and default policy.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`ElapsedTicker::new`]. A zero interval
    /// would spin, so it is raised to [`Self::MIN_INTERVAL`].
    pub fn validated(mut self) -> Self {
        if self.interval < Self::MIN_INTERVAL {
            warn!(
                interval = ?self.interval,
                min = ?Self::MIN_INTERVAL,
                "tick interval below minimum, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Information about a fired tick, returned by [`ElapsedTicker::wait_for_tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Ticks since the last [`ElapsedTicker::start`] (starts at 1).
    pub tick: u64,
    /// `true` if this tick fired noticeably late.
    pub overrun: bool,
    /// How many ticks were dropped because of the overrun.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

/// Repeating timer with an explicit running/stopped state.
///
/// One per controller actor. Starts stopped.
#[derive(Debug)]
pub struct ElapsedTicker {
    config: TickConfig,
    /// `Some` while running: when the next tick is due.
    next_tick: Option<Instant>,
    tick_count: u64,
    total_skipped: u64,
}

impl ElapsedTicker {
    /// Create a stopped ticker from config.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        debug!(interval = ?config.interval, policy = ?config.policy, "elapsed ticker created");
        Self {
            config,
            next_tick: None,
            tick_count: 0,
            total_skipped: 0,
        }
    }

    /// Start ticking. The first tick fires one interval from now.
    ///
    /// Restarting a running ticker resets its count and cadence.
    pub fn start(&mut self) {
        self.next_tick = Some(Instant::now() + self.config.interval);
        self.tick_count = 0;
        self.total_skipped = 0;
        debug!("elapsed ticker started");
    }

    /// Stop ticking. [`wait_for_tick`](Self::wait_for_tick) pends until the
    /// next [`start`](Self::start).
    ///
    /// Safe to call multiple times (idempotent).
    pub fn stop(&mut self) {
        if self.next_tick.take().is_some() {
            debug!(ticks = self.tick_count, "elapsed ticker stopped");
        }
    }

    /// Wait until the next tick is due.
    ///
    /// When stopped this future never resolves, but `tokio::select!` will
    /// still process its other branches.
    ///
    /// Cancel-safe: if the future is dropped before the deadline, no
    /// tick is consumed.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let Some(next) = self.next_tick else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(next).await;

        let interval = self.config.interval;
        let now = Instant::now();
        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > interval / 10;
        let behind = (late_by.as_nanos() / interval.as_nanos()) as u64;
        let mut ticks_skipped = 0;

        self.next_tick = Some(match self.config.policy {
            TickPolicy::Skip => {
                if behind > 0 {
                    ticks_skipped = behind;
                    warn!(tick = self.tick_count + 1, skipped = behind, "ticker overrun, skipping ahead");
                }
                now + interval
            }
            TickPolicy::CatchUp { max_catchup } => {
                if behind <= u64::from(max_catchup) {
                    // Keep the original cadence: missed deadlines are
                    // already in the past, so they fire immediately.
                    next + interval
                } else {
                    ticks_skipped = behind - u64::from(max_catchup);
                    warn!(
                        tick = self.tick_count + 1,
                        behind,
                        skipping = ticks_skipped,
                        "ticker overrun, catch-up capped at {max_catchup}"
                    );
                    now + interval
                }
            }
        });

        self.tick_count += 1;
        self.total_skipped += ticks_skipped;
        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Whether the ticker is running.
    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Ticks fired since the last start.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Ticks dropped by the overrun policy since the last start.
    pub fn total_skipped(&self) -> u64 {
        self.total_skipped
    }

    /// The configured interval.
    pub fn interval(&self) -> Duration {
        self.config.interval
    }
}

impl Default for ElapsedTicker {
    fn default() -> Self {
        Self::new(TickConfig::default())
    }
}
