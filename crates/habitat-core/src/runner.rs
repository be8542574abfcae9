//! Fixed-interval tick loop with operator controls.
//!
//! [`run_tick_loop`] advances a [`SharedEngine`] once per wall-clock
//! interval. Each tick takes the engine lock, steps the physics, and
//! releases the lock before the [`TickCallback`] runs, so command handlers
//! are never blocked by observers. The loop supports:
//!
//! - **Bounded runs**: stop after `max_ticks`
//! - **Variable tick speed**: interval adjustable at runtime
//! - **Operator stop**: wakes the loop immediately, even mid-sleep
//! - **Game over**: ends when the survivor dies

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::config::SimulationConfig;
use crate::engine::{SharedEngine, TickReport};

/// Smallest interval accepted by [`LoopControl::set_tick_interval_ms`].
pub const MIN_TICK_INTERVAL_MS: u64 = 100;

/// Reason the tick loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// An operator issued a stop.
    OperatorStop,
    /// The survivor died.
    GameOver,
}

/// Result of a tick loop run.
#[derive(Debug, Clone)]
pub struct LoopResult {
    /// Why the loop ended.
    pub end_reason: LoopEndReason,
    /// Ticks executed by this run.
    pub total_ticks: u64,
    /// The last tick report, if any tick ran.
    pub final_report: Option<TickReport>,
}

/// Shared control state for the tick loop.
///
/// Wrapped in an `Arc` and shared between the loop task and whatever
/// issues operator commands. Fields are atomics so reads on the loop's
/// hot path take no lock.
#[derive(Debug)]
pub struct LoopControl {
    stop_requested: AtomicBool,
    stop_notify: Notify,
    tick_interval_ms: AtomicU64,
    dt_seconds: f64,
    max_ticks: u64,
}

impl LoopControl {
    /// Create loop controls.
    ///
    /// `max_ticks == 0` means unlimited.
    pub fn new(tick_interval_ms: u64, dt_seconds: f64, max_ticks: u64) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            dt_seconds,
            max_ticks,
        }
    }

    /// Create loop controls from the simulation config section.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.tick_interval_ms, config.dt_seconds, config.max_ticks)
    }

    /// Request a clean stop and wake the loop if it is sleeping.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_waiters();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Set the tick interval. Values below [`MIN_TICK_INTERVAL_MS`] are
    /// rejected.
    ///
    /// Returns the previous interval, or `None` if the value was rejected.
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_TICK_INTERVAL_MS {
            return None;
        }
        Some(self.tick_interval_ms.swap(ms, Ordering::AcqRel))
    }

    /// Simulated seconds per tick.
    pub const fn dt_seconds(&self) -> f64 {
        self.dt_seconds
    }

    /// Configured tick limit (0 = unlimited).
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Whether `ticks_run` has reached the tick limit.
    pub const fn tick_limit_reached(&self, ticks_run: u64) -> bool {
        self.max_ticks > 0 && ticks_run >= self.max_ticks
    }

    /// Sleep for one tick interval, returning early on a stop request.
    async fn sleep_interval(&self) {
        let ms = self.tick_interval_ms();
        if ms == 0 {
            tokio::task::yield_now().await;
            return;
        }
        // Register before checking the flag so a concurrent stop is not missed.
        let stopped = self.stop_notify.notified();
        if self.is_stop_requested() {
            return;
        }
        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(ms)) => {}
            () = stopped => {}
        }
    }
}

/// Callback invoked after each tick, outside the engine lock.
pub trait TickCallback: Send {
    /// Called with the report of the tick that just ran.
    fn on_tick(&mut self, report: &TickReport);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _report: &TickReport) {}
}

/// Run the tick loop until a termination condition is met.
pub async fn run_tick_loop(
    engine: &SharedEngine,
    control: &LoopControl,
    callback: &mut dyn TickCallback,
) -> LoopResult {
    let mut final_report: Option<TickReport> = None;
    let mut total_ticks: u64 = 0;

    info!(
        tick_interval_ms = control.tick_interval_ms(),
        dt_seconds = control.dt_seconds(),
        max_ticks = control.max_ticks(),
        "Tick loop starting"
    );

    loop {
        if control.is_stop_requested() {
            info!("Operator stop requested");
            return LoopResult {
                end_reason: LoopEndReason::OperatorStop,
                total_ticks,
                final_report,
            };
        }

        let report = {
            let mut guard = engine.lock().await;
            guard.tick(control.dt_seconds())
        };
        total_ticks = total_ticks.saturating_add(1);

        callback.on_tick(&report);

        if report.game_over {
            info!(tick = report.tick, "Survivor is dead, game over");
            return LoopResult {
                end_reason: LoopEndReason::GameOver,
                total_ticks,
                final_report: Some(report),
            };
        }

        if control.tick_limit_reached(total_ticks) {
            info!(
                tick = report.tick,
                max_ticks = control.max_ticks(),
                "Tick limit reached"
            );
            return LoopResult {
                end_reason: LoopEndReason::MaxTicksReached,
                total_ticks,
                final_report: Some(report),
            };
        }

        final_report = Some(report);
        control.sleep_interval().await;
    }
}

/// Log how a tick loop run ended.
pub fn log_loop_end(result: &LoopResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_report.as_ref().map(|r| r.tick),
        "Tick loop ended"
    );

    if let Some(ref report) = result.final_report {
        info!(
            tick = report.tick,
            co2 = report.telemetry.co2,
            o2 = report.telemetry.o2,
            battery = report.telemetry.battery,
            "Final telemetry"
        );
    } else {
        warn!("Tick loop ended with no ticks executed");
    }
}
