//! Single-shot countdown backing the answer windows and the buzz arbitration window.

use std::{
    future::Future,
    time::{Duration, SystemTime},
};

use tokio::task::JoinHandle;

/// Identifies one armed countdown.
///
/// Expiry notifications carry the token they were armed with, so a countdown that has been
/// replaced or cancelled in the meantime is recognised (and ignored) when its notification
/// finally arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// Countdown owning at most one pending expiry callback.
///
/// Starting the timer again or cancelling it discards the previously scheduled callback.
#[derive(Debug, Default)]
pub struct Timer {
    epoch: u64,
    armed: bool,
    ends_at: Option<SystemTime>,
    task: Option<JoinHandle<()>>,
}

impl Timer {
    /// Create an idle timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the countdown, replacing any pending one.
    ///
    /// `on_expire` receives the token of this countdown and returns the future to run once
    /// `duration` has elapsed. Must be called from within a Tokio runtime.
    pub fn start<F, Fut>(&mut self, duration: Duration, on_expire: F) -> TimerToken
    where
        F: FnOnce(TimerToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.epoch = self.epoch.wrapping_add(1);
        let token = TimerToken(self.epoch);

        let callback = on_expire(token);
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            callback.await;
        }));
        self.armed = true;
        self.ends_at = Some(SystemTime::now() + duration);

        token
    }

    /// Discard the pending countdown, if any.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.armed = false;
        self.ends_at = None;
    }

    /// Whether `token` identifies the countdown currently pending.
    pub fn is_current(&self, token: TimerToken) -> bool {
        self.armed && token.0 == self.epoch
    }

    /// Acknowledge an expiry notification.
    ///
    /// Returns `true` and disarms the timer when `token` belongs to the pending countdown;
    /// returns `false` for stale notifications, leaving the timer untouched.
    pub fn expire(&mut self, token: TimerToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        // The task is the one delivering this notification; let it finish on its own.
        self.task = None;
        self.armed = false;
        self.ends_at = None;
        true
    }

    /// Absolute expiry instant of the pending countdown.
    pub fn ends_at(&self) -> Option<SystemTime> {
        self.ends_at
    }

    /// Time left before expiry, saturating at zero. `None` when idle.
    pub fn remaining(&self) -> Option<Duration> {
        self.ends_at.map(|ends_at| {
            ends_at
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO)
        })
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}
