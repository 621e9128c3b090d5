use custodian_policy::is_hard_interrupt;
use std::time::{Duration, Instant};

use crate::timers::{TimerHandle, TimerKind, TimerTable};

/// Unconditional override. Engaging it cancels every armed timer and starts
/// a fixed suspension window; the window's expiry is the only way out.
#[derive(Debug)]
pub struct KillSwitch {
    window: Duration,
    engaged_at: Option<Instant>,
    suspension: Option<TimerHandle>,
    activations: u64,
}

impl KillSwitch {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            engaged_at: None,
            suspension: None,
            activations: 0,
        }
    }

    pub fn detects(&self, text: &str) -> bool {
        is_hard_interrupt(text)
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged_at.is_some()
    }

    pub fn activations(&self) -> u64 {
        self.activations
    }

    /// Returns false if already engaged; the running window is left as is.
    pub fn engage(&mut self, timers: &mut TimerTable, now: Instant) -> bool {
        if self.is_engaged() {
            return false;
        }

        timers.cancel_all();
        self.suspension = Some(timers.arm(TimerKind::Suspension, now, self.window));
        self.engaged_at = Some(now);
        self.activations += 1;
        tracing::warn!("Kill switch engaged for {:?}", self.window);
        true
    }

    /// Called when a suspension timer fires. Returns true exactly once per
    /// engagement, and only for the timer this engagement armed.
    pub fn release(&mut self, fired: TimerHandle) -> bool {
        if self.suspension != Some(fired) {
            return false;
        }
        self.suspension = None;
        self.engaged_at = None;
        tracing::info!("Suspension lifted after {:?}", self.window);
        true
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.engaged_at
            .map(|since| (since + self.window).saturating_duration_since(now))
    }
}
