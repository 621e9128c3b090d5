use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    ConsentTimeout,
    Cooldown,
    Display,
    Suspension,
}

/// Identifies one arming of a timer. A handle from an earlier arming never
/// matches a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    pub kind: TimerKind,
    pub epoch: u64,
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    deadline: Instant,
    epoch: u64,
}

/// At most one armed timer per kind. Arming a kind replaces whatever was
/// armed before; due timers are handed out once and then forgotten.
#[derive(Debug, Default)]
pub struct TimerTable {
    armed: HashMap<TimerKind, Armed>,
    next_epoch: u64,
}

impl TimerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, kind: TimerKind, now: Instant, after: Duration) -> TimerHandle {
        self.next_epoch += 1;
        let epoch = self.next_epoch;
        if self
            .armed
            .insert(kind, Armed { deadline: now + after, epoch })
            .is_some()
        {
            tracing::debug!("Re-armed {:?} timer", kind);
        }
        TimerHandle { kind, epoch }
    }

    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.armed.remove(&kind).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.armed.clear();
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.armed.contains_key(&kind)
    }

    pub fn deadline(&self, kind: TimerKind) -> Option<Instant> {
        self.armed.get(&kind).map(|armed| armed.deadline)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.armed.values().map(|armed| armed.deadline).min()
    }

    /// Removes and returns every timer whose deadline has passed, earliest
    /// first.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerHandle> {
        let mut due: Vec<(Instant, TimerHandle)> = self
            .armed
            .iter()
            .filter(|(_, armed)| armed.deadline <= now)
            .map(|(kind, armed)| {
                (
                    armed.deadline,
                    TimerHandle {
                        kind: *kind,
                        epoch: armed.epoch,
                    },
                )
            })
            .collect();

        due.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.kind.cmp(&b.1.kind)));

        for (_, handle) in &due {
            self.armed.remove(&handle.kind);
        }

        due.into_iter().map(|(_, handle)| handle).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_rearm_replaces_previous() {
        let start = Instant::now();
        let mut timers = TimerTable::new();

        let first = timers.arm(TimerKind::ConsentTimeout, start, Duration::from_secs(30));
        let second = timers.arm(TimerKind::ConsentTimeout, start, Duration::from_secs(60));

        assert_ne!(first, second);
        assert!(timers.take_due(start + Duration::from_secs(31)).is_empty());
        assert_eq!(timers.take_due(start + Duration::from_secs(61)), vec![second]);
    }

    #[test]
    fn test_due_timers_fire_once() {
        let start = Instant::now();
        let mut timers = TimerTable::new();
        timers.arm(TimerKind::Suspension, start, Duration::from_secs(5));

        let later = start + Duration::from_secs(6);
        assert_eq!(timers.take_due(later).len(), 1);
        assert!(timers.take_due(later).is_empty());
        assert_eq!(timers.next_deadline(), None);
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let start = Instant::now();
        let mut timers = TimerTable::new();
        timers.arm(TimerKind::Cooldown, start, Duration::from_secs(2));

        assert!(timers.cancel(TimerKind::Cooldown));
        assert!(!timers.is_armed(TimerKind::Cooldown));
        assert!(timers.take_due(start + Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn test_due_order_is_by_deadline() {
        let start = Instant::now();
        let mut timers = TimerTable::new();
        timers.arm(TimerKind::Display, start, Duration::from_secs(3));
        timers.arm(TimerKind::Cooldown, start, Duration::from_secs(1));

        let kinds: Vec<_> = timers
            .take_due(start + Duration::from_secs(5))
            .into_iter()
            .map(|h| h.kind)
            .collect();
        assert_eq!(kinds, vec![TimerKind::Cooldown, TimerKind::Display]);
        assert_eq!(timers.next_deadline(), None);
    }
}
