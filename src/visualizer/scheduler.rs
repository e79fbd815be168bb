//! Deterministic stand-in for the host's interval, timeout and
//! animation-frame facilities.
//!
//! Time only moves when the host calls [`Scheduler::advance`], so every
//! timing behaviour of the visualizer can be driven from tests.

use std::collections::BTreeMap;

/// Handle for a pending interval or timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Handle for the single pending animation-frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

#[derive(Debug, Clone)]
struct Timer<T> {
    due_ms: f64,
    period_ms: Option<f64>,
    task: T,
}

/// Counters exposed for assertions on cleanup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub timers_fired: u64,
    pub timers_cleared: u64,
    pub frames_requested: u64,
    pub frames_cancelled: u64,
    pub frames_taken: u64,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    now_ms: f64,
    next_id: u64,
    timers: BTreeMap<TimerId, Timer<T>>,
    frame: Option<FrameHandle>,
    stats: SchedulerStats,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now_ms: 0.0,
            next_id: 0,
            timers: BTreeMap::new(),
            frame: None,
            stats: SchedulerStats::default(),
        }
    }
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current scheduler time in milliseconds.
    pub fn now(&self) -> f64 {
        self.now_ms
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Fire `task` every `period_ms`, first at `now + period_ms`.
    pub fn set_interval(&mut self, period_ms: f64, task: T) -> TimerId {
        let id = TimerId(self.next_id());
        let period_ms = period_ms.max(1.0);
        self.timers.insert(
            id,
            Timer {
                due_ms: self.now_ms + period_ms,
                period_ms: Some(period_ms),
                task,
            },
        );
        id
    }

    /// Fire `task` once at `now + delay_ms`.
    pub fn set_timeout(&mut self, delay_ms: f64, task: T) -> TimerId {
        let id = TimerId(self.next_id());
        self.timers.insert(
            id,
            Timer {
                due_ms: self.now_ms + delay_ms.max(0.0),
                period_ms: None,
                task,
            },
        );
        id
    }

    /// Cancel a timer. Returns `false` if it already fired or was cleared.
    pub fn clear(&mut self, id: TimerId) -> bool {
        let removed = self.timers.remove(&id).is_some();
        if removed {
            self.stats.timers_cleared += 1;
        }
        removed
    }

    pub fn clear_all(&mut self) {
        self.stats.timers_cleared += self.timers.len() as u64;
        self.timers.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Move time forward and collect every task that came due, oldest first.
    ///
    /// An interval fires at most once per call; a late interval is
    /// rescheduled from `now` rather than bursting to catch up.
    pub fn advance(&mut self, now_ms: f64) -> Vec<T> {
        if now_ms > self.now_ms {
            self.now_ms = now_ms;
        }

        let mut due: Vec<(f64, TimerId)> = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.due_ms <= self.now_ms)
            .map(|(id, timer)| (timer.due_ms, *id))
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut fired = Vec::with_capacity(due.len());
        for (_, id) in due {
            let Some(timer) = self.timers.get_mut(&id) else {
                continue;
            };
            fired.push(timer.task.clone());
            self.stats.timers_fired += 1;

            match timer.period_ms {
                Some(period) => {
                    timer.due_ms += period;
                    if timer.due_ms <= self.now_ms {
                        timer.due_ms = self.now_ms + period;
                    }
                }
                None => {
                    self.timers.remove(&id);
                }
            }
        }
        fired
    }

    /// Request the next animation frame, replacing any pending request.
    pub fn request_frame(&mut self) -> FrameHandle {
        if self.frame.take().is_some() {
            self.stats.frames_cancelled += 1;
        }
        let handle = FrameHandle(self.next_id());
        self.frame = Some(handle);
        self.stats.frames_requested += 1;
        handle
    }

    pub fn cancel_frame(&mut self) -> Option<FrameHandle> {
        let cancelled = self.frame.take();
        if cancelled.is_some() {
            self.stats.frames_cancelled += 1;
        }
        cancelled
    }

    /// Consume the pending frame request, if any. Called when the host
    /// delivers a frame.
    pub fn take_frame(&mut self) -> Option<FrameHandle> {
        let taken = self.frame.take();
        if taken.is_some() {
            self.stats.frames_taken += 1;
        }
        taken
    }

    pub fn has_pending_frame(&self) -> bool {
        self.frame.is_some()
    }
}
