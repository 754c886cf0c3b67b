//! Deferred tasks keyed by cancellable handles.
//!
//! Each agent subsystem that needs delayed work (cooldowns, decay passes,
//! disengage gating) owns a [`Scheduler`] over its own task type. Time only
//! moves when the owner calls [`Scheduler::advance`], so everything stays
//! deterministic under a fixed tick sequence.
//!
//! A handle that has fired (one-shot) or been cancelled is dead: asking
//! about it answers "inactive" and cancelling it again is a no-op.

use serde::{Deserialize, Serialize};

/// Opaque handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Scheduled<T> {
    handle: TimerHandle,
    due: f64,
    interval: Option<f64>,
    task: T,
}

/// A per-owner timer wheel with a local clock.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: f64,
    next_id: u64,
    pending: Vec<Scheduled<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self { now: 0.0, next_id: 0, pending: Vec::new() }
    }
}

impl<T: Clone> Scheduler<T> {
    /// Create an empty scheduler at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds elapsed on this scheduler's clock.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Run `task` once after `delay` seconds.
    pub fn schedule(&mut self, delay: f32, task: T) -> TimerHandle {
        self.insert(delay, None, task)
    }

    /// Run `task` every `interval` seconds, first after `interval`.
    pub fn schedule_repeating(&mut self, interval: f32, task: T) -> TimerHandle {
        self.insert(interval, Some(f64::from(interval.max(f32::EPSILON))), task)
    }

    fn insert(&mut self, delay: f32, interval: Option<f64>, task: T) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Scheduled {
            handle,
            due: self.now + f64::from(delay.max(0.0)),
            interval,
            task,
        });
        handle
    }

    /// Cancel a task. Returns whether it was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|s| s.handle != handle);
        self.pending.len() != before
    }

    /// Drop every pending task.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Whether `handle` is still pending.
    #[must_use]
    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|s| s.handle == handle)
    }

    /// Seconds until `handle` fires next, if it is still pending.
    #[must_use]
    pub fn remaining(&self, handle: TimerHandle) -> Option<f64> {
        self.pending
            .iter()
            .find(|s| s.handle == handle)
            .map(|s| (s.due - self.now).max(0.0))
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Move the clock forward and collect every task that came due, in due order.
    ///
    /// A repeating task fires once per elapsed interval, so a long step
    /// can yield it several times.
    pub fn advance(&mut self, dt: f32) -> Vec<(TimerHandle, T)> {
        self.now += f64::from(dt.max(0.0));
        let mut fired: Vec<(f64, TimerHandle, T)> = Vec::new();

        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due > self.now {
                i += 1;
                continue;
            }
            match self.pending[i].interval {
                Some(interval) => {
                    let entry = &mut self.pending[i];
                    while entry.due <= self.now {
                        fired.push((entry.due, entry.handle, entry.task.clone()));
                        entry.due += interval;
                    }
                    i += 1;
                }
                None => {
                    let entry = self.pending.swap_remove(i);
                    fired.push((entry.due, entry.handle, entry.task));
                }
            }
        }

        fired.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        fired.into_iter().map(|(_, handle, task)| (handle, task)).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Task {
        Ping,
        Pong,
    }

    #[test]
    fn one_shot_fires_once_when_due() {
        let mut s = Scheduler::new();
        let h = s.schedule(1.0, Task::Ping);
        assert!(s.advance(0.5).is_empty());
        assert!(s.is_active(h));
        assert_eq!(s.advance(0.5), vec![(h, Task::Ping)]);
        assert!(!s.is_active(h));
        assert!(s.advance(10.0).is_empty());
    }

    #[test]
    fn cancelled_task_never_fires() {
        let mut s = Scheduler::new();
        let h = s.schedule(1.0, Task::Ping);
        assert!(s.cancel(h));
        assert!(!s.cancel(h));
        assert!(s.advance(5.0).is_empty());
    }

    #[test]
    fn repeating_task_fires_per_interval() {
        let mut s = Scheduler::new();
        let h = s.schedule_repeating(1.0, Task::Pong);
        assert_eq!(s.advance(3.5).len(), 3);
        assert!(s.is_active(h));
        let remaining = s.remaining(h).expect("still pending");
        assert!((remaining - 0.5).abs() < 1e-9);
    }

    #[test]
    fn tasks_fire_in_due_order() {
        let mut s = Scheduler::new();
        s.schedule(2.0, Task::Pong);
        s.schedule(1.0, Task::Ping);
        let fired: Vec<Task> = s.advance(3.0).into_iter().map(|(_, t)| t).collect();
        assert_eq!(fired, vec![Task::Ping, Task::Pong]);
    }
}
