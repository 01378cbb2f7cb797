//! Frame-driven task scheduling.
//!
//! Nothing here runs callbacks. Owners register timers or per-frame tasks, keep the
//! returned handles, and check each [`Tick`] for the handles that fired.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ManualClock {
    now: Duration,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, by: Duration) -> Duration {
        self.now += by;
        self.now
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
enum TaskKind {
    Timeout { due: Duration },
    Frame,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub now: Duration,
    pub dt: Duration,
    fired: Vec<TaskHandle>,
}

impl Tick {
    pub fn fired(&self, handle: TaskHandle) -> bool {
        self.fired.binary_search(&handle).is_ok()
    }

    pub fn fired_handles(&self) -> &[TaskHandle] {
        &self.fired
    }
}

#[derive(Debug, Default)]
pub struct FrameScheduler {
    tasks: BTreeMap<TaskHandle, TaskKind>,
    next_id: u64,
    now: Duration,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Fires once on the first tick at or after `now + delay`.
    pub fn set_timeout(&mut self, delay: Duration) -> TaskHandle {
        let due = self.now.saturating_add(delay);
        self.register(TaskKind::Timeout { due })
    }

    pub fn request_frames(&mut self) -> TaskHandle {
        self.register(TaskKind::Frame)
    }

    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        self.tasks.remove(&handle).is_some()
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.contains_key(&handle)
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Moves time forward to `now` and reports which tasks fire.
    ///
    /// Time never runs backwards; an earlier `now` is treated as a zero-length frame.
    /// Due timeouts are consumed. Tasks registered after this call wait for the next tick.
    pub fn advance(&mut self, now: Duration) -> Tick {
        let now = now.max(self.now);
        let dt = now - self.now;
        self.now = now;

        let fired: Vec<TaskHandle> = self
            .tasks
            .iter()
            .filter(|(_, kind)| match kind {
                TaskKind::Timeout { due } => *due <= now,
                TaskKind::Frame => true,
            })
            .map(|(handle, _)| *handle)
            .collect();

        self.tasks
            .retain(|handle, kind| !(matches!(kind, TaskKind::Timeout { .. }) && fired.contains(handle)));

        Tick { now, dt, fired }
    }

    fn register(&mut self, kind: TaskKind) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.tasks.insert(handle, kind);
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn timeout_fires_once_when_due() {
        let mut scheduler = FrameScheduler::new();
        let timer = scheduler.set_timeout(100 * MS);

        assert!(!scheduler.advance(99 * MS).fired(timer));
        assert!(scheduler.advance(116 * MS).fired(timer));
        assert!(!scheduler.is_pending(timer));
        assert!(!scheduler.advance(200 * MS).fired(timer));
    }

    #[test]
    fn zero_delay_fires_on_next_tick() {
        let mut scheduler = FrameScheduler::new();
        let timer = scheduler.set_timeout(Duration::ZERO);
        assert!(scheduler.advance(Duration::ZERO).fired(timer));
    }

    #[test]
    fn frame_tasks_repeat_until_cancelled() {
        let mut scheduler = FrameScheduler::new();
        let frames = scheduler.request_frames();

        assert!(scheduler.advance(16 * MS).fired(frames));
        assert!(scheduler.advance(33 * MS).fired(frames));
        assert!(scheduler.cancel(frames));
        assert!(!scheduler.advance(50 * MS).fired(frames));
        assert!(!scheduler.cancel(frames));
    }

    #[test]
    fn cancelled_timeout_never_fires() {
        let mut scheduler = FrameScheduler::new();
        let timer = scheduler.set_timeout(10 * MS);
        scheduler.cancel(timer);
        assert!(scheduler.advance(Duration::from_secs(5)).fired_handles().is_empty());
    }

    #[test]
    fn time_is_monotonic() {
        let mut scheduler = FrameScheduler::new();
        scheduler.advance(100 * MS);
        let tick = scheduler.advance(50 * MS);
        assert_eq!(tick.now, 100 * MS);
        assert_eq!(tick.dt, Duration::ZERO);
    }

    #[test]
    fn manual_clock_accumulates() {
        let mut clock = ManualClock::new();
        clock.advance(10 * MS);
        assert_eq!(clock.advance(5 * MS), 15 * MS);
        assert_eq!(clock.now(), 15 * MS);
    }
}
