//! Cooperative task scheduling contracts for timer and frame-paced callbacks.
//!
//! Everything runs on the UI thread: a scheduled task is a boxed `FnOnce` that the host invokes
//! from its event loop. Handles are the only way to cancel, so callers keep them in their own
//! state and clear them on completion.

use std::{cell::RefCell, fmt, rc::Rc};

/// One-shot unit of deferred work.
pub type ScheduledTask = Box<dyn FnOnce()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Cancellation handle for a scheduled timeout or frame callback.
pub struct TaskHandle(u64);

impl TaskHandle {
    /// Wraps a raw host handle value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw host handle value.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Host service that runs deferred tasks on the UI thread.
pub trait TaskScheduler {
    /// Current host time in unix milliseconds (virtual time for test schedulers).
    fn now_ms(&self) -> u64;

    /// Runs `task` once after `delay_ms` milliseconds.
    fn set_timeout(&self, delay_ms: u32, task: ScheduledTask) -> TaskHandle;

    /// Runs `task` once before the next rendered frame.
    fn request_frame(&self, task: ScheduledTask) -> TaskHandle;

    /// Cancels a pending timeout or frame callback. Unknown or already-fired handles are ignored.
    fn cancel(&self, handle: TaskHandle);
}

struct PendingTimer {
    due_ms: u64,
    handle: TaskHandle,
    task: ScheduledTask,
}

struct PendingFrame {
    handle: TaskHandle,
    task: ScheduledTask,
}

#[derive(Default)]
struct ManualSchedulerState {
    now_ms: u64,
    next_handle: u64,
    timers: Vec<PendingTimer>,
    frames: Vec<PendingFrame>,
}

impl ManualSchedulerState {
    fn allocate_handle(&mut self) -> TaskHandle {
        self.next_handle += 1;
        TaskHandle(self.next_handle)
    }

    fn take_next_due(&mut self, deadline_ms: u64) -> Option<PendingTimer> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due_ms <= deadline_ms)
            .min_by_key(|(_, timer)| (timer.due_ms, timer.handle))
            .map(|(index, _)| index)?;
        Some(self.timers.remove(index))
    }
}

#[derive(Clone, Default)]
/// Deterministic scheduler driven by an explicit virtual clock.
///
/// Timers fire only from [`ManualScheduler::advance`] and frame callbacks only from
/// [`ManualScheduler::run_frames`]. Clones share one clock and queue.
pub struct ManualScheduler {
    inner: Rc<RefCell<ManualSchedulerState>>,
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("ManualScheduler")
            .field("now_ms", &state.now_ms)
            .field("pending_timers", &state.timers.len())
            .field("pending_frames", &state.frames.len())
            .finish()
    }
}

impl ManualScheduler {
    /// Creates a scheduler whose clock starts at `now_ms`.
    pub fn starting_at(now_ms: u64) -> Self {
        let scheduler = Self::default();
        scheduler.inner.borrow_mut().now_ms = now_ms;
        scheduler
    }

    /// Advances virtual time by `elapsed_ms`, firing due timers in deadline order.
    ///
    /// Timers scheduled by a firing task run in the same call when they fall inside the window.
    /// Returns the number of tasks executed.
    pub fn advance(&self, elapsed_ms: u64) -> usize {
        let deadline = self.inner.borrow().now_ms.saturating_add(elapsed_ms);
        let mut fired = 0;
        loop {
            let next = {
                let mut state = self.inner.borrow_mut();
                let next = state.take_next_due(deadline);
                if let Some(timer) = next.as_ref() {
                    state.now_ms = state.now_ms.max(timer.due_ms);
                }
                next
            };
            let Some(timer) = next else {
                break;
            };
            (timer.task)();
            fired += 1;
        }
        self.inner.borrow_mut().now_ms = deadline;
        fired
    }

    /// Runs every frame callback queued before this call and returns how many ran.
    ///
    /// Callbacks requested while draining are deferred to the following frame.
    pub fn run_frames(&self) -> usize {
        let frames = std::mem::take(&mut self.inner.borrow_mut().frames);
        let count = frames.len();
        for frame in frames {
            (frame.task)();
        }
        count
    }

    /// Number of timers waiting to fire.
    pub fn pending_timers(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Number of frame callbacks waiting for the next frame.
    pub fn pending_frames(&self) -> usize {
        self.inner.borrow().frames.len()
    }
}

impl TaskScheduler for ManualScheduler {
    fn now_ms(&self) -> u64 {
        self.inner.borrow().now_ms
    }

    fn set_timeout(&self, delay_ms: u32, task: ScheduledTask) -> TaskHandle {
        let mut state = self.inner.borrow_mut();
        let handle = state.allocate_handle();
        let due_ms = state.now_ms.saturating_add(u64::from(delay_ms));
        state.timers.push(PendingTimer {
            due_ms,
            handle,
            task,
        });
        handle
    }

    fn request_frame(&self, task: ScheduledTask) -> TaskHandle {
        let mut state = self.inner.borrow_mut();
        let handle = state.allocate_handle();
        state.frames.push(PendingFrame { handle, task });
        handle
    }

    fn cancel(&self, handle: TaskHandle) {
        let mut state = self.inner.borrow_mut();
        state.timers.retain(|timer| timer.handle != handle);
        state.frames.retain(|frame| frame.handle != handle);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn timers_fire_in_deadline_order_once_due() {
        let scheduler = ManualScheduler::starting_at(1_000);
        let log = Rc::new(RefCell::new(Vec::new()));

        for (delay, label) in [(300, "late"), (100, "early"), (200, "middle")] {
            let log = log.clone();
            scheduler.set_timeout(delay, Box::new(move || log.borrow_mut().push(label)));
        }

        assert_eq!(scheduler.advance(150), 1);
        assert_eq!(*log.borrow(), vec!["early"]);
        assert_eq!(scheduler.advance(1_000), 2);
        assert_eq!(*log.borrow(), vec!["early", "middle", "late"]);
        assert_eq!(scheduler.now_ms(), 2_150);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let scheduler = ManualScheduler::default();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let handle = scheduler.set_timeout(50, Box::new(move || flag.set(true)));

        scheduler.cancel(handle);
        scheduler.advance(100);

        assert!(!fired.get());
        assert_eq!(scheduler.pending_timers(), 0);
    }

    #[test]
    fn task_observes_clock_at_its_deadline() {
        let scheduler = ManualScheduler::starting_at(10);
        let seen = Rc::new(Cell::new(0));
        let clock = scheduler.clone();
        let sink = seen.clone();
        scheduler.set_timeout(40, Box::new(move || sink.set(clock.now_ms())));

        scheduler.advance(500);

        assert_eq!(seen.get(), 50);
    }

    #[test]
    fn frames_requested_while_draining_wait_for_next_frame() {
        let scheduler = ManualScheduler::default();
        let count = Rc::new(Cell::new(0));
        let inner_scheduler = scheduler.clone();
        let inner_count = count.clone();
        scheduler.request_frame(Box::new(move || {
            inner_count.set(inner_count.get() + 1);
            let nested = inner_count.clone();
            inner_scheduler.request_frame(Box::new(move || nested.set(nested.get() + 10)));
        }));

        assert_eq!(scheduler.run_frames(), 1);
        assert_eq!(count.get(), 1);
        assert_eq!(scheduler.pending_frames(), 1);
        assert_eq!(scheduler.run_frames(), 1);
        assert_eq!(count.get(), 11);
    }
}
