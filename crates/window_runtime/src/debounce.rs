//! Cancellable trailing-edge debounce over a [`TaskScheduler`].
//!
//! Each [`Debouncer::trigger`] cancels the pending timeout and schedules a new one, so a burst of
//! triggers inside one delay window runs the action once. Clones share the same pending handle.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use platform_host::{TaskHandle, TaskScheduler};

type Action = Rc<dyn Fn()>;

struct DebouncerInner {
    scheduler: Rc<dyn TaskScheduler>,
    delay_ms: u32,
    pending: Cell<Option<TaskHandle>>,
    suspended: Cell<u32>,
    action: RefCell<Option<Action>>,
}

impl DebouncerInner {
    fn run_action(&self) {
        let action = self.action.borrow().clone();
        if let Some(action) = action {
            action();
        }
    }
}

#[derive(Clone)]
pub struct Debouncer {
    inner: Rc<DebouncerInner>,
}

impl Debouncer {
    pub fn new(scheduler: Rc<dyn TaskScheduler>, delay_ms: u32) -> Self {
        Self {
            inner: Rc::new(DebouncerInner {
                scheduler,
                delay_ms,
                pending: Cell::new(None),
                suspended: Cell::new(0),
                action: RefCell::new(None),
            }),
        }
    }

    /// Installs the deferred action. Owners that hold the debouncer set this after construction.
    pub fn set_action(&self, action: impl Fn() + 'static) {
        *self.inner.action.borrow_mut() = Some(Rc::new(action));
    }

    /// Restarts the delay window. Ignored while suspended.
    pub fn trigger(&self) {
        if self.inner.suspended.get() > 0 {
            return;
        }
        self.cancel();
        let weak: Weak<DebouncerInner> = Rc::downgrade(&self.inner);
        let handle = self.inner.scheduler.set_timeout(
            self.inner.delay_ms,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.pending.set(None);
                    inner.run_action();
                }
            }),
        );
        self.inner.pending.set(Some(handle));
    }

    /// Drops any pending run. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        match self.inner.pending.take() {
            Some(handle) => {
                self.inner.scheduler.cancel(handle);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.inner.pending.get().is_some()
    }

    /// Suppresses triggers until the returned guard is dropped. Guards nest.
    pub fn suspend(&self) -> SuspendGuard {
        self.inner.suspended.set(self.inner.suspended.get() + 1);
        SuspendGuard {
            inner: Rc::clone(&self.inner),
        }
    }
}

#[must_use = "triggers resume as soon as the guard is dropped"]
pub struct SuspendGuard {
    inner: Rc<DebouncerInner>,
}

impl Drop for SuspendGuard {
    fn drop(&mut self) {
        self.inner
            .suspended
            .set(self.inner.suspended.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use platform_host::ManualScheduler;
    use pretty_assertions::assert_eq;

    use super::*;

    fn counting(delay_ms: u32) -> (ManualScheduler, Debouncer, Rc<Cell<usize>>) {
        let scheduler = ManualScheduler::default();
        let debouncer = Debouncer::new(Rc::new(scheduler.clone()), delay_ms);
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        debouncer.set_action(move || counter.set(counter.get() + 1));
        (scheduler, debouncer, runs)
    }

    #[test]
    fn burst_inside_window_runs_once() {
        let (scheduler, debouncer, runs) = counting(750);
        for _ in 0..5 {
            debouncer.trigger();
            scheduler.advance(100);
        }
        assert_eq!(runs.get(), 0);
        assert!(debouncer.is_pending());

        scheduler.advance(750);
        assert_eq!(runs.get(), 1);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn spaced_triggers_each_run() {
        let (scheduler, debouncer, runs) = counting(100);
        for _ in 0..3 {
            debouncer.trigger();
            scheduler.advance(150);
        }
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn cancel_and_suspend_prevent_runs() {
        let (scheduler, debouncer, runs) = counting(100);
        debouncer.trigger();
        assert!(debouncer.cancel());
        scheduler.advance(500);
        assert_eq!(runs.get(), 0);

        {
            let _guard = debouncer.suspend();
            debouncer.trigger();
            assert!(!debouncer.is_pending());
        }
        debouncer.trigger();
        scheduler.advance(100);
        assert_eq!(runs.get(), 1);
    }
}
