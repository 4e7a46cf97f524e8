//! Browser task scheduler backed by `setTimeout` and `requestAnimationFrame`.
//!
//! Each scheduled task owns a `Closure` kept alive in the scheduler's table until it has
//! finished or been cancelled. Finished entries are swept on the next scheduling call so a
//! closure is never dropped while it is still on the JS stack.

use platform_host::{ScheduledTask, TaskHandle, TaskScheduler};

#[cfg(target_arch = "wasm32")]
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, JsCast};

#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy)]
enum BrowserTaskKind {
    Timeout(i32),
    Frame(i32),
}

#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskPhase {
    Pending,
    Running,
    Finished,
}

#[cfg(target_arch = "wasm32")]
struct BrowserTask {
    kind: BrowserTaskKind,
    phase: Rc<Cell<TaskPhase>>,
    _closure: Closure<dyn FnMut()>,
}

#[derive(Clone, Default)]
/// Scheduler that defers tasks through the browser event loop.
///
/// On non-WASM targets tasks are dropped without running; native hosts and tests use
/// [`platform_host::ManualScheduler`] instead.
pub struct BrowserScheduler {
    #[cfg(target_arch = "wasm32")]
    tasks: Rc<RefCell<HashMap<TaskHandle, BrowserTask>>>,
    #[cfg(target_arch = "wasm32")]
    next_handle: Rc<Cell<u64>>,
}

impl std::fmt::Debug for BrowserScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserScheduler").finish_non_exhaustive()
    }
}

#[cfg(target_arch = "wasm32")]
impl BrowserScheduler {
    fn sweep_finished(&self) {
        self.tasks
            .borrow_mut()
            .retain(|_, task| task.phase.get() != TaskPhase::Finished);
    }

    fn allocate_handle(&self) -> TaskHandle {
        let next = self.next_handle.get() + 1;
        self.next_handle.set(next);
        TaskHandle::new(next)
    }

    fn wrap(task: ScheduledTask, phase: Rc<Cell<TaskPhase>>) -> Closure<dyn FnMut()> {
        let mut task = Some(task);
        Closure::wrap(Box::new(move || {
            phase.set(TaskPhase::Running);
            if let Some(task) = task.take() {
                task();
            }
            phase.set(TaskPhase::Finished);
        }) as Box<dyn FnMut()>)
    }

    fn register(
        &self,
        task: ScheduledTask,
        arm: impl FnOnce(&web_sys::Window, &js_sys::Function) -> Result<BrowserTaskKind, String>,
    ) -> TaskHandle {
        self.sweep_finished();
        let handle = self.allocate_handle();
        let Some(window) = web_sys::window() else {
            web_sys::console::warn_1(&"task scheduling skipped: window unavailable".into());
            return handle;
        };
        let phase = Rc::new(Cell::new(TaskPhase::Pending));
        let closure = Self::wrap(task, phase.clone());
        match arm(&window, closure.as_ref().unchecked_ref()) {
            Ok(kind) => {
                self.tasks.borrow_mut().insert(
                    handle,
                    BrowserTask {
                        kind,
                        phase,
                        _closure: closure,
                    },
                );
            }
            Err(err) => web_sys::console::warn_1(&err.into()),
        }
        handle
    }
}

impl TaskScheduler for BrowserScheduler {
    fn now_ms(&self) -> u64 {
        #[cfg(target_arch = "wasm32")]
        {
            js_sys::Date::now().max(0.0) as u64
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64
        }
    }

    fn set_timeout(&self, delay_ms: u32, task: ScheduledTask) -> TaskHandle {
        #[cfg(target_arch = "wasm32")]
        {
            let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
            self.register(task, |window, callback| {
                window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(callback, delay)
                    .map(BrowserTaskKind::Timeout)
                    .map_err(|e| format!("setTimeout failed: {e:?}"))
            })
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (delay_ms, task);
            TaskHandle::new(0)
        }
    }

    fn request_frame(&self, task: ScheduledTask) -> TaskHandle {
        #[cfg(target_arch = "wasm32")]
        {
            self.register(task, |window, callback| {
                window
                    .request_animation_frame(callback)
                    .map(BrowserTaskKind::Frame)
                    .map_err(|e| format!("requestAnimationFrame failed: {e:?}"))
            })
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = task;
            TaskHandle::new(0)
        }
    }

    fn cancel(&self, handle: TaskHandle) {
        #[cfg(target_arch = "wasm32")]
        {
            let mut tasks = self.tasks.borrow_mut();
            let Some(phase) = tasks.get(&handle).map(|task| task.phase.get()) else {
                return;
            };
            // A running task is left for the sweep; dropping it here would free a live closure.
            if phase == TaskPhase::Running {
                return;
            }
            let Some(task) = tasks.remove(&handle) else {
                return;
            };
            drop(tasks);
            if phase == TaskPhase::Finished {
                return;
            }
            if let Some(window) = web_sys::window() {
                match task.kind {
                    BrowserTaskKind::Timeout(id) => window.clear_timeout_with_handle(id),
                    BrowserTaskKind::Frame(id) => {
                        let _ = window.cancel_animation_frame(id);
                    }
                }
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = handle;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_wasm_browser_scheduler_drops_tasks_and_reports_wall_clock() {
        let scheduler = BrowserScheduler::default();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();

        let handle = scheduler.set_timeout(0, Box::new(move || flag.set(true)));
        scheduler.cancel(handle);

        assert!(!ran.get());
        assert!(scheduler.now_ms() > 0);
    }
}
