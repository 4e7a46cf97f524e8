//! Concrete adapter factories for runtime wiring.

use platform_host::{PrefsStore, TaskScheduler};

use crate::{BrowserScheduler, WebPrefsStore};

/// Returns the preference store used by the browser build.
pub fn prefs_store() -> impl PrefsStore + Clone {
    WebPrefsStore
}

/// Returns the task scheduler used by the browser build.
pub fn task_scheduler() -> impl TaskScheduler + Clone {
    BrowserScheduler::default()
}

/// Returns a stable token naming the host strategy, for diagnostics.
pub const fn host_strategy_name() -> &'static str {
    if cfg!(target_arch = "wasm32") {
        "browser"
    } else {
        "native-inert"
    }
}
