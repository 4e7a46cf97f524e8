//! Browser (`wasm32`) implementations of [`platform_host`] service contracts.
//!
//! This crate wires the window runtime to `window.localStorage` for preference persistence and
//! to `setTimeout`/`requestAnimationFrame` for cooperative scheduling. Non-WASM builds compile
//! to inert fallbacks so the workspace still builds and tests natively.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Concrete adapter factories for runtime wiring.
pub mod adapters;
pub mod scheduler;
pub mod storage;

pub use adapters::{host_strategy_name, prefs_store, task_scheduler};
pub use scheduler::BrowserScheduler;
pub use storage::local_prefs::WebPrefsStore;
