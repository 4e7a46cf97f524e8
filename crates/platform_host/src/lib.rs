//! Typed host-domain contracts shared by the window runtime and browser adapters.
//!
//! This crate is the API-first boundary for platform services the runtime depends on:
//! key/value preference storage and cooperative task scheduling. Concrete browser adapters
//! live in `platform_host_web`; the in-memory adapters here back native builds and tests.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod scheduler;
pub mod storage;

pub use scheduler::{ManualScheduler, ScheduledTask, TaskHandle, TaskScheduler};
pub use storage::prefs::{
    load_pref_with, save_pref_with, MemoryPrefsStore, NoopPrefsStore, PrefsStore,
};
