//! Window lifecycle, ordering, and persistence engine for the browser desktop.
//!
//! [`DesktopRuntime`] is the entry point: it owns the window registry, the z-order stack, one
//! dialog controller per window, the multi-instance managers, and the session engine. Hosts
//! build it through [`host::boot_desktop`] in the browser or [`DesktopRuntime::new`] with
//! explicit [`DesktopServices`] elsewhere.

pub mod apps;
pub mod config;
pub mod debounce;
pub mod dialog;
pub mod error;
pub mod host;
pub mod instances;
pub mod model;
pub mod persistence;
pub mod program_info;
pub mod registry;
pub mod runtime;
pub mod session;
pub mod window_manager;
pub mod z_order;

pub use config::{DesktopConfig, SnapThreshold};
pub use dialog::{DialogController, DialogEffect};
pub use error::DesktopError;
pub use instances::{
    InstanceChange, InstanceManager, InstanceRecord, InstanceSeed, LifecycleEvent,
    WindowInstance,
};
pub use model::*;
pub use program_info::{FallbackTranslator, ProgramInfo, Translate};
pub use registry::{builtin_window_configs, WindowRegistry};
pub use runtime::{DesktopRuntime, DesktopServices, PageEvent, SharedDesktop};
pub use session::{SessionSnapshot, SessionStats, SESSION_KEY, SESSION_VERSION};
pub use z_order::ZOrderStack;
