//! Error taxonomy for window runtime operations.
//!
//! These errors never cross the public [`crate::DesktopRuntime`] surface: the façade logs them
//! and returns a `bool`/`Option` instead.

use thiserror::Error;

use crate::model::WindowState;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DesktopError {
    /// A window id was registered twice; the first registration wins.
    #[error("window `{0}` is already registered")]
    RegistrationConflict(String),
    /// The operation targeted a window id the registry does not know.
    #[error("unknown window id `{0}`")]
    UnknownWindowId(String),
    /// The window is registered but its visual surface is not mounted.
    #[error("window `{0}` has no mounted surface")]
    MissingSurface(String),
    /// The requested transition is not valid from the current state.
    #[error("window `{window_id}` cannot {operation} while {state:?}")]
    InvalidTransition {
        window_id: String,
        operation: &'static str,
        state: WindowState,
    },
    /// The serialized session would exceed the storage budget.
    #[error("session snapshot of ~{estimated} bytes exceeds the {budget} byte budget")]
    StorageQuotaExceeded { estimated: usize, budget: usize },
    /// A persisted or imported session has a different schema version.
    #[error("session version {found} does not match expected version {expected}")]
    VersionMismatch { found: u64, expected: u32 },
    /// A persisted or imported session is structurally invalid.
    #[error("invalid session snapshot: {0}")]
    InvalidSnapshot(String),
    /// An instance id was not found in its manager.
    #[error("unknown {kind} instance `{instance_id}`")]
    UnknownInstance { kind: String, instance_id: String },
    /// The instance manager is at its configured capacity.
    #[error("{kind} manager is at capacity ({max} instances)")]
    InstanceCapacity { kind: String, max: usize },
    /// A lifecycle or change listener returned an error.
    #[error("listener for {event} failed: {message}")]
    ListenerFailed { event: String, message: String },
    /// The key/value store rejected a read or write.
    #[error("storage error: {0}")]
    Storage(String),
}
