//! File browser instance. Only the current location is modelled; listings belong to the
//! visual layer.

use serde_json::Value;

use crate::{
    error::DesktopError,
    instances::{InstanceCore, WindowInstance},
    persistence::FinderState,
};

pub struct FinderInstance {
    core: InstanceCore,
    location: FinderState,
}

impl FinderInstance {
    /// Starts at `location`, normally the last saved `finderState`.
    pub fn new(core: InstanceCore, location: FinderState) -> Self {
        Self { core, location }
    }

    pub fn location(&self) -> &FinderState {
        &self.location
    }

    /// Moves to `repo`/`path`. Returns `false` when the location is unchanged.
    pub fn navigate(&mut self, repo: impl Into<String>, path: impl Into<String>) -> bool {
        let next = FinderState {
            repo: repo.into(),
            path: path.into(),
        };
        if next == self.location {
            return false;
        }
        self.location = next;
        self.core.state_changed();
        true
    }
}

impl WindowInstance for FinderInstance {
    fn core(&self) -> &InstanceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut InstanceCore {
        &mut self.core
    }

    fn serialize_state(&self) -> Value {
        serde_json::to_value(&self.location).unwrap_or(Value::Null)
    }

    fn restore_state(&mut self, state: &Value) -> Result<(), DesktopError> {
        if state.is_null() {
            return Ok(());
        }
        self.location = serde_json::from_value(state.clone()).map_err(|err| {
            DesktopError::InvalidSnapshot(format!("finder `{}`: {err}", self.core.id()))
        })?;
        Ok(())
    }
}
