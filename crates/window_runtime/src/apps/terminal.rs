//! Terminal session instance: command history and working directory.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::DesktopError,
    instances::{InstanceCore, WindowInstance},
};

const DEFAULT_CWD: &str = "~";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TerminalState {
    pub cwd: String,
    /// Oldest first.
    pub history: Vec<String>,
}

impl Default for TerminalState {
    fn default() -> Self {
        Self {
            cwd: DEFAULT_CWD.to_string(),
            history: Vec::new(),
        }
    }
}

pub struct TerminalInstance {
    core: InstanceCore,
    state: TerminalState,
    history_limit: usize,
}

impl TerminalInstance {
    pub fn new(core: InstanceCore, history_limit: usize) -> Self {
        Self {
            core,
            state: TerminalState::default(),
            history_limit: history_limit.max(1),
        }
    }

    pub fn history(&self) -> &[String] {
        &self.state.history
    }

    pub fn cwd(&self) -> &str {
        &self.state.cwd
    }

    /// Appends a submitted command line; blank lines are ignored.
    pub fn record_command(&mut self, command: &str) {
        let command = command.trim();
        if command.is_empty() {
            return;
        }
        self.state.history.push(command.to_string());
        self.trim_history();
        self.core.state_changed();
    }

    pub fn set_cwd(&mut self, cwd: impl Into<String>) {
        let cwd = cwd.into();
        if cwd != self.state.cwd {
            self.state.cwd = cwd;
            self.core.state_changed();
        }
    }

    pub fn clear_history(&mut self) {
        if !self.state.history.is_empty() {
            self.state.history.clear();
            self.core.state_changed();
        }
    }

    fn trim_history(&mut self) {
        let overflow = self.state.history.len().saturating_sub(self.history_limit);
        self.state.history.drain(..overflow);
    }
}

impl WindowInstance for TerminalInstance {
    fn core(&self) -> &InstanceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut InstanceCore {
        &mut self.core
    }

    fn serialize_state(&self) -> Value {
        serde_json::to_value(&self.state).unwrap_or(Value::Null)
    }

    fn restore_state(&mut self, state: &Value) -> Result<(), DesktopError> {
        self.state = if state.is_null() {
            TerminalState::default()
        } else {
            serde_json::from_value(state.clone()).map_err(|err| {
                DesktopError::InvalidSnapshot(format!("terminal `{}`: {err}", self.core.id()))
            })?
        };
        self.trim_history();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn terminal(limit: usize) -> TerminalInstance {
        TerminalInstance::new(InstanceCore::new("terminal-1", "terminal", "Terminal 1"), limit)
    }

    #[test]
    fn history_is_capped_oldest_first() {
        let mut term = terminal(2);
        for command in ["ls", "  ", "pwd", "whoami"] {
            term.record_command(command);
        }
        assert_eq!(term.history(), ["pwd", "whoami"]);
    }

    #[test]
    fn state_round_trips_through_record() {
        let mut term = terminal(10);
        term.record_command("cd projects");
        term.set_cwd("~/projects");

        let record = term.serialize();
        let mut restored = terminal(10);
        restored.deserialize(&record).expect("restore");

        assert_eq!(restored.history(), ["cd projects"]);
        assert_eq!(restored.cwd(), "~/projects");
        assert_eq!(record.state, json!({"cwd": "~/projects", "history": ["cd projects"]}));
    }

    #[test]
    fn malformed_state_is_rejected() {
        let mut term = terminal(10);
        assert!(term.restore_state(&json!({"history": "ls"})).is_err());
        assert!(term.restore_state(&Value::Null).is_ok());
        assert_eq!(term.cwd(), "~");
    }
}
