use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::DesktopError,
    instances::{InstanceCore, WindowInstance},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextEditorState {
    pub file_name: Option<String>,
    pub content: String,
    /// Unsaved edits since the last open or save.
    pub dirty: bool,
}

pub struct TextEditorInstance {
    core: InstanceCore,
    state: TextEditorState,
}

impl TextEditorInstance {
    pub fn new(core: InstanceCore) -> Self {
        Self {
            core,
            state: TextEditorState::default(),
        }
    }

    pub fn state(&self) -> &TextEditorState {
        &self.state
    }

    /// Loads a document and retitles the instance after it.
    pub fn open_document(&mut self, file_name: impl Into<String>, content: impl Into<String>) {
        let file_name = file_name.into();
        self.state = TextEditorState {
            file_name: Some(file_name.clone()),
            content: content.into(),
            dirty: false,
        };
        self.core.set_title(file_name);
        self.core.state_changed();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        let content = content.into();
        if content == self.state.content {
            return;
        }
        self.state.content = content;
        self.state.dirty = true;
        self.core.state_changed();
    }

    pub fn mark_saved(&mut self) {
        if self.state.dirty {
            self.state.dirty = false;
            self.core.state_changed();
        }
    }
}

impl WindowInstance for TextEditorInstance {
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
            TextEditorState::default()
        } else {
            serde_json::from_value(state.clone()).map_err(|err| {
                DesktopError::InvalidSnapshot(format!("editor `{}`: {err}", self.core.id()))
            })?
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn edits_mark_dirty_until_saved() {
        let mut editor =
            TextEditorInstance::new(InstanceCore::new("text-editor-1", "text-editor", "Untitled 1"));
        editor.open_document("notes.md", "# Notes");
        assert_eq!(editor.core().title(), "notes.md");
        assert!(!editor.state().dirty);

        editor.set_content("# Notes\n- one");
        assert!(editor.state().dirty);
        editor.mark_saved();
        assert!(!editor.state().dirty);
    }
}
