//! Multi-instance window contents and their manager wiring.

pub mod finder;
pub mod terminal;
pub mod text_editor;

pub use finder::FinderInstance;
pub use terminal::{TerminalInstance, TerminalState};
pub use text_editor::{TextEditorInstance, TextEditorState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Static description of one instance kind.
pub struct InstanceKindDescriptor {
    /// Instance `type` used in session snapshots.
    pub kind: &'static str,
    /// Registered window whose content region hosts the instances.
    pub window_id: &'static str,
    /// Prefix for generated titles, e.g. `Terminal 2`.
    pub title_prefix: &'static str,
    /// `0` means unlimited.
    pub max_instances: usize,
}

pub const TERMINAL_KIND: &str = "terminal";
pub const TEXT_EDITOR_KIND: &str = "text-editor";
pub const FINDER_KIND: &str = "finder";

const INSTANCE_KINDS: [InstanceKindDescriptor; 3] = [
    InstanceKindDescriptor {
        kind: TERMINAL_KIND,
        window_id: "terminal",
        title_prefix: "Terminal",
        max_instances: 8,
    },
    InstanceKindDescriptor {
        kind: TEXT_EDITOR_KIND,
        window_id: "text-editor",
        title_prefix: "Untitled",
        max_instances: 0,
    },
    InstanceKindDescriptor {
        kind: FINDER_KIND,
        window_id: "finder",
        title_prefix: "Finder",
        max_instances: 4,
    },
];

pub fn instance_kinds() -> &'static [InstanceKindDescriptor] {
    &INSTANCE_KINDS
}

pub fn instance_kind(kind: &str) -> Option<&'static InstanceKindDescriptor> {
    INSTANCE_KINDS.iter().find(|descriptor| descriptor.kind == kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_kinds_are_unique() {
        for (index, descriptor) in instance_kinds().iter().enumerate() {
            assert!(
                instance_kinds()[index + 1..]
                    .iter()
                    .all(|other| other.kind != descriptor.kind),
                "duplicate kind {}",
                descriptor.kind
            );
        }
        assert!(instance_kind("terminal").is_some());
        assert!(instance_kind("paint").is_none());
    }
}
