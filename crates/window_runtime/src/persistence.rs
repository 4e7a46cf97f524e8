//! Layout preference keys and typed load/save helpers over a [`PrefsStore`].

use std::collections::BTreeMap;

use platform_host::{load_pref_with, save_pref_with, PrefsStore};
use serde::{Deserialize, Serialize};

use crate::model::WindowGeometry;

pub const FINDER_STATE_KEY: &str = "finderState";
pub const OPEN_MODALS_KEY: &str = "openModals";
pub const MODAL_POSITIONS_KEY: &str = "modalPositions";
pub const LAST_ACTIVE_INSTANCES_KEY: &str = "lastActiveInstances";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Last location the file browser showed.
pub struct FinderState {
    pub repo: String,
    pub path: String,
}

/// Saved geometry per window id.
pub type ModalPositions = BTreeMap<String, WindowGeometry>;

pub fn load_finder_state(store: &dyn PrefsStore) -> Result<Option<FinderState>, String> {
    load_pref_with(store, FINDER_STATE_KEY)
}

pub fn save_finder_state(store: &dyn PrefsStore, state: &FinderState) -> Result<(), String> {
    save_pref_with(store, FINDER_STATE_KEY, state)
}

/// Loads the open persistent window ids; a missing key is an empty list.
pub fn load_open_modals(store: &dyn PrefsStore) -> Result<Vec<String>, String> {
    Ok(load_pref_with(store, OPEN_MODALS_KEY)?.unwrap_or_default())
}

pub fn save_open_modals(store: &dyn PrefsStore, ids: &[String]) -> Result<(), String> {
    save_pref_with(store, OPEN_MODALS_KEY, &ids)
}

pub fn load_modal_positions(store: &dyn PrefsStore) -> Result<ModalPositions, String> {
    Ok(load_pref_with(store, MODAL_POSITIONS_KEY)?.unwrap_or_default())
}

/// Read-modify-write of one window's entry in `modalPositions`.
///
/// An unreadable map is replaced rather than blocking the write.
pub fn save_modal_position(
    store: &dyn PrefsStore,
    window_id: &str,
    geometry: WindowGeometry,
) -> Result<(), String> {
    let mut positions = load_modal_positions(store).unwrap_or_default();
    positions.insert(window_id.to_string(), geometry);
    save_pref_with(store, MODAL_POSITIONS_KEY, &positions)
}

pub fn load_last_active_instances(
    store: &dyn PrefsStore,
) -> Result<BTreeMap<String, String>, String> {
    Ok(load_pref_with(store, LAST_ACTIVE_INSTANCES_KEY)?.unwrap_or_default())
}

pub fn save_last_active_instance(
    store: &dyn PrefsStore,
    kind: &str,
    instance_id: &str,
) -> Result<(), String> {
    let mut last_active = load_last_active_instances(store).unwrap_or_default();
    if last_active.get(kind).map(String::as_str) == Some(instance_id) {
        return Ok(());
    }
    last_active.insert(kind.to_string(), instance_id.to_string());
    save_pref_with(store, LAST_ACTIVE_INSTANCES_KEY, &last_active)
}

#[cfg(test)]
mod tests {
    use platform_host::MemoryPrefsStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn modal_positions_use_documented_layout() {
        let store = MemoryPrefsStore::default();
        save_modal_position(&store, "finder", WindowGeometry::new(10, 40, 300, 200))
            .expect("save position");

        let raw = store
            .load_pref(MODAL_POSITIONS_KEY)
            .expect("load raw")
            .expect("present");
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&raw).expect("json"),
            json!({"finder": {"left": 10, "top": 40, "width": 300, "height": 200, "position": "fixed"}})
        );
    }

    #[test]
    fn save_modal_position_merges_entries() {
        let store = MemoryPrefsStore::default();
        save_modal_position(&store, "a", WindowGeometry::new(1, 30, 300, 200)).expect("a");
        save_modal_position(&store, "b", WindowGeometry::new(2, 30, 300, 200)).expect("b");
        save_modal_position(&store, "a", WindowGeometry::new(3, 30, 300, 200)).expect("a again");

        let positions = load_modal_positions(&store).expect("load");
        assert_eq!(positions.len(), 2);
        assert_eq!(positions["a"].left, 3);
    }

    #[test]
    fn missing_keys_load_as_empty() {
        let store = MemoryPrefsStore::default();
        assert_eq!(load_open_modals(&store), Ok(Vec::new()));
        assert_eq!(load_finder_state(&store), Ok(None));
        assert!(load_last_active_instances(&store).expect("load").is_empty());
    }

    #[test]
    fn last_active_skips_redundant_writes() {
        let store = MemoryPrefsStore::default();
        save_last_active_instance(&store, "terminal", "terminal-1").expect("first");
        save_last_active_instance(&store, "terminal", "terminal-1").expect("same");
        save_last_active_instance(&store, "finder", "finder-1").expect("other kind");

        assert_eq!(store.write_count(), 2);
        assert_eq!(
            load_last_active_instances(&store).expect("load")["terminal"],
            "terminal-1"
        );
    }
}
