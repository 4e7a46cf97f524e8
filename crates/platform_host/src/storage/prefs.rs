//! Key/value preference storage contracts and adapters.
//!
//! Values are raw JSON text stored per key, mirroring the browser `localStorage` model. The
//! trait is synchronous because every caller runs on the UI thread and the browser backend is
//! synchronous at the API boundary.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::Rc,
};

use serde::{de::DeserializeOwned, Serialize};

/// Host service for preference values (JSON stored as text per key).
pub trait PrefsStore {
    /// Loads a raw JSON string for a preference key.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store is unavailable or the read fails.
    fn load_pref(&self, key: &str) -> Result<Option<String>, String>;

    /// Saves a raw JSON string for a preference key.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store rejects the write.
    fn save_pref(&self, key: &str, raw_json: &str) -> Result<(), String>;

    /// Deletes a preference key.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store rejects the delete.
    fn delete_pref(&self, key: &str) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op preference store for unsupported targets and baseline tests.
pub struct NoopPrefsStore;

impl PrefsStore for NoopPrefsStore {
    fn load_pref(&self, _key: &str) -> Result<Option<String>, String> {
        Ok(None)
    }

    fn save_pref(&self, _key: &str, _raw_json: &str) -> Result<(), String> {
        Ok(())
    }

    fn delete_pref(&self, _key: &str) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory preference store keyed by string.
///
/// Clones share the same backing map, so a test can keep one handle while the runtime owns
/// another.
pub struct MemoryPrefsStore {
    inner: Rc<RefCell<BTreeMap<String, String>>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryPrefsStore {
    /// Number of successful `save_pref` calls since creation.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Returns `true` when `key` currently holds a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.borrow().contains_key(key)
    }

    /// Removes every stored key. The write counter is left untouched.
    pub fn clear(&self) {
        self.inner.borrow_mut().clear();
    }

    /// Returns all stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().keys().cloned().collect()
    }
}

impl PrefsStore for MemoryPrefsStore {
    fn load_pref(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.inner.borrow().get(key).cloned())
    }

    fn save_pref(&self, key: &str, raw_json: &str) -> Result<(), String> {
        self.inner
            .borrow_mut()
            .insert(key.to_string(), raw_json.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn delete_pref(&self, key: &str) -> Result<(), String> {
        self.inner.borrow_mut().remove(key);
        Ok(())
    }
}

/// Loads and deserializes a typed preference value through a [`PrefsStore`] implementation.
///
/// # Errors
///
/// Returns an error when the store or JSON deserialization fails.
pub fn load_pref_with<S: PrefsStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> Result<Option<T>, String> {
    let Some(raw) = store.load_pref(key)? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
    Ok(Some(value))
}

/// Serializes and saves a typed preference value through a [`PrefsStore`] implementation.
///
/// # Errors
///
/// Returns an error when serialization or store save fails.
pub fn save_pref_with<S: PrefsStore + ?Sized, T: Serialize>(
    store: &S,
    key: &str,
    value: &T,
) -> Result<(), String> {
    let raw = serde_json::to_string(value).map_err(|e| e.to_string())?;
    store.save_pref(key, &raw)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct FinderPrefs {
        repo: String,
        path: String,
    }

    #[test]
    fn memory_prefs_store_round_trip_and_delete() {
        let store = MemoryPrefsStore::default();
        let store_obj: &dyn PrefsStore = &store;

        store_obj.save_pref("pref.key", "{\"k\":1}").expect("save");
        assert_eq!(
            store_obj.load_pref("pref.key").expect("load"),
            Some("{\"k\":1}".to_string())
        );
        store_obj.delete_pref("pref.key").expect("delete");
        assert_eq!(store_obj.load_pref("pref.key").expect("load"), None);
    }

    #[test]
    fn memory_prefs_store_clones_share_state_and_count_writes() {
        let store = MemoryPrefsStore::default();
        let handle = store.clone();

        store.save_pref("a", "1").expect("save a");
        store.save_pref("b", "2").expect("save b");
        assert_eq!(handle.write_count(), 2);
        assert_eq!(handle.keys(), vec!["a".to_string(), "b".to_string()]);

        handle.clear();
        assert!(!store.contains_key("a"));
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn typed_pref_helpers_round_trip() {
        let store = MemoryPrefsStore::default();
        save_pref_with(
            &store,
            "finderState",
            &FinderPrefs {
                repo: "notes".to_string(),
                path: "/drafts".to_string(),
            },
        )
        .expect("save typed pref");

        let loaded: Option<FinderPrefs> =
            load_pref_with(&store, "finderState").expect("load typed pref");
        assert_eq!(
            loaded,
            Some(FinderPrefs {
                repo: "notes".to_string(),
                path: "/drafts".to_string(),
            })
        );
    }

    #[test]
    fn typed_load_reports_malformed_json() {
        let store = MemoryPrefsStore::default();
        store.save_pref("finderState", "{not json").expect("save raw");
        let err = load_pref_with::<_, FinderPrefs>(&store, "finderState")
            .expect_err("malformed json should fail");
        assert!(!err.is_empty());
    }

    #[test]
    fn noop_prefs_store_is_empty_and_successful() {
        let store = NoopPrefsStore;
        let store_obj: &dyn PrefsStore = &store;
        assert_eq!(store_obj.load_pref("k").expect("load"), None);
        store_obj.save_pref("k", "{}").expect("save");
        store_obj.delete_pref("k").expect("delete");
    }
}
