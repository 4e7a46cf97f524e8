//! Runtime tunables with serde defaults and range normalization.

use leptos::logging;
use platform_host::{load_pref_with, PrefsStore};
use serde::{Deserialize, Serialize};

/// Preference key for an optional host-supplied config override.
pub const DESKTOP_CONFIG_KEY: &str = "desktopConfig";

const MIN_SAVE_DEBOUNCE_MS: u32 = 100;
const MAX_SAVE_DEBOUNCE_MS: u32 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Drag-to-snap proximity threshold: `clamp(viewport_width * fraction, min_px, max_px)`.
pub struct SnapThreshold {
    pub fraction: f64,
    pub min_px: f64,
    pub max_px: f64,
}

impl Default for SnapThreshold {
    fn default() -> Self {
        Self {
            fraction: 0.0035,
            min_px: 3.0,
            max_px: 14.0,
        }
    }
}

impl SnapThreshold {
    pub fn for_viewport_width(&self, width: i32) -> f64 {
        (f64::from(width) * self.fraction).clamp(self.min_px, self.max_px.max(self.min_px))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DesktopConfig {
    /// Height of the fixed menu bar; no window top may render above it.
    pub menu_bar_height: i32,
    /// Space reserved for the dock at the bottom of the viewport.
    pub dock_reserved_height: i32,
    pub min_window_width: i32,
    pub min_window_height: i32,
    pub z_index_base: u32,
    pub z_index_ceiling: u32,
    pub save_debounce_ms: u32,
    pub storage_budget_bytes: usize,
    pub snap: SnapThreshold,
    pub restore_on_boot: bool,
    pub max_restore_windows: usize,
    pub terminal_history_limit: usize,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            menu_bar_height: 24,
            dock_reserved_height: 72,
            min_window_width: 220,
            min_window_height: 140,
            z_index_base: 1_000,
            z_index_ceiling: 9_000,
            save_debounce_ms: 750,
            storage_budget_bytes: 5 * 1024 * 1024,
            snap: SnapThreshold::default(),
            restore_on_boot: true,
            max_restore_windows: 8,
            terminal_history_limit: 100,
        }
    }
}

impl DesktopConfig {
    /// Loads the stored override, falling back to defaults when absent or unreadable.
    pub fn load(store: &dyn PrefsStore) -> Self {
        match load_pref_with::<_, Self>(store, DESKTOP_CONFIG_KEY) {
            Ok(Some(config)) => config.normalized(),
            Ok(None) => Self::default(),
            Err(err) => {
                logging::warn!("desktop config load failed, using defaults: {err}");
                Self::default()
            }
        }
    }

    /// Clamps every field into its supported range.
    pub fn normalized(mut self) -> Self {
        self.save_debounce_ms = self
            .save_debounce_ms
            .clamp(MIN_SAVE_DEBOUNCE_MS, MAX_SAVE_DEBOUNCE_MS);
        self.menu_bar_height = self.menu_bar_height.max(0);
        self.dock_reserved_height = self.dock_reserved_height.max(0);
        self.min_window_width = self.min_window_width.max(1);
        self.min_window_height = self.min_window_height.max(1);
        self.z_index_ceiling = self.z_index_ceiling.max(self.z_index_base);
        self.terminal_history_limit = self.terminal_history_limit.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use platform_host::{MemoryPrefsStore, PrefsStore};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn snap_threshold_clamps_to_pixel_bounds() {
        let snap = SnapThreshold::default();
        assert_eq!(snap.for_viewport_width(800), 3.0);
        assert!((snap.for_viewport_width(2_000) - 7.0).abs() < 1e-9);
        assert_eq!(snap.for_viewport_width(10_000), 14.0);
    }

    #[test]
    fn normalized_clamps_debounce_window() {
        let fast = DesktopConfig {
            save_debounce_ms: 5,
            ..DesktopConfig::default()
        }
        .normalized();
        let slow = DesktopConfig {
            save_debounce_ms: 60_000,
            ..DesktopConfig::default()
        }
        .normalized();
        assert_eq!(fast.save_debounce_ms, 100);
        assert_eq!(slow.save_debounce_ms, 5_000);
    }

    #[test]
    fn load_merges_partial_override_with_defaults() {
        let store = MemoryPrefsStore::default();
        store
            .save_pref(DESKTOP_CONFIG_KEY, r#"{"menuBarHeight":30,"saveDebounceMs":20}"#)
            .expect("seed config");

        let config = DesktopConfig::load(&store);

        assert_eq!(config.menu_bar_height, 30);
        assert_eq!(config.save_debounce_ms, 100);
        assert_eq!(config.min_window_width, 220);
    }

    #[test]
    fn load_falls_back_on_malformed_override() {
        let store = MemoryPrefsStore::default();
        store
            .save_pref(DESKTOP_CONFIG_KEY, "not json")
            .expect("seed config");
        assert_eq!(DesktopConfig::load(&store), DesktopConfig::default());
    }
}
