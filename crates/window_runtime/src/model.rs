//! Window, geometry, and pointer value types shared across the runtime.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_WINDOW_WIDTH: i32 = 420;
pub const DEFAULT_WINDOW_HEIGHT: i32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
/// Lifetime class of a registered window.
pub enum WindowCategory {
    /// Reopened on boot when it was open at teardown.
    #[default]
    Persistent,
    /// Never recorded in the open-window list (dialogs, alerts).
    Transient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PositionMode {
    #[default]
    Fixed,
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    #[serde(rename = "position", default)]
    pub position_mode: PositionMode,
}

impl WindowGeometry {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
            position_mode: PositionMode::Fixed,
        }
    }

    pub fn right(self) -> i32 {
        self.left + self.width
    }

    pub fn bottom(self) -> i32 {
        self.top + self.height
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            ..self
        }
    }
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self::new(48, 48, DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Declared configuration for one window id, created at registration time.
pub struct WindowConfig {
    pub id: String,
    #[serde(default)]
    pub category: WindowCategory,
    #[serde(default)]
    pub icon: String,
    /// Translation key prefix for labels and about text.
    #[serde(default)]
    pub descriptive_key: String,
    #[serde(default)]
    pub default_geometry: Option<WindowGeometry>,
    #[serde(default = "default_resizable")]
    pub resizable: bool,
    #[serde(default)]
    pub metadata: Value,
}

fn default_resizable() -> bool {
    true
}

impl WindowConfig {
    pub fn new(id: impl Into<String>, category: WindowCategory) -> Self {
        Self {
            id: id.into(),
            category,
            icon: String::new(),
            descriptive_key: String::new(),
            default_geometry: None,
            resizable: true,
            metadata: Value::Null,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_descriptive_key(mut self, key: impl Into<String>) -> Self {
        self.descriptive_key = key.into();
        self
    }

    pub fn with_geometry(mut self, geometry: WindowGeometry) -> Self {
        self.default_geometry = Some(geometry);
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_persistent(&self) -> bool {
        self.category == WindowCategory::Persistent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

impl PointerPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeEdge {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl ResizeEdge {
    pub fn moves_left_edge(self) -> bool {
        matches!(self, Self::West | Self::NorthWest | Self::SouthWest)
    }

    pub fn moves_top_edge(self) -> bool {
        matches!(self, Self::North | Self::NorthEast | Self::NorthWest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Stable display state of a window, derived from its runtime flags.
pub enum WindowState {
    Closed,
    Open,
    Minimized,
    Maximized,
    Snapped(SnapSide),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Snap placement plus the geometry to return to on unsnap.
pub struct SnapState {
    pub side: SnapSide,
    pub prior: WindowGeometry,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
/// Runtime flags for one window.
///
/// `maximized` and `snapped` are never both set; the dialog controller clears one before it
/// sets the other.
pub struct WindowRuntimeState {
    pub visible: bool,
    pub minimized: bool,
    pub maximized: Option<WindowGeometry>,
    pub snapped: Option<SnapState>,
}

impl WindowRuntimeState {
    pub fn state(&self) -> WindowState {
        if !self.visible {
            WindowState::Closed
        } else if self.minimized {
            WindowState::Minimized
        } else if self.maximized.is_some() {
            WindowState::Maximized
        } else if let Some(snap) = self.snapped {
            WindowState::Snapped(snap.side)
        } else {
            WindowState::Open
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn geometry_serializes_with_position_mode_key() {
        let geometry = WindowGeometry::new(10, 40, 300, 200);
        assert_eq!(
            serde_json::to_value(geometry).expect("serialize"),
            json!({"left": 10, "top": 40, "width": 300, "height": 200, "position": "fixed"})
        );
    }

    #[test]
    fn window_config_defaults_fill_missing_manifest_fields() {
        let config: WindowConfig =
            serde_json::from_value(json!({"id": "about"})).expect("deserialize");
        assert_eq!(config.category, WindowCategory::Persistent);
        assert!(config.resizable);
        assert_eq!(config.default_geometry, None);
    }

    #[test]
    fn runtime_state_precedence_is_closed_then_minimized_then_layout() {
        let prior = WindowGeometry::default();
        let mut state = WindowRuntimeState::default();
        assert_eq!(state.state(), WindowState::Closed);

        state.visible = true;
        state.snapped = Some(SnapState {
            side: SnapSide::Right,
            prior,
        });
        assert_eq!(state.state(), WindowState::Snapped(SnapSide::Right));

        state.minimized = true;
        assert_eq!(state.state(), WindowState::Minimized);
    }
}
