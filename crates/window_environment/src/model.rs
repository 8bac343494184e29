use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Local-storage key of the persisted desktop snapshot.
pub const SNAPSHOT_KEY: &str = "webtop.windows.v1";
/// Local-storage key of the persisted [`EnvironmentConfig`].
pub const CONFIG_KEY: &str = "webtop.config.v1";
/// Local-storage key of the signed-in [`SessionInfo`].
pub const SESSION_KEY: &str = "webtop.session.v1";
/// Type name of the base window type, always registered.
pub const BASE_WINDOW_TYPE: &str = "window";
pub const DEFAULT_WINDOW_WIDTH: i32 = 600;
pub const DEFAULT_WINDOW_HEIGHT: i32 = 400;
pub const DEFAULT_Z_INDEX_BASE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(String);

impl WindowId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// DOM id of the element hosting this window's content.
    pub fn content_dom_id(&self) -> String {
        format!("{}-content", self.0)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WindowId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl WindowRect {
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    pub fn right(self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(self) -> i32 {
        self.y + self.h
    }
}

/// Size of the desktop area windows must stay inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.max(0),
            height: height.max(0),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1024, 730)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

impl PointerPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Resize grip on a window. Corners move both axes, edges move one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeHandle {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
    North,
    South,
    East,
    West,
}

impl ResizeHandle {
    pub const CORNERS: [Self; 4] = [
        Self::NorthWest,
        Self::NorthEast,
        Self::SouthWest,
        Self::SouthEast,
    ];

    pub const ALL: [Self; 8] = [
        Self::NorthWest,
        Self::NorthEast,
        Self::SouthWest,
        Self::SouthEast,
        Self::North,
        Self::South,
        Self::East,
        Self::West,
    ];

    /// Short compass name, used for CSS classes.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NorthWest => "nw",
            Self::NorthEast => "ne",
            Self::SouthWest => "sw",
            Self::SouthEast => "se",
            Self::North => "n",
            Self::South => "s",
            Self::East => "e",
            Self::West => "w",
        }
    }

    /// Horizontal and vertical direction of the grip, each in `{-1, 0, 1}`.
    pub fn direction(self) -> (i32, i32) {
        match self {
            Self::NorthWest => (-1, -1),
            Self::NorthEast => (1, -1),
            Self::SouthWest => (-1, 1),
            Self::SouthEast => (1, 1),
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
        }
    }
}

/// Names of the events a window emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowEventKind {
    Close,
    Focus,
    DragStart,
    Drag,
    DragEnd,
    Minimize,
    Resize,
    Popup,
    ExportIconConfig,
    ChangeTaskbarTitle,
}

impl WindowEventKind {
    pub const ALL: [Self; 10] = [
        Self::Close,
        Self::Focus,
        Self::DragStart,
        Self::Drag,
        Self::DragEnd,
        Self::Minimize,
        Self::Resize,
        Self::Popup,
        Self::ExportIconConfig,
        Self::ChangeTaskbarTitle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::Focus => "focus",
            Self::DragStart => "dragStart",
            Self::Drag => "drag",
            Self::DragEnd => "dragEnd",
            Self::Minimize => "minimize",
            Self::Resize => "resize",
            Self::Popup => "popup",
            Self::ExportIconConfig => "exportIconConfig",
            Self::ChangeTaskbarTitle => "changeTaskbarTitle",
        }
    }
}

impl fmt::Display for WindowEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative subscription: when `event` fires, call the environment handler named `handler`.
///
/// Only the names are persisted; behavior is re-attached from the handler registry on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBinding {
    pub event: WindowEventKind,
    pub handler: String,
}

impl EventBinding {
    pub fn new(event: WindowEventKind, handler: impl Into<String>) -> Self {
        Self {
            event,
            handler: handler.into(),
        }
    }
}

/// Creation parameters for a window. Absent fields are back-filled from the window type's
/// registered defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowConfig {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub title: Option<String>,
    pub icon: Option<String>,
    pub content: Option<String>,
    pub styles: Option<BTreeMap<String, String>>,
    pub events: Option<Vec<EventBinding>>,
    pub saved_state: Option<Value>,
}

impl WindowConfig {
    pub fn sized(width: i32, height: i32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Fills every absent field from `defaults`; fields already present win.
    pub fn backfill(self, defaults: &WindowConfig) -> WindowConfig {
        WindowConfig {
            width: self.width.or(defaults.width),
            height: self.height.or(defaults.height),
            x: self.x.or(defaults.x),
            y: self.y.or(defaults.y),
            title: self.title.or_else(|| defaults.title.clone()),
            icon: self.icon.or_else(|| defaults.icon.clone()),
            content: self.content.or_else(|| defaults.content.clone()),
            styles: self.styles.or_else(|| defaults.styles.clone()),
            events: self.events.or_else(|| defaults.events.clone()),
            saved_state: self.saved_state.or_else(|| defaults.saved_state.clone()),
        }
    }
}

/// Request from a window to open another window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupRequest {
    pub class_name: String,
    pub config: WindowConfig,
}

/// Desktop icon entry; activating it opens a window of `class_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesktopIcon {
    pub id: String,
    pub label: String,
    pub icon: Option<String>,
    pub class_name: String,
    pub config: WindowConfig,
    /// Document loaded into the window after it opens.
    pub remote_url: Option<String>,
}

/// Taskbar entry for a live window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskbarPin {
    pub window_id: WindowId,
    pub title: String,
    pub icon: Option<String>,
}

/// Serializable snapshot of one window, as stored in the persisted blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowState {
    pub id: WindowId,
    pub width: i32,
    pub height: i32,
    pub x: i32,
    pub y: i32,
    pub z_index: u32,
    pub is_minimized: bool,
    pub icon: Option<String>,
    pub title: String,
    pub content: String,
    pub styles: BTreeMap<String, String>,
    pub events: Vec<EventBinding>,
    pub class_name: String,
    #[serde(default)]
    pub saved_state: Value,
}

impl WindowState {
    /// Creation config that rebuilds this window (everything but id, type, and minimized flag).
    pub fn to_config(&self) -> WindowConfig {
        WindowConfig {
            width: Some(self.width),
            height: Some(self.height),
            x: Some(self.x),
            y: Some(self.y),
            title: Some(self.title.clone()),
            icon: self.icon.clone(),
            content: Some(self.content.clone()),
            styles: Some(self.styles.clone()),
            events: Some(self.events.clone()),
            saved_state: Some(self.saved_state.clone()),
        }
    }
}

/// The persisted desktop: windows ordered back-to-front.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub windows: Vec<WindowState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionInfo {
    pub username: String,
    pub theme: String,
}

impl Default for SessionInfo {
    fn default() -> Self {
        Self {
            username: "guest".to_string(),
            theme: "classic".to_string(),
        }
    }
}

/// Tunables for an [`crate::Environment`], persisted under [`CONFIG_KEY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// z-index of the back-most window; window `k` from the back gets `base + k`.
    pub z_index_base: u32,
    pub snapshot_key: String,
    /// Minimum spacing between snapshot writes while a drag or resize is in progress.
    pub persist_interval_ms: u64,
    pub restore_on_boot: bool,
    /// Offset between successive default window placements.
    pub cascade_step: i32,
    pub default_width: i32,
    pub default_height: i32,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            z_index_base: DEFAULT_Z_INDEX_BASE,
            snapshot_key: SNAPSHOT_KEY.to_string(),
            persist_interval_ms: 250,
            restore_on_boot: true,
            cascade_step: 24,
            default_width: DEFAULT_WINDOW_WIDTH,
            default_height: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

/// Style keys applied to every window before its own overrides.
pub fn default_window_styles() -> BTreeMap<String, String> {
    [
        ("background", "#ece9d8"),
        ("border", "1px solid #0a246a"),
        ("color", "#000000"),
        ("font-family", "Tahoma, sans-serif"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn backfill_keeps_present_fields_and_fills_absent_ones() {
        let defaults = WindowConfig {
            title: Some("Default".to_string()),
            icon: Some("app".to_string()),
            ..WindowConfig::sized(300, 200)
        };
        let config = WindowConfig::sized(640, 0).with_title("Mine");

        let filled = config.backfill(&defaults);

        assert_eq!(filled.width, Some(640));
        assert_eq!(filled.height, Some(0));
        assert_eq!(filled.title.as_deref(), Some("Mine"));
        assert_eq!(filled.icon.as_deref(), Some("app"));
        assert_eq!(filled.x, None);
    }

    #[test]
    fn window_state_uses_the_snapshot_field_names() {
        let state = WindowState {
            id: WindowId::new("window-1"),
            width: 600,
            height: 400,
            x: 10,
            y: 20,
            z_index: 100,
            is_minimized: true,
            icon: None,
            title: "Notes".to_string(),
            content: "<p>hi</p>".to_string(),
            styles: BTreeMap::new(),
            events: vec![EventBinding::new(WindowEventKind::DragEnd, "log")],
            class_name: "window".to_string(),
            saved_state: Value::Null,
        };

        let value = serde_json::to_value(&state).expect("serialize");

        assert_eq!(value["zIndex"], json!(100));
        assert_eq!(value["isMinimized"], json!(true));
        assert_eq!(value["className"], json!("window"));
        assert_eq!(value["events"][0]["event"], json!("dragEnd"));
    }

    #[test]
    fn config_deserializes_with_missing_fields() {
        let config: EnvironmentConfig =
            serde_json::from_str(r#"{"z_index_base": 5}"#).expect("partial config");
        assert_eq!(config.z_index_base, 5);
        assert_eq!(config.snapshot_key, SNAPSHOT_KEY);
    }

    #[test]
    fn resize_handle_corners_move_both_axes() {
        for handle in ResizeHandle::CORNERS {
            let (dx, dy) = handle.direction();
            assert_ne!(dx, 0);
            assert_ne!(dy, 0);
        }
    }

    #[test]
    fn event_kind_names_match_serde_names() {
        for kind in WindowEventKind::ALL {
            let encoded = serde_json::to_value(kind).expect("serialize kind");
            assert_eq!(encoded, json!(kind.as_str()));
        }
    }
}
